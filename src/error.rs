//! Unified error types for the PetFeeder firmware.
//!
//! The feeder has very few fallible paths: a jammed mechanism is recovered
//! in place and never surfaces as an error, and a hung loop is handled by
//! the hardware watchdog.  What remains is persistence and bring-up.
//! All variants are `Copy` so they can be logged and passed around freely.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Non-volatile storage could not be read or written.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// A persisted or supplied value is outside its declared range.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
