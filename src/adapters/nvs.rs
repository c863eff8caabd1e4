//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SettingsStore`] for the feeder.  Each schedule slot lives
//! under its own key (`slot0`..`slot9`) and the calibration under `cal`,
//! all postcard-encoded in the `feeder` namespace, so a menu edit rewrites
//! a single small blob.
//!
//! - Missing keys read as the factory value for that key.
//! - Values are clamped on decode.
//! - ESP-IDF NVS commits are atomic per `nvs_commit()`.

use log::{info, warn};

use crate::app::ports::{SettingsStore, StorageError};
use crate::settings::{self, ScheduleSlot, Settings, SLOT_COUNT};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "feeder";
const SLOT_KEYS: [&str; SLOT_COUNT] = [
    "slot0", "slot1", "slot2", "slot3", "slot4", "slot5", "slot6", "slot7", "slot8", "slot9",
];
const CALIBRATION_KEY: &str = "cal";

/// Largest blob this adapter reads back.
const MAX_BLOB_SIZE: usize = 8;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    // ── Raw blob access ───────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let store = self.store.borrow();
        let data = store.get(key).ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.borrow_mut().insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    /// Overwrite a raw blob, bypassing encoding (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn put_raw(&mut self, key: &str, data: &[u8]) {
        self.store.borrow_mut().insert(key.to_owned(), data.to_vec());
    }

    /// NUL-terminated copy of a short key or namespace.
    #[cfg(target_os = "espidf")]
    fn c_key(key: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = key.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_key(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key = Self::c_key(key);
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size = buf.len();
            let ret = unsafe { nvs_get_blob(handle, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(size),
            // A fresh partition has no namespace yet.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::Corrupted),
            Err(_) => Err(StorageError::IoError),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = Self::c_key(key);
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe { nvs_set_blob(handle, key.as_ptr().cast(), data.as_ptr().cast(), data.len()) };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(StorageError::Full),
            Err(e) => {
                warn!("NvsAdapter: NVS write error {}", e);
                Err(StorageError::IoError)
            }
        }
    }

    // ── Typed records ─────────────────────────────────────────

    /// Read one slot.  `Ok(None)` when the key is absent.
    fn load_slot(&self, index: usize) -> Result<Option<ScheduleSlot>, StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.read_blob(SLOT_KEYS[index], &mut buf) {
            Ok(len) => ScheduleSlot::decode(&buf[..len])
                .map(Some)
                .map_err(|_| StorageError::Corrupted),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn load_calibration(&self) -> Result<Option<u16>, StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.read_blob(CALIBRATION_KEY, &mut buf) {
            Ok(len) => settings::decode_calibration(&buf[..len])
                .map(Some)
                .map_err(|_| StorageError::Corrupted),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// An adapter that skips flash initialisation.  On the device every
/// access then fails, so settings come from the factory image.
impl Default for NvsAdapter {
    fn default() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }
}

impl SettingsStore for NvsAdapter {
    fn load(&self) -> Result<Settings, StorageError> {
        let mut out = Settings::default();
        let mut stored = 0;

        for index in 0..SLOT_COUNT {
            match self.load_slot(index) {
                Ok(Some(slot)) => {
                    out.slots[index] = slot;
                    stored += 1;
                }
                Ok(None) => {}
                Err(StorageError::Corrupted) => {
                    warn!("NvsAdapter: {} corrupted, using factory value", SLOT_KEYS[index]);
                }
                Err(e) => return Err(e),
            }
        }

        match self.load_calibration() {
            Ok(Some(value)) => out.calibration = value,
            Ok(None) => {}
            Err(StorageError::Corrupted) => {
                warn!("NvsAdapter: {} corrupted, using factory value", CALIBRATION_KEY);
            }
            Err(e) => return Err(e),
        }

        info!("NvsAdapter: loaded {} stored slots, calibration {}", stored, out.calibration);
        Ok(out.sanitized())
    }

    fn save_slot(&mut self, index: usize, slot: &ScheduleSlot) -> Result<(), StorageError> {
        let key = SLOT_KEYS.get(index).ok_or(StorageError::BadIndex)?;
        let bytes = slot.clamped().encode().map_err(|_| StorageError::Corrupted)?;
        self.write_blob(key, &bytes)?;
        info!("NvsAdapter: {} saved", key);
        Ok(())
    }

    fn save_calibration(&mut self, value: u16) -> Result<(), StorageError> {
        let bytes = settings::encode_calibration(settings::clamp_calibration(value))
            .map_err(|_| StorageError::Corrupted)?;
        self.write_blob(CALIBRATION_KEY, &bytes)?;
        info!("NvsAdapter: calibration {} saved", value);
        Ok(())
    }
}
