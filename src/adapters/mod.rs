//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                         | Connects to            |
//! |------------|------------------------------------|------------------------|
//! | `hardware` | RtcPort, DisplayPort, MelodyPort,  | DS1302, display, LEDC, |
//! |            | MechanismPort, ButtonPort, ...     | GPIO, tick state       |
//! | `log_sink` | EventSink                          | Serial log output      |
//! | `nvs`      | SettingsStore                      | NVS / in-memory store  |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
