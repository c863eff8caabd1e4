//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main task stops feeding it, which is the only
//! recovery for a mechanism that never frees itself.  Every wait loop in
//! the firmware feeds it through [`KeepAlive`].  The chip sleeps with the
//! task parked, so the timeout must exceed the wake period.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::KeepAlive;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms, no-op", timeout_ms);
            Self { feeds: 0 }
        }
    }

    /// Feeds since construction (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

impl KeepAlive for Watchdog {
    fn feed(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.feeds = self.feeds.wrapping_add(1);
        }
    }
}
