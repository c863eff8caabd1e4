//! PetFeeder firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LogEventSink        NvsAdapter       │
//! │  (RTC, display, speaker,  (EventSink)         (SettingsStore)  │
//! │   mechanism, buttons)                                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FeederService (wake cycle)                  │    │
//! │  │  power modes · schedule · dispense · menu              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  2.5 ms tick (esp_timer): display · servo · buttons · ADC      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use petfeeder::adapters::hardware::HardwareAdapter;
use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::nvs::NvsAdapter;
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::drivers::{hw_init, hw_timer};
use petfeeder::error::Error;
use petfeeder::tick::SHARED;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PetFeeder v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = FeederConfig::default();
    config.validate()?;

    // ── 2. Peripherals and the tick ───────────────────────────
    hw_init::init_peripherals().map_err(Error::from)?;
    hw_timer::start_tick(config.tick_period_us).map_err(Error::from)?;

    // ── 3. Adapters ───────────────────────────────────────────
    let mut store = match NvsAdapter::new() {
        Ok(nvs) => nvs,
        Err(e) => {
            // Settings fall back to the factory image and edits stay in RAM.
            warn!("{}; running without persistence", Error::from(e));
            NvsAdapter::default()
        }
    };
    let mut hw = HardwareAdapter::new(&SHARED, &config);
    let mut sink = LogEventSink::new();

    // ── 4. Service ────────────────────────────────────────────
    let mut service = FeederService::new(config);
    service.boot(&mut hw, &store, &mut sink);
    info!("System ready. Entering wake loop.");

    loop {
        service.run_once(&mut hw, &mut store, &mut sink);
    }
}
