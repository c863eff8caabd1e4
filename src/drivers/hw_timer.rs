//! The periodic hardware tick.
//!
//! One esp_timer fires every `tick_period_us` and runs
//! [`TickMultiplexer::on_tick`] against the real pins, then wakes the main
//! task if it is parked in [`wait_for_tick`].  On simulation targets a
//! background thread stands in for the timer.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR); the
//! multiplexer is owned by that callback alone.

use crate::app::ports::Direction;
use crate::drivers::{hw_init, seven_segment, servo};
use crate::pins;
use crate::tick::{TickIo, TickMultiplexer, SHARED};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Pin-level tick I/O ────────────────────────────────────────

/// [`TickIo`] on the board's pins.
pub struct PinTickIo;

impl TickIo for PinTickIo {
    fn drive_digit(&mut self, digit: usize, segments: u8) {
        seven_segment::drive_digit(digit, segments);
    }

    fn blank_display(&mut self) {
        seven_segment::blank_digits();
    }

    fn drive_servo(&mut self, output: Option<Direction>) {
        servo::drive(output);
    }

    fn sample_buttons(&mut self) -> [bool; 3] {
        // Active low.
        pins::BUTTON_GPIOS.map(|pin| !hw_init::gpio_read(pin))
    }

    fn sample_sensor(&mut self) -> bool {
        hw_init::gpio_read(pins::MOVEMENT_SENSOR_GPIO)
    }

    fn adc_cycle(&mut self) -> u16 {
        hw_init::battery_adc_read()
    }
}

type Ticker = TickMultiplexer<'static, PinTickIo>;

// ── ESP-IDF timer ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static TICK_PERIOD_US: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static MAIN_TASK: core::sync::atomic::AtomicPtr<core::ffi::c_void> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

/// SAFETY: TICK_TIMER is written once in `start_tick()` from the main task
/// before any other function here reads it.
#[cfg(target_os = "espidf")]
unsafe fn tick_timer() -> esp_timer_handle_t {
    unsafe { TICK_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked Ticker from start_tick(); this callback
    // is its only user.
    let ticker = unsafe { &mut *arg.cast::<Ticker>() };
    ticker.on_tick();

    let task = MAIN_TASK.load(core::sync::atomic::Ordering::Acquire);
    if !task.is_null() {
        // SAFETY: the main task never exits.
        unsafe {
            xTaskGenericNotify(task.cast(), 0, 1, eNotifyAction_eSetBits, core::ptr::null_mut());
        }
    }
}

/// Start the tick.  Must be called from the task that will later call
/// [`wait_for_tick`].
#[cfg(target_os = "espidf")]
pub fn start_tick(period_us: u32) -> Result<(), hw_init::HwInitError> {
    let ticker: &'static mut Ticker = Box::leak(Box::new(TickMultiplexer::new(&SHARED, PinTickIo)));

    // SAFETY: TICK_TIMER is written here once at boot from the main task
    // before the timer can fire.
    unsafe {
        MAIN_TASK.store(xTaskGetCurrentTaskHandle().cast(), core::sync::atomic::Ordering::Release);
        TICK_PERIOD_US.store(period_us, core::sync::atomic::Ordering::Relaxed);

        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::from_mut(ticker).cast(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"tick".as_ptr(),
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            return Err(hw_init::HwInitError::TimerFailed(ret));
        }
        let ret = esp_timer_start_periodic(tick_timer(), u64::from(period_us));
        if ret != ESP_OK {
            return Err(hw_init::HwInitError::TimerFailed(ret));
        }
    }
    info!("hw_timer: tick started ({} us)", period_us);
    Ok(())
}

/// Park the calling task until the next tick (or one RTOS tick at most).
#[cfg(target_os = "espidf")]
pub fn wait_for_tick() {
    // SAFETY: plain FreeRTOS notification wait on the current task.
    unsafe {
        ulTaskGenericNotifyTake(0, 1, 1);
    }
}

/// Stop the tick for a deep idle.
#[cfg(target_os = "espidf")]
pub fn pause_tick() {
    // SAFETY: tick_timer() contract; a null handle means never started.
    unsafe {
        let timer = tick_timer();
        if !timer.is_null() {
            esp_timer_stop(timer);
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn resume_tick() {
    // SAFETY: tick_timer() contract.  Restarting a running timer fails
    // harmlessly with ESP_ERR_INVALID_STATE.
    unsafe {
        let timer = tick_timer();
        if !timer.is_null() {
            esp_timer_start_periodic(timer, u64::from(TICK_PERIOD_US.load(core::sync::atomic::Ordering::Relaxed)));
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_RUNNING: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn start_tick(period_us: u32) -> Result<(), hw_init::HwInitError> {
    use core::sync::atomic::Ordering;

    SIM_RUNNING.store(true, Ordering::Release);
    let mut ticker: Ticker = TickMultiplexer::new(&SHARED, PinTickIo);
    std::thread::Builder::new()
        .name("tick".into())
        .spawn(move || loop {
            if SIM_RUNNING.load(Ordering::Acquire) {
                ticker.on_tick();
            }
            std::thread::sleep(std::time::Duration::from_micros(u64::from(period_us)));
        })
        .map_err(|_| hw_init::HwInitError::TimerFailed(-1))?;
    log::info!("hw_timer(sim): tick thread started ({} us)", period_us);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn wait_for_tick() {
    std::thread::yield_now();
}

#[cfg(not(target_os = "espidf"))]
pub fn pause_tick() {
    SIM_RUNNING.store(false, core::sync::atomic::Ordering::Release);
}

#[cfg(not(target_os = "espidf"))]
pub fn resume_tick() {
    SIM_RUNNING.store(true, core::sync::atomic::Ordering::Release);
}
