//! One-shot hardware peripheral initialization and the raw pin helpers the
//! drivers share.
//!
//! Configures the battery ADC channel, GPIO directions, wake sources and
//! the two LEDC timers (servo and speaker) using raw ESP-IDF sys calls.
//! Called once from `main()` before the tick starts.  Host builds get
//! no-op stand-ins with the same signatures.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    WakeConfigFailed(i32),
    TimerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::WakeConfigFailed(rc) => write!(f, "wake source config failed (rc={})", rc),
            Self::TimerFailed(rc) => write!(f, "tick timer start failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("adc"),
            HwInitError::GpioConfigFailed(_) => Self::Init("gpio"),
            HwInitError::LedcInitFailed(_) => Self::Init("ledc"),
            HwInitError::WakeConfigFailed(_) => Self::Init("wake sources"),
            HwInitError::TimerFailed(_) => Self::Init("tick timer"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 {
        Ok(())
    } else {
        Err(err(ret))
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick starts; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
        init_wake_sources()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot, battery) ────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: ADC1_HANDLE is written once by `init_adc()` before the tick
/// that reads it is started.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    check(
        unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) },
        HwInitError::AdcInitFailed,
    )?;

    // 0 dB attenuation: full scale is the ~1.1 V internal reference the
    // divider is sized for.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_0,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    check(
        unsafe { adc_oneshot_config_channel(adc1_handle(), pins::BATTERY_ADC_CHANNEL, &chan_cfg) },
        HwInitError::AdcInitFailed,
    )?;

    info!("hw_init: ADC1 configured (CH{}=battery)", pins::BATTERY_ADC_CHANNEL);
    Ok(())
}

/// One battery conversion, scaled to 10 bits.  0 on a failed read.
#[cfg(target_os = "espidf")]
pub fn battery_adc_read() -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; the tick is the only reader.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), pins::BATTERY_ADC_CHANNEL, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    (raw.max(0) as u16) >> 2
}

#[cfg(not(target_os = "espidf"))]
pub fn battery_adc_read() -> u16 {
    0
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mut buttons = 0u64;
    for &pin in &pins::BUTTON_GPIOS {
        buttons |= 1u64 << pin;
    }
    let btn_cfg = gpio_config_t {
        pin_bit_mask: buttons,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&btn_cfg) }, HwInitError::GpioConfigFailed)?;

    let sensor_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::MOVEMENT_SENSOR_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&sensor_cfg) }, HwInitError::GpioConfigFailed)?;

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let mut outputs = 1u64 << pins::SERVO_POWER_GPIO
        | 1u64 << pins::MOVEMENT_SENSOR_POWER_GPIO
        | 1u64 << pins::RTC_CE_GPIO
        | 1u64 << pins::RTC_CLK_GPIO
        | 1u64 << pins::RTC_IO_GPIO;
    for &pin in pins::SEGMENT_GPIOS.iter().chain(pins::DIGIT_GPIOS.iter()) {
        outputs |= 1u64 << pin;
    }
    let cfg = gpio_config_t {
        pin_bit_mask: outputs,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;

    // Everything unpowered, display blank (cathodes high).
    unsafe {
        gpio_set_level(pins::SERVO_POWER_GPIO, 0);
        gpio_set_level(pins::MOVEMENT_SENSOR_POWER_GPIO, 0);
        gpio_set_level(pins::RTC_CE_GPIO, 0);
        for &pin in &pins::DIGIT_GPIOS {
            gpio_set_level(pin, 1);
        }
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host stand-in: inputs read high (buttons released, pull-ups).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output during init.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// Switch a bidirectional pin (the RTC data line) between output and input.
#[cfg(target_os = "espidf")]
pub fn gpio_set_output(pin: i32, output: bool) {
    let mode = if output {
        gpio_mode_t_GPIO_MODE_OUTPUT
    } else {
        gpio_mode_t_GPIO_MODE_INPUT
    };
    // SAFETY: direction change on an already-configured pin.
    unsafe {
        gpio_set_direction(pin, mode);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_output(_pin: i32, _output: bool) {}

/// Busy-wait for bit-banged protocols.
#[cfg(target_os = "espidf")]
pub fn delay_us(us: u32) {
    // SAFETY: ROM routine, no shared state.
    unsafe { esp_rom_delay_us(us) }
}

#[cfg(not(target_os = "espidf"))]
pub fn delay_us(_us: u32) {}

// ── LEDC PWM (servo and speaker) ─────────────────────────────

#[cfg(target_os = "espidf")]
const LEDC_CH_SERVO: u32 = 0;
#[cfg(target_os = "espidf")]
const LEDC_CH_SPEAKER: u32 = 1;

#[cfg(target_os = "espidf")]
const LEDC_TIMER_SERVO: u32 = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const LEDC_TIMER_SPEAKER: u32 = ledc_timer_t_LEDC_TIMER_1;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // SAFETY: Called from single main-task context via init_peripherals().
    let servo_timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: LEDC_TIMER_SERVO,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&servo_timer) }, HwInitError::LedcInitFailed)?;

    let speaker_timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: LEDC_TIMER_SPEAKER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::SPEAKER_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&speaker_timer) }, HwInitError::LedcInitFailed)?;

    check(
        unsafe {
            ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel: LEDC_CH_SERVO,
                timer_sel: LEDC_TIMER_SERVO,
                gpio_num: pins::SERVO_PWM_GPIO,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            })
        },
        HwInitError::LedcInitFailed,
    )?;

    check(
        unsafe {
            ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel: LEDC_CH_SPEAKER,
                timer_sel: LEDC_TIMER_SPEAKER,
                gpio_num: pins::SPEAKER_GPIO,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            })
        },
        HwInitError::LedcInitFailed,
    )?;

    info!("hw_init: LEDC configured (servo=CH0, speaker=CH1)");
    Ok(())
}

#[cfg(target_os = "espidf")]
fn ledc_set(channel: u32, duty: u32) {
    // SAFETY: channel configured in init_ledc(); duty writes are
    // idempotent register updates.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

/// Servo signal duty in LEDC counts (14-bit at 50 Hz); 0 = no pulse.
#[cfg(target_os = "espidf")]
pub fn servo_set_duty(duty: u32) {
    ledc_set(LEDC_CH_SERVO, duty);
}

#[cfg(not(target_os = "espidf"))]
pub fn servo_set_duty(_duty: u32) {}

/// Square wave at `frequency_hz` on the speaker.
#[cfg(target_os = "espidf")]
pub fn speaker_tone(frequency_hz: u32) {
    // SAFETY: timer configured in init_ledc().
    unsafe {
        ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_TIMER_SPEAKER, frequency_hz);
    }
    ledc_set(LEDC_CH_SPEAKER, 128);
}

#[cfg(not(target_os = "espidf"))]
pub fn speaker_tone(_frequency_hz: u32) {}

#[cfg(target_os = "espidf")]
pub fn speaker_silence() {
    ledc_set(LEDC_CH_SPEAKER, 0);
}

#[cfg(not(target_os = "espidf"))]
pub fn speaker_silence() {}

// ── Sleep and wake ────────────────────────────────────────────

/// Buttons (active low) wake the chip from light sleep.
#[cfg(target_os = "espidf")]
unsafe fn init_wake_sources() -> Result<(), HwInitError> {
    for &pin in &pins::BUTTON_GPIOS {
        check(
            unsafe { gpio_wakeup_enable(pin, gpio_int_type_t_GPIO_INTR_LOW_LEVEL) },
            HwInitError::WakeConfigFailed,
        )?;
    }
    check(unsafe { esp_sleep_enable_gpio_wakeup() }, HwInitError::WakeConfigFailed)?;
    info!("hw_init: button wake enabled");
    Ok(())
}

/// Re-assert the button pull-ups, which light sleep may drop.
#[cfg(target_os = "espidf")]
pub fn enable_button_pullups() {
    for &pin in &pins::BUTTON_GPIOS {
        // SAFETY: pull mode change on a configured input.
        unsafe {
            gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
            gpio_sleep_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn enable_button_pullups() {}

/// Light sleep until a button goes low or `timeout_us` passes.
#[cfg(target_os = "espidf")]
pub fn light_sleep(timeout_us: u64) {
    // SAFETY: wake sources were configured by init_wake_sources().
    unsafe {
        esp_sleep_enable_timer_wakeup(timeout_us);
        esp_light_sleep_start();
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn light_sleep(_timeout_us: u64) {}
