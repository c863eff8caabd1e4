//! GPIO / peripheral pin assignments for the PetFeeder main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-ups, wake sources)
// ---------------------------------------------------------------------------

pub const BUTTON_MINUS_GPIO: i32 = 4;
pub const BUTTON_PLUS_GPIO: i32 = 5;
pub const BUTTON_ENTER_GPIO: i32 = 6;

/// All three buttons, in MINUS / PLUS / ENTER order.
pub const BUTTON_GPIOS: [i32; 3] = [BUTTON_MINUS_GPIO, BUTTON_PLUS_GPIO, BUTTON_ENTER_GPIO];

// ---------------------------------------------------------------------------
// Seven-segment display (common cathode, 3 digits)
// ---------------------------------------------------------------------------

/// Segment anodes A..G.
pub const SEGMENT_GPIOS: [i32; 7] = [7, 15, 16, 17, 18, 8, 3];
/// Digit cathodes, leftmost first.  LOW = digit lit.
pub const DIGIT_GPIOS: [i32; 3] = [9, 10, 11];

// ---------------------------------------------------------------------------
// Dispense mechanism (continuous-rotation servo + slotted-disc sensor)
// ---------------------------------------------------------------------------

/// LEDC PWM output to the servo signal line.
pub const SERVO_PWM_GPIO: i32 = 12;
/// Digital output: HIGH = servo supply on.
pub const SERVO_POWER_GPIO: i32 = 13;
/// Digital input: movement sensor output, HIGH = slot in view.
pub const MOVEMENT_SENSOR_GPIO: i32 = 14;
/// Digital output: HIGH = movement sensor supply on.
pub const MOVEMENT_SENSOR_POWER_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// LEDC square-wave output to the piezo speaker.
pub const SPEAKER_GPIO: i32 = 38;

// ---------------------------------------------------------------------------
// DS1302 real-time clock (3-wire)
// ---------------------------------------------------------------------------

pub const RTC_CE_GPIO: i32 = 39;
pub const RTC_CLK_GPIO: i32 = 40;
pub const RTC_IO_GPIO: i32 = 41;

// ---------------------------------------------------------------------------
// Battery sense (ADC1)
// ---------------------------------------------------------------------------

/// Battery through a 10k/68k divider.  ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const BATTERY_ADC_GPIO: i32 = 1;
pub const BATTERY_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits) for the servo.  14 bits at 50 Hz gives
/// ~1.2 µs steps, fine enough for pulse widths.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// Initial speaker frequency; retuned per note.
pub const SPEAKER_PWM_FREQ_HZ: u32 = 440;
