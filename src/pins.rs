//! GPIO / peripheral pin assignments for the ESPFAN board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Fan (4-pin PC fan, PWM on the blue wire)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the fan's control input.
pub const FAN_PWM_GPIO: i32 = 32;
/// LEDC channel reserved for the fan.
pub const FAN_LEDC_CHANNEL: u32 = 0;
/// LEDC base frequency for the fan (25 kHz, Intel 4-pin fan convention, inaudible).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;

// ---------------------------------------------------------------------------
// DHT22 / AM2302 temperature + humidity sensor (single-wire, open drain)
// ---------------------------------------------------------------------------

pub const DHT_DATA_GPIO: i32 = 23;

// ---------------------------------------------------------------------------
// I²C bus: SSD1306 128x64 OLED
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// 7-bit I²C address of the OLED controller.
pub const OLED_I2C_ADDR: u8 = 0x3C;
pub const I2C_BAUD_HZ: u32 = 400_000;
