//! One-shot fan PWM peripheral initialization.
//!
//! Configures the LEDC timer and channel driving the fan using raw
//! ESP-IDF sys calls.  Called once from `main()` before the actuator is
//! built.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors from LEDC setup and duty writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
    DutyWriteFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcTimerFailed(rc)   => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
            Self::DutyWriteFailed(rc)   => write!(f, "LEDC duty write failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── LEDC PWM ─────────────────────────────────────────────────

/// LEDC channel driving the fan.
pub const LEDC_CH_FAN: u32 = pins::FAN_LEDC_CHANNEL;

/// Configure LEDC timer 0 at `freq_hz` / `resolution_bits` and bind the
/// fan channel to [`pins::FAN_PWM_GPIO`] with duty 0.
#[cfg(target_os = "espidf")]
pub fn init_fan_pwm(freq_hz: u32, resolution_bits: u8) -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        // ledc_timer_bit_t values equal the bit count.
        duty_resolution: u32::from(resolution_bits.clamp(1, 16)),
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: Called once from main() before any duty write; single-threaded.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    let channel = ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_FAN,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::FAN_PWM_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    // SAFETY: as above.
    let ret = unsafe { ledc_channel_config(&channel) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcChannelFailed(ret)); }

    info!(
        "hw_init: LEDC fan CH{} on GPIO{} ({} Hz, {}-bit)",
        LEDC_CH_FAN, pins::FAN_PWM_GPIO, freq_hz, resolution_bits
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_fan_pwm(freq_hz: u32, resolution_bits: u8) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): LEDC fan {} Hz / {}-bit skipped", freq_hz, resolution_bits);
    Ok(())
}

/// Write and latch a duty value on `channel`.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), HwInitError> {
    // SAFETY: LEDC channel was configured in init_fan_pwm(); callers
    // serialise writes (ActuatorState holds its output lock).
    unsafe {
        let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        if ret != ESP_OK as i32 { return Err(HwInitError::DutyWriteFailed(ret)); }
        let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
        if ret != ESP_OK as i32 { return Err(HwInitError::DutyWriteFailed(ret)); }
    }
    Ok(())
}
