//! Speed ↔ PWM duty conversion.
//!
//! The fan's speed scale is linear in duty: `MAX_DUTY` (all bits set at
//! the configured LEDC resolution) drives the fan at `max_speed`.  Both
//! directions clamp, then round half up using integer arithmetic so the
//! result is identical on the host and on the Xtensa core.

use crate::config::NodeConfig;

/// Pure speed/duty conversion for one PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycleMapper {
    max_speed: u32,
    max_duty: u32,
}

impl DutyCycleMapper {
    /// `resolution_bits` is clamped to `1..=16`, `max_speed` to at least 1.
    pub fn new(max_speed: u32, resolution_bits: u8) -> Self {
        let bits = resolution_bits.clamp(1, 16);
        Self {
            max_speed: max_speed.max(1),
            max_duty: (1u32 << bits) - 1,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(config.max_speed_rpm, config.pwm_resolution_bits)
    }

    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    pub fn max_duty(&self) -> u32 {
        self.max_duty
    }

    /// Clamp a client-supplied speed into `[0, max_speed]`.
    pub fn clamp_speed(&self, speed: i64) -> u32 {
        speed.clamp(0, i64::from(self.max_speed)) as u32
    }

    /// `round(speed * MAX_DUTY / MAX_SPEED)` after clamping.
    pub fn speed_to_duty(&self, speed: i64) -> u32 {
        let speed = u64::from(self.clamp_speed(speed));
        scale(speed, u64::from(self.max_duty), u64::from(self.max_speed))
    }

    /// `round(duty * MAX_SPEED / MAX_DUTY)` after clamping.
    pub fn duty_to_speed(&self, duty: u32) -> u32 {
        let duty = u64::from(duty.min(self.max_duty));
        scale(duty, u64::from(self.max_speed), u64::from(self.max_duty))
    }

    /// Speed covered by one duty step, rounded up.  Any speed survives a
    /// trip through the duty domain within this bound.
    pub fn speed_step(&self) -> u32 {
        self.max_speed.div_ceil(self.max_duty)
    }
}

/// `round(value * num / den)`, half up.  Inputs are bounded by `u32`, so
/// the product cannot overflow `u64`.
fn scale(value: u64, num: u64, den: u64) -> u32 {
    ((value * num + den / 2) / den) as u32
}
