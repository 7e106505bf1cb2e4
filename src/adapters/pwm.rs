//! Fan PWM adapter.
//!
//! Implements [`PwmPort`] for the LEDC channel wired to the fan.
//!
//! - **`target_os = "espidf"`**: [`LedcFan`] writes the LEDC duty register.
//! - **all other targets**: [`SimPwm`] records every duty it is given.

use crate::app::ports::PwmPort;
use crate::error::ActuatorError;

// ───────────────────────────────────────────────────────────────
// LEDC fan output
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct LedcFan {
    channel: u32,
}

#[cfg(target_os = "espidf")]
impl LedcFan {
    /// Configure the LEDC timer/channel and take the fan output.
    pub fn new(freq_hz: u32, resolution_bits: u8) -> Result<Self, crate::drivers::hw_init::HwInitError> {
        crate::drivers::hw_init::init_fan_pwm(freq_hz, resolution_bits)?;
        Ok(Self { channel: crate::drivers::hw_init::LEDC_CH_FAN })
    }
}

#[cfg(target_os = "espidf")]
impl PwmPort for LedcFan {
    fn set_duty(&mut self, duty: u32) -> Result<(), ActuatorError> {
        crate::drivers::hw_init::ledc_set(self.channel, duty).map_err(|e| {
            log::warn!("PWM: {}", e);
            ActuatorError::PwmWriteFailed
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation output
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimPwmState {
    writes: Vec<u32>,
    fail: bool,
}

/// Recording PWM output.  Clones share the same record.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct SimPwm {
    state: Arc<Mutex<SimPwmState>>,
}

#[cfg(not(target_os = "espidf"))]
impl SimPwm {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimPwmState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every duty successfully written, oldest first.
    pub fn writes(&self) -> Vec<u32> {
        self.lock().writes.clone()
    }

    pub fn last_duty(&self) -> Option<u32> {
        self.lock().writes.last().copied()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.lock().fail = fail;
    }
}

#[cfg(not(target_os = "espidf"))]
impl PwmPort for SimPwm {
    fn set_duty(&mut self, duty: u32) -> Result<(), ActuatorError> {
        let mut s = self.lock();
        if s.fail {
            return Err(ActuatorError::PwmWriteFailed);
        }
        s.writes.push(duty);
        log::debug!("PWM(sim): duty={}", duty);
        Ok(())
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn clones_share_record() {
        let pwm = SimPwm::new();
        let mut out = pwm.clone();
        out.set_duty(42).unwrap();
        assert_eq!(pwm.writes(), vec![42]);
    }

    #[test]
    fn failing_output_records_nothing() {
        let pwm = SimPwm::new();
        pwm.set_failing(true);
        let mut out = pwm.clone();
        assert_eq!(out.set_duty(1), Err(ActuatorError::PwmWriteFailed));
        assert_eq!(pwm.last_duty(), None);
    }
}
