//! Authoritative fan actuator state.
//!
//! The wireless event thread writes through [`ActuatorState::set_speed`];
//! the main cycle reads [`ActuatorState::current_speed`] for the display.
//! Writes are serialised by the mutex around the PWM port.  The committed
//! `(speed, duty)` pair is packed into one `AtomicU64` so readers never
//! block and never observe a speed from one write with the duty of another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::PwmPort;
use crate::error::ActuatorError;

use super::duty::DutyCycleMapper;

/// Consistent view of the committed actuator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorSnapshot {
    pub speed: u32,
    pub duty: u32,
}

impl ActuatorSnapshot {
    fn pack(self) -> u64 {
        (u64::from(self.speed) << 32) | u64::from(self.duty)
    }

    fn unpack(word: u64) -> Self {
        Self {
            speed: (word >> 32) as u32,
            duty: word as u32,
        }
    }
}

/// Single owner of the fan PWM output.
pub struct ActuatorState<P: PwmPort> {
    mapper: DutyCycleMapper,
    output: Mutex<P>,
    committed: AtomicU64,
}

impl<P: PwmPort> ActuatorState<P> {
    /// Drive `initial_duty` and record the matching speed.
    ///
    /// If the peripheral rejects the boot duty the state still starts at
    /// that duty; the next successful write corrects the hardware.
    pub fn new(mut output: P, mapper: DutyCycleMapper, initial_duty: u32) -> Self {
        let duty = initial_duty.min(mapper.max_duty());
        if let Err(e) = output.set_duty(duty) {
            warn!("actuator: initial duty {} not applied: {}", duty, e);
        }
        let speed = mapper.duty_to_speed(duty);
        info!("actuator: boot duty={} speed={}", duty, speed);
        Self {
            mapper,
            output: Mutex::new(output),
            committed: AtomicU64::new(ActuatorSnapshot { speed, duty }.pack()),
        }
    }

    /// Clamp `requested`, drive the matching duty and commit.
    ///
    /// Returns the committed (clamped) speed.  On a peripheral error
    /// nothing is committed.
    pub fn set_speed(&self, requested: i64) -> Result<u32, ActuatorError> {
        let speed = self.mapper.clamp_speed(requested);
        let duty = self.mapper.speed_to_duty(i64::from(speed));

        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output.set_duty(duty)?;
        // Publish under the lock so commit order matches write order.
        self.committed
            .store(ActuatorSnapshot { speed, duty }.pack(), Ordering::Release);
        drop(output);

        if i64::from(speed) != requested {
            info!("actuator: speed {} clamped to {}", requested, speed);
        }
        Ok(speed)
    }

    pub fn snapshot(&self) -> ActuatorSnapshot {
        ActuatorSnapshot::unpack(self.committed.load(Ordering::Acquire))
    }

    pub fn current_speed(&self) -> u32 {
        self.snapshot().speed
    }

    pub fn current_duty(&self) -> u32 {
        self.snapshot().duty
    }

    /// Run `f` against the PWM port under the write lock.
    pub fn with_output<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        let output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        f(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPwm {
        writes: Vec<u32>,
        fail: bool,
    }

    impl PwmPort for RecordingPwm {
        fn set_duty(&mut self, duty: u32) -> Result<(), ActuatorError> {
            if self.fail {
                return Err(ActuatorError::PwmWriteFailed);
            }
            self.writes.push(duty);
            Ok(())
        }
    }

    fn actuator() -> ActuatorState<RecordingPwm> {
        ActuatorState::new(RecordingPwm::default(), DutyCycleMapper::new(1500, 8), 100)
    }

    #[test]
    fn boot_commits_initial_duty() {
        let a = actuator();
        assert_eq!(a.current_duty(), 100);
        assert_eq!(a.current_speed(), 588);
        a.with_output(|pwm| assert_eq!(pwm.writes, vec![100]));
    }

    #[test]
    fn set_speed_drives_duty_and_keeps_requested_speed() {
        let a = actuator();
        assert_eq!(a.set_speed(750), Ok(750));
        assert_eq!(a.snapshot(), ActuatorSnapshot { speed: 750, duty: 128 });
        a.with_output(|pwm| assert_eq!(pwm.writes.last(), Some(&128)));
    }

    #[test]
    fn set_speed_clamps() {
        let a = actuator();
        assert_eq!(a.set_speed(-5), Ok(0));
        assert_eq!(a.current_duty(), 0);
        assert_eq!(a.set_speed(2_000_000), Ok(1500));
        assert_eq!(a.current_duty(), 255);
    }

    #[test]
    fn failed_write_commits_nothing() {
        let a = actuator();
        a.set_speed(300).unwrap();
        {
            let mut pwm = a.output.lock().unwrap();
            pwm.fail = true;
        }
        assert_eq!(a.set_speed(1200), Err(ActuatorError::PwmWriteFailed));
        assert_eq!(a.current_speed(), 300);
        assert_eq!(a.current_duty(), 51);
    }

    #[test]
    fn oversize_initial_duty_is_clamped() {
        let a = ActuatorState::new(RecordingPwm::default(), DutyCycleMapper::new(1500, 8), 999);
        assert_eq!(a.current_duty(), 255);
        assert_eq!(a.current_speed(), 1500);
    }

    #[test]
    fn pack_roundtrip_keeps_both_halves() {
        let s = ActuatorSnapshot { speed: u32::MAX, duty: 7 };
        assert_eq!(ActuatorSnapshot::unpack(s.pack()), s);
    }
}
