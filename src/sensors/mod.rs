//! Sensor subsystem: the [`SensorSampler`] turning one environment
//! sensor transaction into a [`TelemetryReading`].
//!
//! A failed or NaN read produces an invalid reading with no values; the
//! previous good value is never carried forward.  A flaky sensor must not
//! stop the main cycle, so sampling never fails.

use log::{info, warn};

use crate::app::ports::EnvironmentSensor;
use crate::app::telemetry::TelemetryReading;
use crate::error::SensorFault;

pub struct SensorSampler<S: EnvironmentSensor> {
    sensor: S,
    consecutive_faults: u32,
}

impl<S: EnvironmentSensor> SensorSampler<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            consecutive_faults: 0,
        }
    }

    /// Run one transaction and classify it.
    pub fn sample(&mut self) -> TelemetryReading {
        let result = self.sensor.read().and_then(|(t, h)| {
            if t.is_nan() || h.is_nan() {
                Err(SensorFault::NotANumber)
            } else {
                Ok((t, h))
            }
        });

        match result {
            Ok((t, h)) => {
                if self.consecutive_faults > 0 {
                    info!("sensor: recovered after {} failed read(s)", self.consecutive_faults);
                }
                self.consecutive_faults = 0;
                TelemetryReading::ok(t, h)
            }
            Err(fault) => {
                self.consecutive_faults = self.consecutive_faults.saturating_add(1);
                warn!("sensor: {} ({} in a row)", fault, self.consecutive_faults);
                TelemetryReading::fault(fault)
            }
        }
    }

    /// Failed reads since the last good one.
    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
