//! DHT22 / AM2302 temperature + humidity adapter.
//!
//! Implements [`EnvironmentSensor`].  One `read()` is one single-wire
//! transaction; the sensor needs ~2 s between reads, which the main
//! cycle period already guarantees.
//!
//! - **`target_os = "espidf"`**: `dht_sensor::dht22` on an open-drain GPIO.
//! - **all other targets**: [`SimDht`] with scripted readings.

use crate::app::ports::EnvironmentSensor;
use crate::error::SensorFault;

// ───────────────────────────────────────────────────────────────
// DHT22 on GPIO
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, PinDriver, Pull},
};

#[cfg(target_os = "espidf")]
pub struct Dht22Sensor {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
}

#[cfg(target_os = "espidf")]
impl Dht22Sensor {
    pub fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;
        log::info!("DHT22: data line on GPIO{}", crate::pins::DHT_DATA_GPIO);
        Ok(Self { pin, delay: Ets })
    }
}

#[cfg(target_os = "espidf")]
impl EnvironmentSensor for Dht22Sensor {
    fn read(&mut self) -> Result<(f32, f32), SensorFault> {
        if self.pin.set_high().is_err() {
            return Err(SensorFault::Transaction);
        }
        match dht_sensor::dht22::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(reading) => Ok((reading.temperature, reading.relative_humidity)),
            Err(dht_sensor::DhtError::ChecksumMismatch) => Err(SensorFault::Checksum),
            Err(dht_sensor::DhtError::Timeout) => Err(SensorFault::Timeout),
            Err(e) => {
                log::debug!("DHT22: {:?}", e);
                Err(SensorFault::Transaction)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation sensor
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

/// Returns queued results first, then the steady reading.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone)]
pub struct SimDht {
    steady: Result<(f32, f32), SensorFault>,
    queued: VecDeque<Result<(f32, f32), SensorFault>>,
    reads: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimDht {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            steady: Ok((temperature_c, humidity_pct)),
            queued: VecDeque::new(),
            reads: 0,
        }
    }

    /// A sensor that never answers.
    pub fn disconnected() -> Self {
        Self {
            steady: Err(SensorFault::Timeout),
            queued: VecDeque::new(),
            reads: 0,
        }
    }

    /// Queue one result for an upcoming read.
    pub fn push(&mut self, result: Result<(f32, f32), SensorFault>) {
        self.queued.push_back(result);
    }

    pub fn set_steady(&mut self, result: Result<(f32, f32), SensorFault>) {
        self.steady = result;
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

#[cfg(not(target_os = "espidf"))]
impl EnvironmentSensor for SimDht {
    fn read(&mut self) -> Result<(f32, f32), SensorFault> {
        self.reads += 1;
        self.queued.pop_front().unwrap_or(self.steady)
    }
}
