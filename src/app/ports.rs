//! Port traits: the hexagonal boundary between the fan-control core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ surface / supervisor / cycle (domain)
//! ```
//!
//! Every driver the node talks to (PWM, BLE stack, Wi-Fi, DHT22, OLED,
//! HTTP) implements one of these traits.  ESP-IDF adapters live in
//! [`crate::adapters`] behind `cfg(target_os = "espidf")`; the in-memory
//! simulation adapters next to them implement the same traits for host
//! runs and tests.

use crate::error::{ActuatorError, DisplayError, LinkFault, SensorFault, UplinkError};

use super::events::AttributeId;
use super::telemetry::DisplayFrame;

// ───────────────────────────────────────────────────────────────
// PWM port (domain → fan)
// ───────────────────────────────────────────────────────────────

/// The fan's PWM output channel.  Only [`ActuatorState`] holds one.
///
/// [`ActuatorState`]: crate::control::ActuatorState
pub trait PwmPort {
    /// Drive `duty` (already within `[0, MAX_DUTY]`).
    fn set_duty(&mut self, duty: u32) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Attribute server port (domain ↔ BLE GATT stack)
// ───────────────────────────────────────────────────────────────

/// The GATT server role as the control surface sees it.
///
/// The stack owns attribute storage and the subscriber sets; the domain
/// only sets values, asks for notifications and re-arms advertising.
pub trait AttributeServer {
    /// Replace the stored value of `id`.
    fn set_value(&mut self, id: AttributeId, value: &[u8]);

    /// Current stored value of `id`, as a client read would see it.
    fn value(&self, id: AttributeId) -> heapless::Vec<u8, 32>;

    /// Push the stored value of `id` to every subscribed client.
    /// Returns the number of clients notified.
    fn notify(&mut self, id: AttributeId) -> usize;

    /// Start (or restart) connectable advertising.
    fn start_advertising(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Link port (domain ↔ Wi-Fi station)
// ───────────────────────────────────────────────────────────────

/// Station-mode network link.
pub trait LinkPort {
    /// Run one connect sequence (associate + wait for an address).
    fn connect(&mut self) -> Result<(), LinkFault>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Environment sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature / humidity sensor.  One call is one bus transaction.
pub trait EnvironmentSensor {
    /// Returns `(temperature °C, relative humidity %)`.
    fn read(&mut self) -> Result<(f32, f32), SensorFault>;
}

// ───────────────────────────────────────────────────────────────
// Display port (domain → OLED)
// ───────────────────────────────────────────────────────────────

pub trait DisplayPort {
    /// Clear and redraw the whole screen with `frame`.
    fn render(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry uplink port (domain → HTTP)
// ───────────────────────────────────────────────────────────────

/// Best-effort HTTP POST of form-encoded readings.
pub trait TelemetryPostPort {
    /// POST `body` to `url`; returns the HTTP status on 2xx.
    fn post(&mut self, url: &str, body: &str) -> Result<u16, UplinkError>;
}
