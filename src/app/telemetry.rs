//! Telemetry values and the text renderings the node publishes.
//!
//! Every outward representation of a reading lives here: the GATT
//! telemetry attribute text, the OLED frame, and the uplink form body.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::error::SensorFault;

use super::events::MAX_PAYLOAD;

/// Placeholder shown on the telemetry attribute until the first good reading.
pub const TELEMETRY_PLACEHOLDER: &str = "Temperature";

/// Display line shown when the sensor transaction fails.
pub const SENSOR_FAILED_TEXT: &str = "Failed to read from DHT sensor!";

// ───────────────────────────────────────────────────────────────
// TelemetryReading
// ───────────────────────────────────────────────────────────────

/// Result of one sensor transaction.
///
/// An invalid reading never carries values: consumers must not substitute
/// zero for a failed read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReading {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub valid: bool,
    pub fault: Option<SensorFault>,
}

impl TelemetryReading {
    pub fn ok(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c: Some(temperature_c),
            humidity_pct: Some(humidity_pct),
            valid: true,
            fault: None,
        }
    }

    pub fn fault(fault: SensorFault) -> Self {
        Self {
            temperature_c: None,
            humidity_pct: None,
            valid: false,
            fault: Some(fault),
        }
    }

    /// `(temperature, humidity)` when valid.
    pub fn values(&self) -> Option<(f32, f32)> {
        match (self.valid, self.temperature_c, self.humidity_pct) {
            (true, Some(t), Some(h)) => Some((t, h)),
            _ => None,
        }
    }
}

/// GATT telemetry attribute text, one decimal: `"22.5 °C"`.
///
/// `None` when the text would not fit the attribute; a cut-off number
/// must never be published.
pub fn telemetry_text(temperature_c: f32) -> Option<String<MAX_PAYLOAD>> {
    let mut s = String::new();
    write!(s, "{:.1} °C", temperature_c).ok()?;
    Some(s)
}

/// Decimal speed text as stored in the speed attribute.
pub fn speed_text(speed: u32) -> String<12> {
    let mut s = String::new();
    let _ = write!(s, "{}", speed);
    s
}

/// Uplink form body: `temperature=22.50&humidity=40.00`, or `None` if
/// the values do not fit.
pub fn uplink_body(temperature_c: f32, humidity_pct: f32) -> Option<String<64>> {
    let mut s = String::new();
    write!(
        s,
        "temperature={:.2}&humidity={:.2}",
        temperature_c, humidity_pct
    )
    .ok()?;
    Some(s)
}

// ───────────────────────────────────────────────────────────────
// DisplayFrame
// ───────────────────────────────────────────────────────────────

pub const DISPLAY_LINES: usize = 4;
pub const DISPLAY_COLUMNS: usize = 32;

/// Text lines drawn top to bottom on a cleared screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    lines: Vec<String<DISPLAY_COLUMNS>, DISPLAY_LINES>,
}

impl DisplayFrame {
    /// Frame for one cycle: readings (or the failure line), then speed.
    pub fn for_cycle(reading: &TelemetryReading, speed: u32) -> Self {
        let mut frame = Self::default();
        match reading.values() {
            Some((t, h)) => {
                frame.push_fmt(format_args!("Humidity: {:.1}%", h));
                frame.push_fmt(format_args!("Temp: {:.1} C", t));
            }
            None => frame.push_fmt(format_args!("{}", SENSOR_FAILED_TEXT)),
        }
        frame.push_fmt(format_args!("{} RPM", speed));
        frame
    }

    /// Append a line; extra lines and overlong text are cut off.
    pub fn push_fmt(&mut self, args: core::fmt::Arguments<'_>) {
        let mut line = String::new();
        let _ = line.write_fmt(args);
        let _ = self.lines.push(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
