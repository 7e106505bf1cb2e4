//! Unified error types for the ESPFAN firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so
//! they can be handed across the event thread and the main cycle without
//! allocation.
//!
//! None of these ever reach the wireless client: the GATT surface has no
//! error attribute, so client-visible failure is only ever implicit.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The environmental sensor transaction failed.
    Sensor(SensorFault),
    /// A speed-control write could not be parsed.
    Parse(ParseError),
    /// The station-mode network link is unavailable.
    Link(LinkFault),
    /// The PWM peripheral rejected a duty write.
    Actuator(ActuatorError),
    /// The display could not be drawn.
    Display(DisplayError),
    /// The HTTP uplink post failed.
    Uplink(UplinkError),
    /// A peripheral failed to initialise at startup (fatal).
    PeripheralInit(&'static str),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Uplink(e) => write!(f, "uplink: {e}"),
            Self::PeripheralInit(what) => write!(f, "peripheral init: {what}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// The driver reported a bus / protocol error.
    Transaction,
    /// The sensor did not answer within the driver timeout.
    Timeout,
    /// The frame checksum did not match.
    Checksum,
    /// A channel decoded to not-a-number.
    NotANumber,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction => write!(f, "sensor transaction failed"),
            Self::Timeout => write!(f, "sensor timed out"),
            Self::Checksum => write!(f, "sensor checksum mismatch"),
            Self::NotANumber => write!(f, "sensor returned NaN"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Speed-control parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Payload was empty after trimming.
    Empty,
    /// Payload is not valid UTF-8.
    NotUtf8,
    /// Payload is not a decimal integer.
    NotAnInteger,
    /// Payload was longer than the attribute holds.
    TooLong,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty speed payload"),
            Self::NotUtf8 => write!(f, "speed payload is not UTF-8"),
            Self::NotAnInteger => write!(f, "speed payload is not a decimal integer"),
            Self::TooLong => write!(f, "speed payload exceeds the attribute length"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Link faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// No SSID configured.
    NoCredentials,
    /// The connect sequence did not bring the link up.
    ConnectFailed,
    /// A bounded retry policy ran out of attempts.
    RetriesExhausted,
}

impl fmt::Display for LinkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
            Self::RetriesExhausted => write!(f, "WiFi retry budget exhausted"),
        }
    }
}

impl From<LinkFault> for Error {
    fn from(e: LinkFault) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// I2C transfer to the display controller failed.
    Bus,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "display bus error"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Uplink errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkError {
    /// The HTTP connection or request could not be completed.
    Request,
    /// The server answered with a non-2xx status.
    Status(u16),
}

impl fmt::Display for UplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "HTTP request failed"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
        }
    }
}

impl From<UplinkError> for Error {
    fn from(e: UplinkError) -> Self {
        Self::Uplink(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.  The message names the field.
    Invalid(&'static str),
    /// The JSON override could not be decoded.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
            Self::Malformed => write!(f, "config override is not valid JSON"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
