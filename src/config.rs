//! Node configuration parameters
//!
//! All tunable parameters for the ESPFAN node.  Defaults match the
//! reference board (1500 RPM fan on an 8-bit, 25 kHz LEDC channel, 2 s
//! cycle).  A JSON override can be baked in at build time through the
//! `ESPFAN_CONFIG` environment variable; Wi-Fi credentials come from
//! `ESPFAN_WIFI_SSID` / `ESPFAN_WIFI_PASSWORD`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- BLE ---
    /// Advertised GAP device name
    pub device_name: heapless::String<24>,

    // --- Fan / PWM ---
    /// Fan speed at full duty (RPM)
    pub max_speed_rpm: u32,
    /// LEDC duty resolution in bits (MAX_DUTY = 2^bits - 1)
    pub pwm_resolution_bits: u8,
    /// LEDC output frequency (Hz)
    pub pwm_frequency_hz: u32,
    /// Duty committed at boot, before any client write
    pub initial_duty: u32,

    // --- Timing ---
    /// Main cycle period (milliseconds)
    pub cycle_period_ms: u32,
    /// Sleep between Wi-Fi connect attempts (milliseconds)
    pub link_retry_interval_ms: u32,
    /// Connect attempts per cycle before giving up; `None` retries forever
    pub link_max_attempts: Option<u32>,

    // --- Wi-Fi station ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Uplink ---
    /// HTTP endpoint receiving form-encoded readings; `None` disables the uplink
    pub post_url: Option<heapless::String<128>>,
    /// Seconds between uplink posts
    pub post_interval_secs: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_name: bounded("ESPFAN"),

            // Fan / PWM
            max_speed_rpm: 1500,
            pwm_resolution_bits: 8,
            pwm_frequency_hz: crate::pins::FAN_PWM_FREQ_HZ,
            initial_duty: 100,

            // Timing
            cycle_period_ms: 2000,
            link_retry_interval_ms: 500,
            link_max_attempts: None,

            // Wi-Fi
            wifi_ssid: bounded(option_env!("ESPFAN_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("ESPFAN_WIFI_PASSWORD").unwrap_or("")),

            // Uplink
            post_url: None,
            post_interval_secs: 1800, // 30 min
        }
    }
}

impl NodeConfig {
    /// Build the effective configuration: defaults, then the build-time
    /// JSON override if one was provided, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match option_env!("ESPFAN_CONFIG") {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Decode a (possibly partial) JSON document; missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Malformed)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::Invalid("device_name must not be empty"));
        }
        if self.max_speed_rpm == 0 {
            return Err(ConfigError::Invalid("max_speed_rpm must be > 0"));
        }
        if !(1..=16).contains(&self.pwm_resolution_bits) {
            return Err(ConfigError::Invalid("pwm_resolution_bits must be 1..=16"));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::Invalid("pwm_frequency_hz must be > 0"));
        }
        if self.initial_duty > self.max_duty() {
            return Err(ConfigError::Invalid("initial_duty exceeds MAX_DUTY"));
        }
        if self.cycle_period_ms == 0 {
            return Err(ConfigError::Invalid("cycle_period_ms must be > 0"));
        }
        if self.link_retry_interval_ms == 0 {
            return Err(ConfigError::Invalid("link_retry_interval_ms must be > 0"));
        }
        if self.link_max_attempts == Some(0) {
            return Err(ConfigError::Invalid("link_max_attempts must be > 0 when set"));
        }
        if u64::from(self.post_interval_secs) * 1000 < u64::from(self.cycle_period_ms) {
            return Err(ConfigError::Invalid("post_interval_secs shorter than one cycle"));
        }
        Ok(())
    }

    /// Largest duty value for the configured resolution.
    pub fn max_duty(&self) -> u32 {
        (1u32 << self.pwm_resolution_bits.min(16)) - 1
    }

    /// Whether the HTTP uplink is configured.
    pub fn uplink_enabled(&self) -> bool {
        self.post_url.as_ref().is_some_and(|url| !url.is_empty())
    }
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
