//! System configuration parameters
//!
//! All tunable parameters for the GridGuard monitor. Values are compiled-in
//! defaults; nothing is persisted, so a reboot always restores them.
//! Network credentials are injected at build time.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sampling ---
    /// Raw samples per channel in one estimation window
    pub samples_per_window: u16,
    /// Pause between consecutive raw conversions (microseconds)
    pub sample_interval_us: u32,
    /// Resting samples averaged at boot to find the zero codes
    pub zero_cal_samples: u16,
    /// Bounded wait for the current-channel zero crossing (milliseconds)
    pub zero_cross_timeout_ms: u32,

    // --- Calibration (boot defaults, runtime adjustable) ---
    /// Voltage channel scale factor (volts per ADC volt)
    pub voltage_scale: f32,
    /// Current channel scale factor (amps per ADC volt)
    pub current_scale: f32,

    // --- Timing ---
    /// Delay between acquisition cycles (milliseconds)
    pub acquisition_interval_ms: u32,
    /// Telemetry publish cadence (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Foreground display refresh cadence (milliseconds)
    pub display_refresh_ms: u32,
    /// Fixed interval between WiFi / MQTT reconnect attempts (milliseconds)
    pub reconnect_interval_ms: u32,

    // --- Network ---
    pub device_id: heapless::String<32>,
    pub mqtt_broker_url: heapless::String<64>,
    pub mqtt_topic: heapless::String<64>,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
}

/// Smallest resting window accepted for zero-code estimation.
pub const MIN_ZERO_CAL_SAMPLES: u16 = 1000;

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sampling
            samples_per_window: 1000,
            sample_interval_us: 50,
            zero_cal_samples: MIN_ZERO_CAL_SAMPLES,
            zero_cross_timeout_ms: 20,

            // Calibration
            voltage_scale: 533.6,
            current_scale: 11.0,

            // Timing
            acquisition_interval_ms: 100,  // 10 Hz
            telemetry_interval_ms: 2000,   // 0.5 Hz
            display_refresh_ms: 20,
            reconnect_interval_ms: 5000,

            // Network
            device_id: fixed("esp32_box_1"),
            mqtt_broker_url: fixed("mqtt://broker.hivemq.com:1883"),
            mqtt_topic: fixed("gridguard/power/telemetry"),
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),
        }
    }
}

/// Errors from [`SystemConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

impl SystemConfig {
    /// Replace the WiFi credentials, truncating to the fixed capacities.
    pub fn with_wifi(mut self, ssid: &str, password: &str) -> Self {
        self.wifi_ssid = fixed(ssid);
        self.wifi_password = fixed(password);
        self
    }

    /// Reject values that would break the acquisition contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_window == 0 {
            return Err(ConfigError::ValidationFailed("samples_per_window must be > 0"));
        }
        if self.zero_cal_samples < MIN_ZERO_CAL_SAMPLES {
            return Err(ConfigError::ValidationFailed("zero_cal_samples must be >= 1000"));
        }
        if !self.voltage_scale.is_finite() || !self.current_scale.is_finite() {
            return Err(ConfigError::ValidationFailed("scale factors must be finite"));
        }
        if self.acquisition_interval_ms == 0 || self.telemetry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("cadences must be > 0"));
        }
        if self.device_id.is_empty() {
            return Err(ConfigError::ValidationFailed("device_id must not be empty"));
        }
        Ok(())
    }
}
