//! GPIO / peripheral pin assignments for the GridGuard board (ESP32-S3-BOX-3
//! with the dock header).
//!
//! Drivers reference these constants instead of hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Analog front end (ADC1, 12-bit, 12 dB attenuation)
// ---------------------------------------------------------------------------

/// Voltage transformer output, biased to mid-rail.
pub const VOLTAGE_ADC_GPIO: i32 = 10;
/// ADC1 channel 9 on ESP32-S3.
pub const VOLTAGE_ADC_CHANNEL: u32 = 9;

/// Current transformer output, biased to mid-rail.
pub const CURRENT_ADC_GPIO: i32 = 9;
/// ADC1 channel 8 on ESP32-S3.
pub const CURRENT_ADC_CHANNEL: u32 = 8;

/// Mid-rail code assumed before zero calibration runs.
pub const ADC_MIDSCALE: u16 = 2048;
/// Largest raw code a 12-bit conversion can return.
pub const ADC_MAX_CODE: u16 = 4095;

// ---------------------------------------------------------------------------
// Relay driver (NPN transistor, inverting)
// ---------------------------------------------------------------------------

/// Digital output to the relay transistor base.
/// HIGH = transistor on = relay coil pulled LOW = load energized.
pub const RELAY_GPIO: i32 = 40;
/// GPIO level that energizes the load.
pub const RELAY_ENERGIZED_LEVEL: bool = true;
