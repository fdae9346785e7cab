//! RMS reduction of a raw sample window into calibrated units.
//!
//! `value = sqrt(mean((raw - zero)^2)) * (ADC_REF_VOLTS / ADC_MAX_CODE) * scale`
//!
//! Readings under the channel's noise floor are reported as exactly zero.

use crate::pins;

/// ADC full-scale reference (12 dB attenuation).
pub const ADC_REF_VOLTS: f32 = 3.3;
/// Full-scale code of a 12-bit conversion.
pub const ADC_MAX_CODE: f32 = pins::ADC_MAX_CODE as f32;

/// Voltage readings below this are reported as 0 V.
pub const VOLTAGE_NOISE_FLOOR: f32 = 15.0;
/// Current readings below this are reported as 0 A.
pub const CURRENT_NOISE_FLOOR: f32 = 0.10;

/// RMS deviation of `codes` from `zero`, in raw codes.
///
/// An empty window yields 0.0.
pub fn rms_codes(codes: &[u16], zero: u16) -> f32 {
    if codes.is_empty() {
        return 0.0;
    }
    // 4095^2 per sample fits u64 for any realistic window length.
    let sum_sq: u64 = codes
        .iter()
        .map(|&c| {
            let d = i64::from(c) - i64::from(zero);
            (d * d) as u64
        })
        .sum();
    (sum_sq as f64 / codes.len() as f64).sqrt() as f32
}

fn to_units(codes: &[u16], zero: u16, scale: f32) -> f32 {
    rms_codes(codes, zero) * (ADC_REF_VOLTS / ADC_MAX_CODE) * scale
}

/// Clamp anything under `floor` (including NaN and negatives) to 0.0.
fn floor_clamp(value: f32, floor: f32) -> f32 {
    if value >= floor { value } else { 0.0 }
}

/// Mains voltage RMS in volts.
pub fn rms_voltage(codes: &[u16], zero: u16, scale: f32) -> f32 {
    floor_clamp(to_units(codes, zero, scale), VOLTAGE_NOISE_FLOOR)
}

/// Load current RMS in amps.
pub fn rms_current(codes: &[u16], zero: u16, scale: f32) -> f32 {
    floor_clamp(to_units(codes, zero, scale), CURRENT_NOISE_FLOOR)
}
