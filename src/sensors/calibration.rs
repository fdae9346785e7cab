//! Zero-offset and scale calibration for both channels.
//!
//! Zero codes are measured once at boot from a resting average and never
//! change afterwards. Scale factors start at the compiled-in defaults and
//! can be replaced at runtime by the command interpreter; they live in RAM
//! only.

use log::info;

use crate::app::ports::SensorPort;
use crate::config::{SystemConfig, MIN_ZERO_CAL_SAMPLES};
use crate::pins::ADC_MIDSCALE;

use super::AdcChannel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    voltage_zero_code: u16,
    current_zero_code: u16,
    voltage_scale: f32,
    current_scale: f32,
}

impl CalibrationProfile {
    /// Profile with mid-rail zero codes, used before the boot average runs.
    pub fn uncalibrated(voltage_scale: f32, current_scale: f32) -> Self {
        Self {
            voltage_zero_code: ADC_MIDSCALE,
            current_zero_code: ADC_MIDSCALE,
            voltage_scale,
            current_scale,
        }
    }

    /// Profile with explicit zero codes.
    pub fn with_zero_codes(
        voltage_zero_code: u16,
        current_zero_code: u16,
        voltage_scale: f32,
        current_scale: f32,
    ) -> Self {
        Self {
            voltage_zero_code,
            current_zero_code,
            voltage_scale,
            current_scale,
        }
    }

    /// Average `samples` resting conversions per channel, `interval_us`
    /// apart, to find the zero codes.
    ///
    /// Windows shorter than [`MIN_ZERO_CAL_SAMPLES`] are widened to it.
    pub fn zero_from_rest(
        hw: &mut impl SensorPort,
        samples: u16,
        interval_us: u32,
        voltage_scale: f32,
        current_scale: f32,
    ) -> Self {
        let n = samples.max(MIN_ZERO_CAL_SAMPLES);
        let mut v_sum: u32 = 0;
        let mut i_sum: u32 = 0;
        for _ in 0..n {
            v_sum += u32::from(hw.read_raw(AdcChannel::Voltage));
            i_sum += u32::from(hw.read_raw(AdcChannel::Current));
            hw.delay_us(interval_us);
        }

        let profile = Self {
            voltage_zero_code: (v_sum / u32::from(n)) as u16,
            current_zero_code: (i_sum / u32::from(n)) as u16,
            voltage_scale,
            current_scale,
        };
        info!(
            "Calibration: zero codes V={} I={} over {} samples",
            profile.voltage_zero_code, profile.current_zero_code, n
        );
        profile
    }

    /// Boot-time zero calibration using the configured window and scales.
    pub fn from_config(hw: &mut impl SensorPort, config: &SystemConfig) -> Self {
        Self::zero_from_rest(
            hw,
            config.zero_cal_samples,
            config.sample_interval_us,
            config.voltage_scale,
            config.current_scale,
        )
    }

    pub fn voltage_zero_code(&self) -> u16 {
        self.voltage_zero_code
    }

    pub fn current_zero_code(&self) -> u16 {
        self.current_zero_code
    }

    pub fn voltage_scale(&self) -> f32 {
        self.voltage_scale
    }

    pub fn current_scale(&self) -> f32 {
        self.current_scale
    }

    /// Replace the voltage scale. Zero codes are left untouched.
    pub fn set_voltage_scale(&mut self, scale: f32) {
        self.voltage_scale = scale;
    }

    /// Replace the current scale. Zero codes are left untouched.
    pub fn set_current_scale(&mut self, scale: f32) {
        self.current_scale = scale;
    }
}
