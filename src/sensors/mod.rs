//! Analog front end: calibration, windowed sampling and RMS reduction.
//!
//! The acquisition task drives these in order each cycle:
//!
//! ```text
//!  SensorPort ──▶ sampler ──▶ SampleWindow ──▶ rms ──▶ volts / amps
//!                    │
//!                    └──▶ Waveform (decimated, display only)
//! ```

pub mod calibration;
pub mod deadline;
pub mod rms;
pub mod sampler;

use crate::pins;

/// The two measured channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcChannel {
    Voltage,
    Current,
}

impl AdcChannel {
    /// ADC1 channel number backing this measurement.
    pub const fn adc1_channel(self) -> u32 {
        match self {
            Self::Voltage => pins::VOLTAGE_ADC_CHANNEL,
            Self::Current => pins::CURRENT_ADC_CHANNEL,
        }
    }
}

pub use calibration::CalibrationProfile;
pub use sampler::{SampleWindow, Waveform};
