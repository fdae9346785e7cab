//! Outbound application events.
//!
//! The [`AcquisitionService`](super::service::AcquisitionService) emits
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use crate::safety::RelayState;
use crate::sensors::AdcChannel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot calibration finished; carries the measured zero codes.
    Started { voltage_zero: u16, current_zero: u16 },

    /// The relay actually changed state (never emitted for no-op requests).
    RelayChanged(RelayState),

    /// A fault was latched; carries the full latched bitmask.
    FaultLatched(u8),

    /// The operator cleared a latched fault.
    FaultCleared,

    /// The classifier picked a different class than last cycle.
    PredictionChanged { class_index: usize, label: &'static str },

    /// A channel scale factor was replaced at runtime.
    CalibrationUpdated { channel: AdcChannel, scale: f32 },

    /// A relay override command was applied.
    ManualOverride(RelayState),

    /// Per-cycle measurement record.
    Reading {
        uptime_ms: u64,
        voltage: f32,
        current: f32,
        power: f32,
    },
}
