//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). This is the
//! human-visible status line for relay transitions and fault handling.
//! Per-cycle readings go out at `debug` as `uptime_ms,V,I,P` CSV.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::safety::RelayState;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { voltage_zero, current_zero } => {
                info!("START | zero codes V={} I={}", voltage_zero, current_zero);
            }
            AppEvent::RelayChanged(RelayState::Energized) => {
                info!("RELAY | ON (load energized)");
            }
            AppEvent::RelayChanged(RelayState::DeEnergized) => {
                warn!("RELAY | OFF (safe mode)");
            }
            AppEvent::FaultLatched(flags) => {
                error!("FAULT | latched, flags=0b{:08b} -> relay off", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | cleared by operator");
            }
            AppEvent::PredictionChanged { class_index, label } => {
                info!("MODEL | prediction -> {} ({})", label, class_index);
            }
            AppEvent::CalibrationUpdated { channel, scale } => {
                info!("CAL   | {:?} scale = {}", channel, scale);
            }
            AppEvent::ManualOverride(state) => {
                info!("RELAY | manual override -> {:?}", state);
            }
            AppEvent::Reading { uptime_ms, voltage, current, power } => {
                debug!("{},{:.1},{:.3},{:.1}", uptime_ms, voltage, current, power);
            }
        }
    }
}
