//! Acquisition service: the hexagonal core.
//!
//! [`AcquisitionService`] owns calibration, the relay controller, the fault
//! latch and the telemetry writer. One call to [`tick`](AcquisitionService::tick)
//! runs a full cycle. All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │     AcquisitionService      │
//!   RelayPort ◀── │ sample · RMS · classify ·   │ ──▶ TelemetryWriter
//! InferenceModel ▶│ latch · actuate             │
//!                 └─────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::classifier::{classify, judge, FAULT_CLASS};
use crate::config::SystemConfig;
use crate::safety::{RelayController, RelayState, SafetySupervisor};
use crate::sensors::calibration::CalibrationProfile;
use crate::sensors::rms::{rms_current, rms_voltage};
use crate::sensors::sampler::{sample_current, sample_voltage, SampleWindow, Waveform};
use crate::sensors::AdcChannel;
use crate::telemetry::{Status, TelemetrySnapshot, TelemetryWriter};

use super::commands::{AppCommand, CommandChannel};
use super::events::AppEvent;
use super::ports::{EventSink, InferenceModel, RelayPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// AcquisitionService
// ───────────────────────────────────────────────────────────────

pub struct AcquisitionService {
    config: SystemConfig,
    calibration: CalibrationProfile,
    relay: RelayController,
    safety: SafetySupervisor,
    telemetry: TelemetryWriter,
    voltage_window: SampleWindow,
    current_window: SampleWindow,
    waveform: Waveform,
    /// Class chosen on the most recent classified cycle.
    last_class: Option<usize>,
    last_snapshot: TelemetrySnapshot,
    cycle_count: u64,
    boot: Instant,
}

impl AcquisitionService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, telemetry: TelemetryWriter) -> Self {
        let n = usize::from(config.samples_per_window);
        let calibration =
            CalibrationProfile::uncalibrated(config.voltage_scale, config.current_scale);
        Self {
            voltage_window: SampleWindow::with_capacity(n),
            current_window: SampleWindow::with_capacity(n),
            waveform: Waveform::new(),
            config,
            calibration,
            relay: RelayController::new(),
            safety: SafetySupervisor::new(),
            telemetry,
            last_class: None,
            last_snapshot: TelemetrySnapshot::default(),
            cycle_count: 0,
            boot: Instant::now(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot sequence: energize the relay, measure zero codes at rest, and
    /// publish the initial status.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        self.relay.boot(hw, sink);
        self.calibration = CalibrationProfile::from_config(hw, &self.config);

        self.last_snapshot = TelemetrySnapshot {
            status: Status::Initializing,
            fault_latched: self.safety.is_latched(),
            relay_energized: self.relay.state().is_energized(),
            ..TelemetrySnapshot::default()
        };
        self.telemetry.publish(&self.last_snapshot);

        sink.emit(&AppEvent::Started {
            voltage_zero: self.calibration.voltage_zero_code(),
            current_zero: self.calibration.current_zero_code(),
        });
        info!("AcquisitionService started");
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle: sample → RMS → classify → actuate → publish.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`RelayPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        model: &mut impl InferenceModel,
        sink: &mut impl EventSink,
    ) -> TelemetrySnapshot {
        self.cycle_count += 1;
        let n = usize::from(self.config.samples_per_window);
        let interval_us = self.config.sample_interval_us;

        // 1. Sample both channels
        sample_voltage(hw, n, interval_us, &mut self.voltage_window);
        sample_current(
            hw,
            n,
            interval_us,
            self.calibration.current_zero_code(),
            Duration::from_millis(u64::from(self.config.zero_cross_timeout_ms)),
            &mut self.current_window,
            &mut self.waveform,
        );

        // 2. Reduce to physical units
        let voltage = rms_voltage(
            self.voltage_window.codes(),
            self.calibration.voltage_zero_code(),
            self.calibration.voltage_scale(),
        );
        let current = rms_current(
            self.current_window.codes(),
            self.calibration.current_zero_code(),
            self.calibration.current_scale(),
        );
        let power = voltage * current;

        sink.emit(&AppEvent::Reading {
            uptime_ms: self.boot.elapsed().as_millis() as u64,
            voltage,
            current,
            power,
        });

        // 3. Decide and actuate
        let status = if self.safety.is_latched() {
            self.relay.request_off(hw, sink);
            Status::FaultLatched
        } else {
            let result = classify(model, voltage, current, power);
            if self.last_class != Some(result.class_index) {
                self.last_class = Some(result.class_index);
                sink.emit(&AppEvent::PredictionChanged {
                    class_index: result.class_index,
                    label: result.label(),
                });
            }

            let verdict = judge(&result, current);
            if verdict.is_fault() {
                self.safety.latch(verdict.faults);
                warn!(
                    "Fault latched: class={} I={:.3}A flags=0b{:08b}",
                    result.label(),
                    current,
                    self.safety.faults()
                );
                sink.emit(&AppEvent::FaultLatched(self.safety.faults()));
                self.relay.request_off(hw, sink);
                Status::AiFault
            } else {
                self.relay.request_on(hw, sink);
                Status::from_class(result.class_index)
            }
        };

        // 4. Publish
        self.last_snapshot = TelemetrySnapshot {
            voltage,
            current,
            power,
            status,
            fault_latched: self.safety.is_latched(),
            relay_energized: self.relay.state().is_energized(),
        };
        self.telemetry.publish(&self.last_snapshot);
        self.telemetry.publish_waveform(&self.waveform);
        self.last_snapshot
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one control command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetVoltageScale(scale) => {
                self.calibration.set_voltage_scale(scale);
                sink.emit(&AppEvent::CalibrationUpdated {
                    channel: AdcChannel::Voltage,
                    scale,
                });
            }
            AppCommand::SetCurrentScale(scale) => {
                self.calibration.set_current_scale(scale);
                sink.emit(&AppEvent::CalibrationUpdated {
                    channel: AdcChannel::Current,
                    scale,
                });
            }
            AppCommand::ForceRelayOn => {
                self.relay.request_on(hw, sink);
                sink.emit(&AppEvent::ManualOverride(RelayState::Energized));
            }
            AppCommand::ForceRelayOff => {
                self.relay.request_off(hw, sink);
                sink.emit(&AppEvent::ManualOverride(RelayState::DeEnergized));
            }
            AppCommand::Reset => {
                if self.safety.clear() {
                    sink.emit(&AppEvent::FaultCleared);
                    // Until the next cycle, show the last non-fault class.
                    self.last_snapshot.status = match self.last_class {
                        Some(class) if class != FAULT_CLASS => Status::from_class(class),
                        _ => Status::Initializing,
                    };
                }
                self.relay.request_on(hw, sink);
            }
        }

        // Surface latch / relay changes without waiting for the next cycle.
        self.last_snapshot.fault_latched = self.safety.is_latched();
        self.last_snapshot.relay_energized = self.relay.state().is_energized();
        self.telemetry.publish(&self.last_snapshot);
    }

    /// Parse and apply one control line. Unrecognised lines are dropped.
    /// Returns whether a command was applied.
    pub fn handle_line(
        &mut self,
        line: &str,
        hw: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        match AppCommand::parse(line) {
            Some(cmd) => {
                self.handle_command(cmd, hw, sink);
                true
            }
            None => {
                log::debug!("Ignoring control line {:?}", line);
                false
            }
        }
    }

    /// Apply every line currently queued on `channel`. Returns the number
    /// of lines consumed.
    pub fn drain_commands(
        &mut self,
        channel: &CommandChannel,
        hw: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut consumed = 0;
        while let Ok(line) = channel.try_receive() {
            self.handle_line(&line, hw, sink);
            consumed += 1;
        }
        consumed
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn calibration(&self) -> &CalibrationProfile {
        &self.calibration
    }

    pub fn relay_state(&self) -> RelayState {
        self.relay.state()
    }

    pub fn is_fault_latched(&self) -> bool {
        self.safety.is_latched()
    }

    /// Current latched fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.safety.faults()
    }

    /// Total cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
