//! Mock adapters for integration tests.
//!
//! `MockAdc` produces a square wave around a fixed zero code on each
//! channel, so the RMS of any even-length window equals the amplitude in
//! codes exactly. Every other adapter just records what it was asked to do.

use embedded_hal::delay::DelayNs;

use gridguard::app::events::AppEvent;
use gridguard::app::ports::{
    DisplayPort, EventSink, InferenceModel, RelayPort, SensorPort, UplinkPort,
};
use gridguard::classifier::CLASS_COUNT;
use gridguard::config::SystemConfig;
use gridguard::error::CommsError;
use gridguard::sensors::AdcChannel;

/// Volts per code at the default voltage scale.
pub const VOLTS_PER_CODE: f32 = 3.3 / 4095.0 * 533.6;
/// Amps per code at the default current scale.
pub const AMPS_PER_CODE: f32 = 3.3 / 4095.0 * 11.0;

/// Window sizes small enough to keep the suite fast.
pub fn fast_config() -> SystemConfig {
    SystemConfig {
        samples_per_window: 200,
        sample_interval_us: 0,
        zero_cross_timeout_ms: 0,
        ..SystemConfig::default()
    }
}

// ── Square-wave ADC + relay pin ───────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Channel {
    zero: u16,
    amplitude: u16,
    high: bool,
}

impl Channel {
    fn next(&mut self) -> u16 {
        self.high = !self.high;
        if self.high {
            self.zero + self.amplitude
        } else {
            self.zero - self.amplitude
        }
    }
}

pub struct MockAdc {
    voltage: Channel,
    current: Channel,
    pub reads: usize,
    /// Every level written to the relay pin, in order.
    pub relay_writes: Vec<bool>,
}

#[allow(dead_code)]
impl MockAdc {
    /// Both channels at rest on the given zero codes.
    pub fn at_rest(voltage_zero: u16, current_zero: u16) -> Self {
        Self {
            voltage: Channel { zero: voltage_zero, amplitude: 0, high: false },
            current: Channel { zero: current_zero, amplitude: 0, high: false },
            reads: 0,
            relay_writes: Vec::new(),
        }
    }

    pub fn set_voltage_amplitude(&mut self, codes: u16) {
        self.voltage.amplitude = codes;
    }

    pub fn set_current_amplitude(&mut self, codes: u16) {
        self.current.amplitude = codes;
    }

    /// Last level written to the relay pin.
    pub fn relay_on(&self) -> Option<bool> {
        self.relay_writes.last().copied()
    }
}

impl DelayNs for MockAdc {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl SensorPort for MockAdc {
    fn read_raw(&mut self, channel: AdcChannel) -> u16 {
        self.reads += 1;
        match channel {
            AdcChannel::Voltage => self.voltage.next(),
            AdcChannel::Current => self.current.next(),
        }
    }
}

impl RelayPort for MockAdc {
    fn set_energized(&mut self, on: bool) {
        self.relay_writes.push(on);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Model ─────────────────────────────────────────────────────

/// Returns a fixed probability vector and records every input.
pub struct ScriptedModel {
    pub output: [f32; CLASS_COUNT],
    pub inputs: Vec<[f32; 3]>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn new(output: [f32; CLASS_COUNT]) -> Self {
        Self { output, inputs: Vec::new() }
    }

    pub fn idle() -> Self {
        Self::new([0.0, 1.0, 0.0, 0.0])
    }

    pub fn fault() -> Self {
        Self::new([0.9, 0.1, 0.0, 0.0])
    }
}

impl InferenceModel for ScriptedModel {
    fn infer(&mut self, input: &[f32; 3]) -> [f32; CLASS_COUNT] {
        self.inputs.push(*input);
        self.output
    }
}

// ── Foreground collaborators ──────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub statuses: Vec<String>,
    pub voltages: Vec<f32>,
    pub waveform_lens: Vec<usize>,
}

impl DisplayPort for RecordingDisplay {
    fn update_power(&mut self, _watts: f32) {}

    fn update_current(&mut self, _amps: f32) {}

    fn update_voltage(&mut self, volts: f32) {
        self.voltages.push(volts);
    }

    fn update_status(&mut self, status: &str) {
        self.statuses.push(status.to_owned());
    }

    fn update_waveform(&mut self, points: &[u16]) {
        self.waveform_lens.push(points.len());
    }
}

#[derive(Default)]
pub struct RecordingUplink {
    pub connected: bool,
    pub fail_publish: bool,
    pub polls: Vec<u64>,
    pub published: Vec<(f32, f32, f32, String)>,
}

impl UplinkPort for RecordingUplink {
    fn poll(&mut self, now_ms: u64) {
        self.polls.push(now_ms);
    }

    fn publish_telemetry(
        &mut self,
        voltage: f32,
        current: f32,
        power: f32,
        status: &str,
    ) -> Result<(), CommsError> {
        if self.fail_publish {
            return Err(CommsError::MqttPublishFailed);
        }
        self.published.push((voltage, current, power, status.to_owned()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
