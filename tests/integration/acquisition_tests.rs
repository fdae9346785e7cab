//! Integration tests for the sample → RMS → classify → relay pipeline.

use crate::mock_hw::{fast_config, LogSink, MockAdc, ScriptedModel, AMPS_PER_CODE, VOLTS_PER_CODE};

use gridguard::app::events::AppEvent;
use gridguard::app::service::AcquisitionService;
use gridguard::model::ReferenceModel;
use gridguard::safety::RelayState;
use gridguard::telemetry::{self, Status, TelemetryReader};

const V_ZERO: u16 = 2010;
const I_ZERO: u16 = 1990;

fn booted() -> (AcquisitionService, TelemetryReader, MockAdc, LogSink) {
    let (writer, reader) = telemetry::shared();
    let mut svc = AcquisitionService::new(fast_config(), writer);
    let mut hw = MockAdc::at_rest(V_ZERO, I_ZERO);
    let mut sink = LogSink::new();
    svc.start(&mut hw, &mut sink);
    (svc, reader, hw, sink)
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_energizes_relay_and_measures_zero_codes() {
    let (svc, reader, hw, sink) = booted();

    assert_eq!(hw.relay_writes, vec![true]);
    assert_eq!(svc.relay_state(), RelayState::Energized);
    assert_eq!(svc.calibration().voltage_zero_code(), V_ZERO);
    assert_eq!(svc.calibration().current_zero_code(), I_ZERO);
    assert_eq!(svc.calibration().voltage_scale(), 533.6);
    assert_eq!(svc.calibration().current_scale(), 11.0);

    let snap = reader.snapshot();
    assert_eq!(snap.status, Status::Initializing);
    assert_eq!(snap.status.as_str(), "AI INIT");
    assert!(snap.relay_energized);
    assert!(!snap.fault_latched);

    assert!(sink.events.contains(&AppEvent::Started {
        voltage_zero: V_ZERO,
        current_zero: I_ZERO,
    }));
}

// ── End-to-end ────────────────────────────────────────────────

#[test]
fn small_voltage_signal_with_resting_current() {
    let (mut svc, reader, mut hw, mut sink) = booted();
    // 20 codes is below the voltage noise floor at the default scale.
    svc.handle_line("VCAL:1000", &mut hw, &mut sink);
    hw.set_voltage_amplitude(20);

    let mut model = ScriptedModel::idle();
    let snap = svc.tick(&mut hw, &mut model, &mut sink);

    let expected = 20.0 * 3.3 / 4095.0 * 1000.0;
    assert!((snap.voltage - expected).abs() < 0.01, "V = {}", snap.voltage);
    assert_eq!(snap.current, 0.0);
    assert_eq!(snap.power, 0.0);
    assert_eq!(model.inputs, vec![[snap.voltage, 0.0, 0.0]]);
    assert_eq!(svc.relay_state(), RelayState::Energized);
    assert_eq!(hw.relay_writes, vec![true]);
    assert_eq!(reader.snapshot().status, Status::Idle);
}

#[test]
fn same_signal_at_default_scale_clamps_to_zero() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    hw.set_voltage_amplitude(20);
    let snap = svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    assert_eq!(snap.voltage, 0.0);
}

#[test]
fn mains_level_readings_track_amplitude() {
    let (mut svc, reader, mut hw, mut sink) = booted();
    hw.set_voltage_amplitude(535);
    hw.set_current_amplitude(23);

    let snap = svc.tick(&mut hw, &mut ReferenceModel::new(), &mut sink);

    assert!((snap.voltage - 535.0 * VOLTS_PER_CODE).abs() < 0.05);
    assert!((snap.current - 23.0 * AMPS_PER_CODE).abs() < 1e-4);
    assert!((snap.power - snap.voltage * snap.current).abs() < 1e-3);
    assert_eq!(snap.status, Status::Level2);
    assert_eq!(reader.snapshot().status.as_str(), "LEVEL_2");
    assert!(!reader.waveform().is_empty());
}

// ── Fault latch ───────────────────────────────────────────────

#[test]
fn overcurrent_latches_and_drops_relay() {
    let (mut svc, reader, mut hw, mut sink) = booted();
    hw.set_voltage_amplitude(535);
    // ~0.5 A, well above the trip threshold.
    hw.set_current_amplitude(57);

    let snap = svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);

    assert!(svc.is_fault_latched());
    assert_eq!(snap.status, Status::AiFault);
    assert_eq!(hw.relay_on(), Some(false));
    assert!(reader.snapshot().fault_latched);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultLatched(_))), 1);
}

#[test]
fn fault_class_latches_even_at_low_current() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    let snap = svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    assert!(svc.is_fault_latched());
    assert_eq!(snap.status.as_str(), "AI FAULT");
    assert_eq!(svc.relay_state(), RelayState::DeEnergized);
}

#[test]
fn latch_survives_a_hundred_normal_cycles() {
    let (mut svc, reader, mut hw, mut sink) = booted();
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    assert!(svc.is_fault_latched());

    let mut normal = ScriptedModel::idle();
    for _ in 0..100 {
        let snap = svc.tick(&mut hw, &mut normal, &mut sink);
        assert_eq!(snap.status, Status::FaultLatched);
        assert!(!snap.relay_energized);
    }
    assert!(svc.is_fault_latched());
    assert_eq!(reader.snapshot().status.as_str(), "FAULT: OC");
    // The classifier is bypassed while latched.
    assert!(normal.inputs.is_empty());
    // Boot on, one trip off, nothing after that.
    assert_eq!(hw.relay_writes, vec![true, false]);
}

#[test]
fn reset_clears_latch_and_restores_service() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);

    svc.handle_line("RESET", &mut hw, &mut sink);
    assert!(!svc.is_fault_latched());
    assert_eq!(svc.relay_state(), RelayState::Energized);

    let snap = svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    assert_eq!(snap.status, Status::Idle);
    assert_eq!(hw.relay_writes, vec![true, false, true]);
}

// ── Relay idempotence ─────────────────────────────────────────

#[test]
fn steady_normal_operation_writes_relay_once() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    let mut model = ScriptedModel::idle();
    for _ in 0..20 {
        svc.tick(&mut hw, &mut model, &mut sink);
    }
    assert_eq!(hw.relay_writes, vec![true]);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::RelayChanged(_))), 1);
    assert_eq!(svc.cycle_count(), 20);
}

#[test]
fn prediction_change_is_reported_once_per_change() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    let mut idle = ScriptedModel::idle();
    let mut level1 = ScriptedModel::new([0.0, 0.1, 0.8, 0.1]);

    svc.tick(&mut hw, &mut idle, &mut sink);
    svc.tick(&mut hw, &mut idle, &mut sink);
    svc.tick(&mut hw, &mut level1, &mut sink);

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PredictionChanged { label, .. } => Some(*label),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec!["IDLE", "LEVEL_1"]);
}

#[test]
fn argmax_tie_resolves_to_fault() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    let snap = svc.tick(&mut hw, &mut ScriptedModel::new([0.5, 0.5, 0.0, 0.0]), &mut sink);
    assert_eq!(snap.status, Status::AiFault);
    assert!(svc.is_fault_latched());
}
