//! Integration tests for the command queue → service path.

use crate::mock_hw::{fast_config, LogSink, MockAdc, ScriptedModel};

use gridguard::app::commands::{submit_line, CommandChannel};
use gridguard::app::events::AppEvent;
use gridguard::app::service::AcquisitionService;
use gridguard::safety::RelayState;
use gridguard::sensors::AdcChannel;
use gridguard::telemetry::{self, Status, TelemetryReader};

fn booted() -> (AcquisitionService, TelemetryReader, MockAdc, LogSink) {
    let (writer, reader) = telemetry::shared();
    let mut svc = AcquisitionService::new(fast_config(), writer);
    let mut hw = MockAdc::at_rest(2040, 2050);
    let mut sink = LogSink::new();
    svc.start(&mut hw, &mut sink);
    (svc, reader, hw, sink)
}

#[test]
fn vcal_updates_scale_and_keeps_zero_codes() {
    let (mut svc, _reader, mut hw, mut sink) = booted();

    assert!(svc.handle_line("VCAL:540.0", &mut hw, &mut sink));

    let cal = svc.calibration();
    assert_eq!(cal.voltage_scale(), 540.0);
    assert_eq!(cal.current_scale(), 11.0);
    assert_eq!(cal.voltage_zero_code(), 2040);
    assert_eq!(cal.current_zero_code(), 2050);
    assert!(sink.events.contains(&AppEvent::CalibrationUpdated {
        channel: AdcChannel::Voltage,
        scale: 540.0,
    }));
}

#[test]
fn ical_updates_current_scale() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    assert!(svc.handle_line("ical:12.5", &mut hw, &mut sink));
    assert_eq!(svc.calibration().current_scale(), 12.5);
}

#[test]
fn malformed_lines_change_nothing() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    sink.clear();

    for line in ["VCAL:", "VCAL:abc", "ICAL:NaN", "RELAY:MAYBE", "REBOOT", ""] {
        assert!(!svc.handle_line(line, &mut hw, &mut sink), "{line:?}");
    }
    assert_eq!(svc.calibration().voltage_scale(), 533.6);
    assert_eq!(svc.calibration().current_scale(), 11.0);
    assert!(sink.events.is_empty());
}

#[test]
fn reset_clears_latch_regardless_of_prior_state() {
    let (mut svc, reader, mut hw, mut sink) = booted();

    // Reset with nothing latched still re-energizes.
    svc.handle_line("RELAY:OFF", &mut hw, &mut sink);
    assert_eq!(svc.relay_state(), RelayState::DeEnergized);
    svc.handle_line("RESET", &mut hw, &mut sink);
    assert_eq!(svc.relay_state(), RelayState::Energized);
    assert_eq!(sink.count(|e| *e == AppEvent::FaultCleared), 0);

    // Reset with a latched fault.
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    assert!(reader.snapshot().fault_latched);
    svc.handle_line("RESET", &mut hw, &mut sink);
    assert!(!svc.is_fault_latched());
    assert_eq!(svc.fault_flags(), 0);
    assert!(reader.snapshot().relay_energized);
    assert!(!reader.snapshot().fault_latched);
    assert_eq!(sink.count(|e| *e == AppEvent::FaultCleared), 1);
}

#[test]
fn reset_replaces_fault_status_before_next_cycle() {
    let (mut svc, reader, mut hw, mut sink) = booted();

    // Model-reported fault: no usable class to fall back on.
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    assert_eq!(reader.snapshot().status, Status::FaultLatched);
    svc.handle_line("RESET", &mut hw, &mut sink);
    assert_eq!(reader.snapshot().status, Status::Initializing);
    assert_eq!(reader.snapshot().status.as_str(), "AI INIT");

    // Overcurrent trip while the model said IDLE.
    svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    hw.set_current_amplitude(57);
    svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    assert!(reader.snapshot().fault_latched);
    svc.handle_line("RESET", &mut hw, &mut sink);
    assert_eq!(reader.snapshot().status, Status::Idle);

    // Reset with nothing latched leaves the status alone.
    svc.handle_line("RESET", &mut hw, &mut sink);
    assert_eq!(reader.snapshot().status, Status::Idle);
}

#[test]
fn manual_off_holds_until_next_normal_cycle() {
    let (mut svc, _reader, mut hw, mut sink) = booted();

    svc.handle_line("RELAY:OFF", &mut hw, &mut sink);
    assert_eq!(hw.relay_on(), Some(false));
    assert!(sink.events.contains(&AppEvent::ManualOverride(RelayState::DeEnergized)));

    svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    assert_eq!(svc.relay_state(), RelayState::Energized);
}

#[test]
fn manual_on_does_not_survive_a_latched_cycle() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);

    svc.handle_line("RELAY:ON", &mut hw, &mut sink);
    assert_eq!(svc.relay_state(), RelayState::Energized);
    assert!(svc.is_fault_latched());

    svc.tick(&mut hw, &mut ScriptedModel::idle(), &mut sink);
    assert_eq!(svc.relay_state(), RelayState::DeEnergized);
}

#[test]
fn queued_lines_are_applied_in_order() {
    let (mut svc, _reader, mut hw, mut sink) = booted();
    let channel = CommandChannel::new();

    assert!(submit_line(&channel, "VCAL:500"));
    assert!(submit_line(&channel, "bogus"));
    assert!(submit_line(&channel, "VCAL:520"));

    assert_eq!(svc.drain_commands(&channel, &mut hw, &mut sink), 3);
    assert_eq!(svc.calibration().voltage_scale(), 520.0);
    assert_eq!(svc.drain_commands(&channel, &mut hw, &mut sink), 0);
}
