//! Integration tests for the foreground display / uplink loop.

use crate::mock_hw::{fast_config, LogSink, MockAdc, RecordingDisplay, RecordingUplink, ScriptedModel};

use gridguard::adapters::mqtt::MqttUplink;
use gridguard::adapters::wifi::{ConnectivityPort, WifiAdapter};
use gridguard::app::foreground::Foreground;
use gridguard::app::service::AcquisitionService;
use gridguard::config::SystemConfig;
use gridguard::telemetry::{self, TelemetryReader};

fn foreground(uplink: RecordingUplink) -> (Foreground<RecordingDisplay, RecordingUplink>, TelemetryReader) {
    let (_writer, reader) = telemetry::shared();
    let fg = Foreground::new(
        &SystemConfig::default(),
        reader.clone(),
        RecordingDisplay::default(),
        uplink,
    );
    (fg, reader)
}

#[test]
fn display_refreshes_on_first_tick_then_on_cadence() {
    let (mut fg, _reader) = foreground(RecordingUplink::default());
    fg.tick(0);
    fg.tick(10);
    fg.tick(20);
    fg.tick(25);
    fg.tick(40);
    assert_eq!(fg.display().statuses, vec!["AI INIT"; 3]);
}

#[test]
fn uplink_is_polled_every_tick() {
    let (mut fg, _reader) = foreground(RecordingUplink::default());
    for t in [0, 5, 10] {
        fg.tick(t);
    }
    assert_eq!(fg.uplink().polls, vec![0, 5, 10]);
}

#[test]
fn publishes_every_two_seconds_while_connected() {
    let (mut fg, _reader) = foreground(RecordingUplink {
        connected: true,
        ..RecordingUplink::default()
    });
    let mut t = 0;
    while t <= 6_000 {
        fg.tick(t);
        t += 5;
    }
    assert_eq!(fg.published(), 3);
    assert_eq!(fg.uplink().published[0].3, "AI INIT");
}

#[test]
fn nothing_is_published_while_offline() {
    let (mut fg, _reader) = foreground(RecordingUplink::default());
    for t in (0..=10_000).step_by(100) {
        fg.tick(t);
    }
    assert_eq!(fg.published(), 0);
    assert_eq!(fg.failed(), 0);
}

#[test]
fn publish_errors_are_counted_not_fatal() {
    let (mut fg, _reader) = foreground(RecordingUplink {
        connected: true,
        fail_publish: true,
        ..RecordingUplink::default()
    });
    fg.tick(2_000);
    fg.tick(4_000);
    assert_eq!(fg.failed(), 2);
    assert_eq!(fg.display().statuses.len(), 2);
}

#[test]
fn display_shows_latest_acquisition_cycle() {
    let (writer, reader) = telemetry::shared();
    let mut svc = AcquisitionService::new(fast_config(), writer);
    let mut hw = MockAdc::at_rest(2048, 2048);
    let mut sink = LogSink::new();
    svc.start(&mut hw, &mut sink);

    let mut fg = Foreground::new(
        &SystemConfig::default(),
        reader,
        RecordingDisplay::default(),
        RecordingUplink::default(),
    );
    fg.tick(0);
    svc.tick(&mut hw, &mut ScriptedModel::fault(), &mut sink);
    fg.tick(20);

    assert_eq!(fg.display().statuses, vec!["AI INIT", "AI FAULT"]);
    assert_eq!(fg.display().waveform_lens, vec![0, 10]);
}

#[test]
fn mqtt_uplink_publishes_json_once_link_is_up() {
    let config = SystemConfig::default();
    let mut wifi = WifiAdapter::new(config.reconnect_interval_ms);
    wifi.set_credentials("HomeWiFi", "mysecret8").unwrap();
    wifi.connect().unwrap();

    let (_writer, reader) = telemetry::shared();
    let uplink = MqttUplink::new(&config, wifi);
    let mut fg = Foreground::new(&config, reader, RecordingDisplay::default(), uplink);

    let mut t = 0;
    while t <= 2_000 {
        fg.tick(t);
        t += 5;
    }

    let sim = fg.uplink().sim();
    assert_eq!(sim.connect_attempts, 1);
    assert_eq!(sim.published.len(), 1);
    let (topic, payload) = &sim.published[0];
    assert_eq!(topic, "gridguard/power/telemetry");
    let v: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(v["device_id"], "esp32_box_1");
    assert_eq!(v["status"], "AI INIT");
    assert_eq!(v["voltage"], 0);
}
