//! Fuzz target: console command lines
//!
//! Splits arbitrary bytes into lines, pushes them through the command
//! queue into a live `AcquisitionService`, and verifies:
//! - No panics under arbitrary input
//! - Scale factors only ever hold finite values
//! - The relay pin always agrees with the controller's state
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use gridguard::app::commands::{submit_line, CommandChannel};
use gridguard::app::events::AppEvent;
use gridguard::app::ports::{EventSink, RelayPort};
use gridguard::app::service::AcquisitionService;
use gridguard::config::SystemConfig;
use gridguard::telemetry;

#[derive(Default)]
struct Pin {
    level: Option<bool>,
}

impl RelayPort for Pin {
    fn set_energized(&mut self, on: bool) {
        self.level = Some(on);
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (writer, _reader) = telemetry::shared();
    let mut svc = AcquisitionService::new(SystemConfig::default(), writer);
    let mut pin = Pin::default();
    let channel = CommandChannel::new();

    for line in text.lines() {
        if !submit_line(&channel, line) {
            svc.drain_commands(&channel, &mut pin, &mut NullSink);
            let _ = submit_line(&channel, line);
        }
    }
    svc.drain_commands(&channel, &mut pin, &mut NullSink);

    let cal = svc.calibration();
    assert!(cal.voltage_scale().is_finite());
    assert!(cal.current_scale().is_finite());
    if let Some(level) = pin.level {
        assert_eq!(level, svc.relay_state().is_energized());
    }
});
