//! Inbound commands to the application service.
//!
//! Commands arrive as text lines on the control channel (serial console in
//! the field). Lines are queued on a bounded channel by whatever transport
//! reads them and are parsed and applied inside the acquisition cycle, so
//! calibration and latch state only ever have one writer.
//!
//! | Line          | Command                         |
//! |---------------|---------------------------------|
//! | `VCAL:<f32>`  | replace the voltage scale       |
//! | `ICAL:<f32>`  | replace the current scale       |
//! | `RELAY:ON`    | force the relay on              |
//! | `RELAY:OFF`   | force the relay off             |
//! | `RESET`       | clear the latched fault, relay on |
//!
//! Keywords are case-insensitive. Anything else, including a numeric
//! payload that does not parse to a finite number, is ignored.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Longest accepted command line; longer lines are dropped.
pub const MAX_LINE_LEN: usize = 64;

/// Channel depth for queued command lines.
const COMMAND_DEPTH: usize = 8;

/// One raw command line.
pub type CommandLine = heapless::String<MAX_LINE_LEN>;

/// Bounded line queue: console reader → acquisition task.
pub type CommandChannel = Channel<CriticalSectionRawMutex, CommandLine, COMMAND_DEPTH>;

/// The firmware's control channel.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    SetVoltageScale(f32),
    SetCurrentScale(f32),
    /// Energize regardless of the fault latch.
    ForceRelayOn,
    /// De-energize regardless of the classifier.
    ForceRelayOff,
    /// Clear the fault latch and energize.
    Reset,
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn parse_scale(payload: &str) -> Option<f32> {
    payload.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

impl AppCommand {
    /// Parse one control line. Returns `None` for anything unrecognised.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        if let Some(payload) = strip_prefix_ignore_case(line, "VCAL:") {
            return parse_scale(payload).map(Self::SetVoltageScale);
        }
        if let Some(payload) = strip_prefix_ignore_case(line, "ICAL:") {
            return parse_scale(payload).map(Self::SetCurrentScale);
        }
        if line.eq_ignore_ascii_case("RELAY:ON") {
            return Some(Self::ForceRelayOn);
        }
        if line.eq_ignore_ascii_case("RELAY:OFF") {
            return Some(Self::ForceRelayOff);
        }
        if line.eq_ignore_ascii_case("RESET") {
            return Some(Self::Reset);
        }
        None
    }
}

/// Queue a line on `channel`. Returns `false` if it was too long or the
/// queue is full.
pub fn submit_line(channel: &CommandChannel, line: &str) -> bool {
    let Ok(buf) = CommandLine::try_from(line.trim()) else {
        log::debug!("command line too long ({} bytes), dropped", line.len());
        return false;
    };
    channel.try_send(buf).is_ok()
}
