//! Serial console command reader.
//!
//! Reads newline-delimited control lines from a byte stream (stdin, which
//! ESP-IDF maps to the UART / USB-CDC console) and queues them on the
//! command channel for the acquisition task. Parsing happens on the
//! acquisition side; this adapter only frames lines.

use std::io::{BufRead, ErrorKind, Read};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};

use crate::app::commands::{submit_line, CommandChannel, MAX_LINE_LEN};

/// Back-off when a non-blocking console has no data yet.
const IDLE_POLL: Duration = Duration::from_millis(20);

/// Bytes buffered per line: the longest command plus CR LF.
const READ_LIMIT: usize = MAX_LINE_LEN + 2;

/// Forward every line from `reader` to `channel` until EOF.
/// Returns the number of lines queued.
///
/// At most [`READ_LIMIT`] bytes are held at a time. Longer lines are
/// skipped up to their newline, and lines that are not UTF-8 are dropped.
/// Neither stops the pump.
pub fn pump_lines(mut reader: impl BufRead, channel: &CommandChannel) -> usize {
    let mut queued = 0;
    let mut buf: Vec<u8> = Vec::with_capacity(READ_LIMIT);
    let mut overlong = false;
    loop {
        let room = (READ_LIMIT - buf.len()) as u64;
        match reader.by_ref().take(room).read_until(b'\n', &mut buf) {
            Ok(_) if buf.last() == Some(&b'\n') => {
                if overlong {
                    overlong = false;
                    debug!("console: dropped overlong line");
                } else if queue_bytes(&buf, channel) {
                    queued += 1;
                }
                buf.clear();
            }
            Ok(_) if buf.len() == READ_LIMIT => {
                overlong = true;
                buf.clear();
            }
            Ok(_) => {
                // EOF, possibly after a final unterminated line.
                if !overlong && queue_bytes(&buf, channel) {
                    queued += 1;
                }
                return queued;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                std::thread::sleep(IDLE_POLL);
            }
            Err(e) => {
                warn!("console: read failed: {}", e);
                return queued;
            }
        }
    }
}

fn queue_bytes(bytes: &[u8], channel: &CommandChannel) -> bool {
    let Ok(text) = core::str::from_utf8(bytes) else {
        debug!("console: dropped non-UTF-8 line ({} bytes)", bytes.len());
        return false;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if submit_line(channel, trimmed) {
        true
    } else {
        debug!("console: dropped line {:?}", trimmed);
        false
    }
}

/// Spawn a thread that pumps stdin into `channel` for the process lifetime.
pub fn spawn_stdin_reader(channel: &'static CommandChannel) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4 * 1024)
        .spawn(move || {
            let n = pump_lines(std::io::stdin().lock(), channel);
            debug!("console: stdin closed after {} lines", n);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn forwards_trimmed_non_empty_lines() {
        let ch = CommandChannel::new();
        let input = Cursor::new("VCAL:540\r\n\n  RESET  \nRELAY:OFF");
        assert_eq!(pump_lines(input, &ch), 3);
        assert_eq!(ch.try_receive().unwrap().as_str(), "VCAL:540");
        assert_eq!(ch.try_receive().unwrap().as_str(), "RESET");
        assert_eq!(ch.try_receive().unwrap().as_str(), "RELAY:OFF");
        assert!(ch.try_receive().is_err());
    }

    #[test]
    fn overlong_lines_are_dropped() {
        let ch = CommandChannel::new();
        let long = format!("{}\nRESET\n", "A".repeat(200));
        assert_eq!(pump_lines(Cursor::new(long), &ch), 1);
        assert_eq!(ch.try_receive().unwrap().as_str(), "RESET");
    }

    #[test]
    fn line_noise_does_not_stop_the_pump() {
        let ch = CommandChannel::new();
        let input: &[u8] = b"VCAL:540\n\xff\xfe noise\nRESET\n";
        assert_eq!(pump_lines(Cursor::new(input), &ch), 2);
        assert_eq!(ch.try_receive().unwrap().as_str(), "VCAL:540");
        assert_eq!(ch.try_receive().unwrap().as_str(), "RESET");
    }

    #[test]
    fn newline_free_flood_is_skipped() {
        let ch = CommandChannel::new();
        let mut input = vec![0x55u8; 10_000];
        input.extend_from_slice(b"\nRESET");
        assert_eq!(pump_lines(Cursor::new(input), &ch), 1);
        assert_eq!(ch.try_receive().unwrap().as_str(), "RESET");
    }

    /// Hands out its chunks one read at a time, with `WouldBlock` between.
    struct Trickle {
        chunks: Vec<&'static [u8]>,
        stalled: bool,
    }

    impl std::io::Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            if !self.stalled {
                self.stalled = true;
                return Err(ErrorKind::WouldBlock.into());
            }
            self.stalled = false;
            let chunk = self.chunks.remove(0);
            out[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn partial_line_survives_would_block() {
        let ch = CommandChannel::new();
        let reader = std::io::BufReader::new(Trickle {
            chunks: vec![&b"RES"[..], &b"ET\n"[..]],
            stalled: false,
        });
        assert_eq!(pump_lines(reader, &ch), 1);
        assert_eq!(ch.try_receive().unwrap().as_str(), "RESET");
    }
}
