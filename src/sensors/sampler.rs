//! Windowed raw sampling of the voltage and current channels.
//!
//! Conversions are paced by a fixed micro-delay between reads, which
//! approximates a timer-driven ADC closely enough for 50 Hz mains at the
//! window sizes used here.
//!
//! The current window is aligned to a zero crossing before capture. The
//! alignment is best effort: when no crossing shows up within the timeout
//! the window is captured unaligned.

use std::time::Duration;

use crate::app::ports::SensorPort;

use super::deadline::Deadline;
use super::AdcChannel;

/// Keep one of every `WAVEFORM_DECIMATION` current samples for display.
pub const WAVEFORM_DECIMATION: usize = 20;
/// Maximum points retained for the waveform view.
pub const WAVEFORM_CAPACITY: usize = 50;

/// Decimated current samples for the dashboard.
pub type Waveform = heapless::Vec<u16, WAVEFORM_CAPACITY>;

/// Raw codes for one channel over one estimation cycle.
///
/// The backing buffer is reused across cycles so the acquisition task does
/// not allocate in steady state.
#[derive(Debug, Default)]
pub struct SampleWindow {
    codes: Vec<u16>,
}

impl SampleWindow {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            codes: Vec::with_capacity(n),
        }
    }

    pub fn from_codes(codes: Vec<u16>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn clear(&mut self) {
        self.codes.clear();
    }

    fn push(&mut self, code: u16) {
        self.codes.push(code);
    }
}

/// Capture `n` voltage codes, `interval_us` apart.
pub fn sample_voltage(
    hw: &mut impl SensorPort,
    n: usize,
    interval_us: u32,
    window: &mut SampleWindow,
) {
    window.clear();
    for _ in 0..n {
        window.push(hw.read_raw(AdcChannel::Voltage));
        hw.delay_us(interval_us);
    }
}

/// Wait for the current signal to dip below `zero` and come back up.
///
/// Both phases share one deadline. Returns `false` if it expired first.
pub fn align_to_zero_crossing(hw: &mut impl SensorPort, zero: u16, timeout: Duration) -> bool {
    let deadline = Deadline::after(timeout);
    deadline.wait_until(|| hw.read_raw(AdcChannel::Current) < zero)
        && deadline.wait_until(|| hw.read_raw(AdcChannel::Current) >= zero)
}

/// Capture `n` current codes after zero-crossing alignment.
///
/// Every [`WAVEFORM_DECIMATION`]th code is also pushed into `waveform`
/// until it is full. Returns whether the alignment succeeded.
pub fn sample_current(
    hw: &mut impl SensorPort,
    n: usize,
    interval_us: u32,
    zero: u16,
    timeout: Duration,
    window: &mut SampleWindow,
    waveform: &mut Waveform,
) -> bool {
    let aligned = align_to_zero_crossing(hw, zero, timeout);
    if !aligned {
        log::trace!("sampler: no current zero crossing within {:?}", timeout);
    }

    window.clear();
    waveform.clear();
    for k in 0..n {
        let code = hw.read_raw(AdcChannel::Current);
        window.push(code);
        if k % WAVEFORM_DECIMATION == 0 && !waveform.is_full() {
            // Capacity checked above.
            let _ = waveform.push(code);
        }
        hw.delay_us(interval_us);
    }
    aligned
}
