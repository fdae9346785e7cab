//! Shared telemetry state: one writer, many readers, no locks.
//!
//! The acquisition task owns the only [`TelemetryWriter`]. Display and
//! uplink code hold cloned [`TelemetryReader`]s. Every field is an
//! individual atomic, so a read never tears a single value but may mix
//! fields from two adjacent cycles. Readers accept up to one cycle of
//! staleness.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;

use crate::classifier::{CLASS_LABELS, FAULT_CLASS, IDLE_CLASS, LEVEL_1_CLASS, LEVEL_2_CLASS};
use crate::sensors::sampler::{Waveform, WAVEFORM_CAPACITY};

// ───────────────────────────────────────────────────────────────
// Status vocabulary
// ───────────────────────────────────────────────────────────────

/// Status line shown on the dashboard and sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Boot finished, no cycle has run yet.
    Initializing = 0,
    Idle = 1,
    Level1 = 2,
    Level2 = 3,
    /// A fault was latched this cycle.
    AiFault = 4,
    /// Latched fault; classification is skipped.
    FaultLatched = 5,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "AI INIT",
            Self::Idle => CLASS_LABELS[IDLE_CLASS],
            Self::Level1 => CLASS_LABELS[LEVEL_1_CLASS],
            Self::Level2 => CLASS_LABELS[LEVEL_2_CLASS],
            Self::AiFault => "AI FAULT",
            Self::FaultLatched => "FAULT: OC",
        }
    }

    /// Status for a classifier class index.
    pub const fn from_class(class_index: usize) -> Self {
        match class_index {
            FAULT_CLASS => Self::AiFault,
            IDLE_CLASS => Self::Idle,
            LEVEL_1_CLASS => Self::Level1,
            LEVEL_2_CLASS => Self::Level2,
            _ => Self::AiFault,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Initializing,
            1 => Self::Idle,
            2 => Self::Level1,
            3 => Self::Level2,
            4 => Self::AiFault,
            _ => Self::FaultLatched,
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Snapshot
// ───────────────────────────────────────────────────────────────

/// Point-in-time view of the published values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub voltage: f32,
    pub current: f32,
    pub power: f32,
    pub status: Status,
    pub fault_latched: bool,
    pub relay_energized: bool,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            voltage: 0.0,
            current: 0.0,
            power: 0.0,
            status: Status::Initializing,
            fault_latched: false,
            relay_energized: true,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared cells
// ───────────────────────────────────────────────────────────────

struct Cells {
    voltage: AtomicU32,
    current: AtomicU32,
    power: AtomicU32,
    status: AtomicU8,
    fault_latched: AtomicBool,
    relay_energized: AtomicBool,
    wave: [AtomicU16; WAVEFORM_CAPACITY],
    wave_len: AtomicU8,
}

impl Cells {
    fn new() -> Self {
        let init = TelemetrySnapshot::default();
        Self {
            voltage: AtomicU32::new(init.voltage.to_bits()),
            current: AtomicU32::new(init.current.to_bits()),
            power: AtomicU32::new(init.power.to_bits()),
            status: AtomicU8::new(init.status as u8),
            fault_latched: AtomicBool::new(init.fault_latched),
            relay_energized: AtomicBool::new(init.relay_energized),
            wave: core::array::from_fn(|_| AtomicU16::new(0)),
            wave_len: AtomicU8::new(0),
        }
    }
}

/// Create the writer / reader pair.
pub fn shared() -> (TelemetryWriter, TelemetryReader) {
    let cells = Arc::new(Cells::new());
    (
        TelemetryWriter { cells: cells.clone() },
        TelemetryReader { cells },
    )
}

/// Sole writer. Not `Clone`.
pub struct TelemetryWriter {
    cells: Arc<Cells>,
}

impl TelemetryWriter {
    pub fn publish(&self, snap: &TelemetrySnapshot) {
        let c = &self.cells;
        c.voltage.store(snap.voltage.to_bits(), Ordering::Relaxed);
        c.current.store(snap.current.to_bits(), Ordering::Relaxed);
        c.power.store(snap.power.to_bits(), Ordering::Relaxed);
        c.fault_latched.store(snap.fault_latched, Ordering::Relaxed);
        c.relay_energized.store(snap.relay_energized, Ordering::Relaxed);
        c.status.store(snap.status as u8, Ordering::Release);
    }

    pub fn set_status(&self, status: Status) {
        self.cells.status.store(status as u8, Ordering::Release);
    }

    /// Overwrite the waveform view. Extra points beyond capacity are dropped.
    pub fn publish_waveform(&self, points: &[u16]) {
        let n = points.len().min(WAVEFORM_CAPACITY);
        for (cell, &p) in self.cells.wave.iter().zip(&points[..n]) {
            cell.store(p, Ordering::Relaxed);
        }
        self.cells.wave_len.store(n as u8, Ordering::Release);
    }

    /// A reader attached to the same cells.
    pub fn reader(&self) -> TelemetryReader {
        TelemetryReader {
            cells: self.cells.clone(),
        }
    }
}

/// Read handle for display and uplink consumers.
#[derive(Clone)]
pub struct TelemetryReader {
    cells: Arc<Cells>,
}

impl TelemetryReader {
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let c = &self.cells;
        let status = Status::from_u8(c.status.load(Ordering::Acquire));
        TelemetrySnapshot {
            voltage: f32::from_bits(c.voltage.load(Ordering::Relaxed)),
            current: f32::from_bits(c.current.load(Ordering::Relaxed)),
            power: f32::from_bits(c.power.load(Ordering::Relaxed)),
            status,
            fault_latched: c.fault_latched.load(Ordering::Relaxed),
            relay_energized: c.relay_energized.load(Ordering::Relaxed),
        }
    }

    pub fn status(&self) -> Status {
        Status::from_u8(self.cells.status.load(Ordering::Acquire))
    }

    pub fn waveform(&self) -> Waveform {
        let n = usize::from(self.cells.wave_len.load(Ordering::Acquire)).min(WAVEFORM_CAPACITY);
        self.cells.wave[..n]
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }
}
