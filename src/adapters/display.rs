//! Log-backed dashboard adapter.
//!
//! Stands in for the panel driver: keeps the last values it was given and
//! logs the status line when it changes. Rendering, layout and the panel
//! bring-up live outside this crate.

use log::{info, trace};

use crate::app::ports::DisplayPort;
use crate::sensors::sampler::Waveform;

#[derive(Debug, Default)]
pub struct LogDisplay {
    power: f32,
    current: f32,
    voltage: f32,
    status: heapless::String<32>,
    waveform: Waveform,
    refreshes: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn readings(&self) -> (f32, f32, f32) {
        (self.voltage, self.current, self.power)
    }

    pub fn waveform(&self) -> &[u16] {
        &self.waveform
    }

    /// Number of waveform redraws, one per refresh.
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }
}

impl DisplayPort for LogDisplay {
    fn update_power(&mut self, watts: f32) {
        self.power = watts;
    }

    fn update_current(&mut self, amps: f32) {
        self.current = amps;
    }

    fn update_voltage(&mut self, volts: f32) {
        self.voltage = volts;
    }

    fn update_status(&mut self, status: &str) {
        if self.status.as_str() != status {
            info!("DISPLAY | status: {}", status);
            self.status.clear();
            for ch in status.chars() {
                if self.status.push(ch).is_err() {
                    break;
                }
            }
        }
    }

    fn update_waveform(&mut self, points: &[u16]) {
        self.waveform.clear();
        let n = points.len().min(self.waveform.capacity());
        // Length bounded by capacity above.
        let _ = self.waveform.extend_from_slice(&points[..n]);
        self.refreshes = self.refreshes.wrapping_add(1);
        trace!(
            "DISPLAY | {:.1}V {:.3}A {:.1}W, {} waveform points",
            self.voltage,
            self.current,
            self.power,
            n
        );
    }
}
