//! Foreground context: dashboard refresh and telemetry uplink.
//!
//! Runs on the main task, decoupled from acquisition. It only reads the
//! shared telemetry, so nothing here can stall the relay decision. Each
//! [`tick`](Foreground::tick) is non-blocking: display refresh and uplink
//! publishes are gated on their own cadences, and reconnects are delegated
//! to the uplink's own rate limiter.

use log::debug;

use crate::config::SystemConfig;
use crate::telemetry::TelemetryReader;

use super::ports::{DisplayPort, UplinkPort};

pub struct Foreground<D: DisplayPort, U: UplinkPort> {
    display: D,
    uplink: U,
    telemetry: TelemetryReader,
    display_refresh_ms: u64,
    telemetry_interval_ms: u64,
    last_refresh_ms: Option<u64>,
    last_publish_ms: u64,
    published: u32,
    failed: u32,
}

impl<D: DisplayPort, U: UplinkPort> Foreground<D, U> {
    pub fn new(config: &SystemConfig, telemetry: TelemetryReader, display: D, uplink: U) -> Self {
        Self {
            display,
            uplink,
            telemetry,
            display_refresh_ms: u64::from(config.display_refresh_ms),
            telemetry_interval_ms: u64::from(config.telemetry_interval_ms),
            last_refresh_ms: None,
            last_publish_ms: 0,
            published: 0,
            failed: 0,
        }
    }

    /// One pass of the foreground loop at uptime `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        let refresh_due = self
            .last_refresh_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.display_refresh_ms);
        if refresh_due {
            self.refresh_display();
            self.last_refresh_ms = Some(now_ms);
        }

        self.uplink.poll(now_ms);

        if now_ms.saturating_sub(self.last_publish_ms) >= self.telemetry_interval_ms {
            self.last_publish_ms = now_ms;
            self.publish();
        }
    }

    fn refresh_display(&mut self) {
        let snap = self.telemetry.snapshot();
        self.display.update_power(snap.power);
        self.display.update_current(snap.current);
        self.display.update_voltage(snap.voltage);
        self.display.update_status(snap.status.as_str());
        self.display.update_waveform(&self.telemetry.waveform());
    }

    fn publish(&mut self) {
        if !self.uplink.is_connected() {
            return;
        }
        let snap = self.telemetry.snapshot();
        match self.uplink.publish_telemetry(snap.voltage, snap.current, snap.power, snap.status.as_str()) {
            Ok(()) => self.published = self.published.wrapping_add(1),
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                debug!("Telemetry publish dropped: {}", e);
            }
        }
    }

    /// Successful publishes since boot.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Failed publishes since boot.
    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn uplink(&self) -> &U {
        &self.uplink
    }
}
