//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the relay driver and the ADC pacing delay, exposing them through
//! [`SensorPort`] and [`RelayPort`]. This is the only module in the system
//! that touches actual hardware. On non-espidf targets the underlying
//! drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::app::ports::{RelayPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::relay::RelayDriver;
use crate::error::SensorError;
use crate::pins;
use crate::sensors::AdcChannel;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    relay: RelayDriver,
    /// Last successful code per channel, indexed by [`channel_slot`].
    last_good: [u16; 2],
    read_failures: u32,
    failing: bool,
    #[cfg(target_os = "espidf")]
    delay: esp_idf_svc::hal::delay::Ets,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new(RelayDriver::new())
    }
}

impl HardwareAdapter {
    pub fn new(relay: RelayDriver) -> Self {
        Self {
            relay,
            last_good: [pins::ADC_MIDSCALE; 2],
            read_failures: 0,
            failing: false,
            #[cfg(target_os = "espidf")]
            delay: esp_idf_svc::hal::delay::Ets,
        }
    }

    pub fn relay(&self) -> &RelayDriver {
        &self.relay
    }

    /// Conversions that failed since boot.
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    /// A failed conversion repeats the channel's last good code.
    fn resolve(&mut self, channel: AdcChannel, read: Result<u16, SensorError>) -> u16 {
        let slot = channel_slot(channel);
        match read {
            Ok(code) => {
                self.failing = false;
                self.last_good[slot] = code;
                code
            }
            Err(e) => {
                self.read_failures = self.read_failures.saturating_add(1);
                if !self.failing {
                    self.failing = true;
                    warn!("ADC {:?}: {} (holding last code)", channel, crate::error::Error::from(e));
                }
                self.last_good[slot]
            }
        }
    }
}

const fn channel_slot(channel: AdcChannel) -> usize {
    match channel {
        AdcChannel::Voltage => 0,
        AdcChannel::Current => 1,
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl DelayNs for HardwareAdapter {
    /// Busy-wait; sample pacing is in the tens of microseconds.
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

impl SensorPort for HardwareAdapter {
    fn read_raw(&mut self, channel: AdcChannel) -> u16 {
        let read = hw_init::adc1_read(channel.adc1_channel());
        self.resolve(channel, read)
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl RelayPort for HardwareAdapter {
    fn set_energized(&mut self, on: bool) {
        self.relay.set(on);
    }
}
