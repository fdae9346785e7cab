//! Load relay driver (NPN transistor stage on GPIO 40).
//!
//! The transistor inverts: a HIGH base drive pulls the coil low and closes
//! the contact. [`pins::RELAY_ENERGIZED_LEVEL`] captures that polarity so
//! callers only ever speak in energized / de-energized terms.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO configured by hw_init.
//! On host/test: tracks the level in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct RelayDriver {
    gpio: i32,
    energized: bool,
}

impl Default for RelayDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayDriver {
    pub fn new() -> Self {
        Self {
            gpio: pins::RELAY_GPIO,
            energized: false,
        }
    }

    /// Drive the pin. Always writes, even if the level is unchanged.
    pub fn set(&mut self, energized: bool) {
        let level = if energized {
            pins::RELAY_ENERGIZED_LEVEL
        } else {
            !pins::RELAY_ENERGIZED_LEVEL
        };
        hw_init::gpio_write(self.gpio, level);
        self.energized = energized;
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }

    /// GPIO level currently driven.
    pub fn level(&self) -> bool {
        self.energized == pins::RELAY_ENERGIZED_LEVEL
    }
}
