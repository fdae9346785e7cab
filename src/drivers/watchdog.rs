//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the *calling* task to the TWDT, so construct it from inside
//! the task that must be supervised. The acquisition task feeds it once per
//! cycle; a stalled cycle resets the device.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Default supervision window.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    feeds: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::subscribe(WATCHDOG_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Subscribe the current task with a `timeout_ms` window.
    pub fn subscribe(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed, feeds: 0 }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op ({}ms)", timeout_ms);
            Self { feeds: 0 }
        }
    }

    /// Feed the watchdog. Must be called at least once per timeout window.
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }

    /// Feeds since subscription.
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
