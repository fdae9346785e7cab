//! GridGuard Firmware: Main Entry Point
//!
//! Two execution contexts share one telemetry snapshot:
//!
//! ```text
//! ┌───────────────────────────── APP core ─────────────────────────────┐
//! │  acq task: drain commands → sample → RMS → classify → relay → pub  │
//! └──────────────────────────────────┬─────────────────────────────────┘
//!                                    │ TelemetryWriter (lock-free)
//! ┌───────────────────────────── PRO core ─────────────────────────────┐
//! │  main task: display refresh · WiFi/MQTT reconnect · publish 2 s    │
//! │  console task: stdin lines → COMMAND_CHANNEL                       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The acquisition task owns the relay outright; nothing in the network
//! path can delay a trip.

#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{bail, Result};
use log::{error, info, warn};

use gridguard::adapters::console;
use gridguard::adapters::display::LogDisplay;
use gridguard::adapters::hardware::HardwareAdapter;
use gridguard::adapters::log_sink::LogEventSink;
use gridguard::adapters::mqtt::MqttUplink;
use gridguard::adapters::time::Esp32TimeAdapter;
use gridguard::adapters::wifi::{ConnectivityPort, WifiAdapter};
use gridguard::app::commands::COMMAND_CHANNEL;
use gridguard::app::foreground::Foreground;
use gridguard::app::service::AcquisitionService;
use gridguard::config::SystemConfig;
use gridguard::drivers::relay::RelayDriver;
use gridguard::drivers::task_pin::{spawn_on_core, Core};
use gridguard::drivers::watchdog::{Watchdog, WATCHDOG_TIMEOUT_MS};
use gridguard::drivers::hw_init;
use gridguard::model::default_model;
use gridguard::telemetry;

/// Foreground loop period.
const FOREGROUND_POLL: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GridGuard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + peripherals ────────────────────────
    let config = SystemConfig::default().with_wifi(
        option_env!("GRIDGUARD_WIFI_SSID").unwrap_or(""),
        option_env!("GRIDGUARD_WIFI_PASS").unwrap_or(""),
    );
    if let Err(e) = hw_init::bring_up(&config) {
        error!("boot failed: {}", e);
        bail!(e);
    }

    // ── 3. Acquisition service ────────────────────────────────
    let (writer, reader) = telemetry::shared();
    let mut hw = HardwareAdapter::new(RelayDriver::new());
    let mut sink = LogEventSink::new();
    let mut svc = AcquisitionService::new(config.clone(), writer);
    svc.start(&mut hw, &mut sink);

    let acq_interval = Duration::from_millis(u64::from(config.acquisition_interval_ms));
    spawn_on_core(Core::App, 5, 8, "acq\0", move || {
        let mut watchdog = Watchdog::subscribe(WATCHDOG_TIMEOUT_MS);
        let mut model = default_model();
        loop {
            svc.drain_commands(&COMMAND_CHANNEL, &mut hw, &mut sink);
            svc.tick(&mut hw, &mut model, &mut sink);
            watchdog.feed();
            std::thread::sleep(acq_interval);
        }
    })?;

    // ── 4. Console commands ───────────────────────────────────
    console::spawn_stdin_reader(&COMMAND_CHANNEL)?;

    // ── 5. Network ────────────────────────────────────────────
    let mut wifi = build_wifi(&config)?;
    match wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                warn!("WiFi: {} (will retry)", e);
            }
        }
        Err(e) => warn!("WiFi disabled: {}", e),
    }
    let uplink = MqttUplink::new(&config, wifi);

    // ── 6. Foreground loop ────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut fg = Foreground::new(&config, reader, LogDisplay::new(), uplink);
    info!("System ready. Entering foreground loop.");
    loop {
        fg.tick(clock.uptime_ms());
        std::thread::sleep(FOREGROUND_POLL);
    }
}

#[cfg(target_os = "espidf")]
fn build_wifi(config: &SystemConfig) -> Result<WifiAdapter> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    Ok(WifiAdapter::new(driver, config.reconnect_interval_ms))
}

#[cfg(not(target_os = "espidf"))]
fn build_wifi(config: &SystemConfig) -> Result<WifiAdapter> {
    Ok(WifiAdapter::new(config.reconnect_interval_ms))
}
