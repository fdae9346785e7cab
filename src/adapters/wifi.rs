//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the link layer underneath the MQTT
//! uplink.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! Connect requests are fire-and-forget; the link state is observed on the
//! next [`poll`](ConnectivityPort::poll). While the link is down a new
//! attempt is issued at most once per fixed reconnect interval, so the
//! foreground loop is never held up waiting for an access point.

use core::fmt;
use log::{info, warn};

use super::utils::{is_printable_ascii, ReconnectGate};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<ConnectivityError> for crate::error::CommsError {
    fn from(_: ConnectivityError) -> Self {
        Self::WifiConnectFailed
    }
}

pub trait ConnectivityPort {
    /// Start the first connection attempt.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn is_connected(&self) -> bool;
    /// Observe link state and retry if due. Never blocks.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    gate: ReconnectGate,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    driver: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: whether an access point is reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_ap_available: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(driver: esp_idf_svc::wifi::EspWifi<'static>, reconnect_interval_ms: u32) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            gate: ReconnectGate::new(u64::from(reconnect_interval_ms)),
            attempts: 0,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(reconnect_interval_ms: u32) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            gate: ReconnectGate::new(u64::from(reconnect_interval_ms)),
            attempts: 0,
            sim_ap_available: true,
            sim_link_up: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Connection attempts issued since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Simulation: make the access point (un)reachable. Dropping it also
    /// drops an established link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_ap_available(&mut self, available: bool) {
        self.sim_ap_available = available;
        if !available {
            self.sim_link_up = false;
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.driver
            .set_configuration(&cfg)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.driver.start().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), ConnectivityError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        // Non-blocking: the association completes in the IDF event task.
        self.driver.connect().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_ap_available {
            self.sim_link_up = true;
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    fn attempt(&mut self) {
        self.attempts = self.attempts.wrapping_add(1);
        match self.platform_connect() {
            Ok(()) => self.state = WifiState::Connecting,
            Err(e) => {
                warn!("WiFi: connect attempt {} failed: {}", self.attempts, e);
                self.state = WifiState::Disconnected;
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_start()?;
        // Count the initial attempt against the reconnect interval.
        self.gate.reset();
        let _ = self.gate.should_attempt(0);
        self.attempt();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    fn poll(&mut self, now_ms: u64) {
        let link_up = self.platform_is_connected();
        match (self.state, link_up) {
            (WifiState::Connected, true) => {}
            (_, true) => {
                info!("WiFi: connected to '{}'", self.ssid);
                self.state = WifiState::Connected;
            }
            (WifiState::Connected, false) => {
                warn!("WiFi: connection lost");
                self.state = WifiState::Disconnected;
            }
            (_, false) => {}
        }

        if self.state != WifiState::Connected
            && !self.ssid.is_empty()
            && self.gate.should_attempt(now_ms)
        {
            info!("WiFi: not connected, reconnecting");
            self.attempt();
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
