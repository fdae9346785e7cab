//! MQTT telemetry uplink.
//!
//! Implements [`UplinkPort`] on top of any [`ConnectivityPort`] link.
//! Publishes one JSON record per call to the telemetry topic:
//!
//! ```json
//! {"device_id":"esp32_box_1","voltage":231,"current":0.21,"power":48.6,"status":"LEVEL_2"}
//! ```
//!
//! `voltage` is truncated to an integer; the other readings are sent as-is.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with a connection flag
//!   maintained from the client's event callback. Publishes are enqueued,
//!   never awaited.
//! - **all other targets**: an in-memory broker that records payloads.
//!
//! Broker connects are rate-limited to one attempt per reconnect interval
//! and only tried while the link is up.

use log::{info, warn};
use serde::Serialize;

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::UplinkPort;
use crate::config::SystemConfig;
use crate::error::CommsError;

use super::utils::ReconnectGate;
use super::wifi::ConnectivityPort;

// ───────────────────────────────────────────────────────────────
// Payload
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TelemetryPayload<'a> {
    pub device_id: &'a str,
    pub voltage: i32,
    pub current: f32,
    pub power: f32,
    pub status: &'a str,
}

/// Encode one telemetry record as JSON.
pub fn encode_telemetry(
    device_id: &str,
    voltage: f32,
    current: f32,
    power: f32,
    status: &str,
) -> Result<String, CommsError> {
    let payload = TelemetryPayload {
        device_id,
        // Truncates toward zero; NaN becomes 0.
        voltage: voltage as i32,
        current,
        power,
        status,
    };
    serde_json::to_string(&payload).map_err(|_| CommsError::PayloadEncodeFailed)
}

// ───────────────────────────────────────────────────────────────
// Uplink
// ───────────────────────────────────────────────────────────────

pub struct MqttUplink<L: ConnectivityPort> {
    link: L,
    broker_url: heapless::String<64>,
    topic: heapless::String<64>,
    device_id: heapless::String<32>,
    gate: ReconnectGate,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    reconnect_interval_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// Simulation: an in-memory broker.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct SimBroker {
    pub available: bool,
    pub connected: bool,
    pub connect_attempts: u32,
    pub published: Vec<(String, String)>,
}

impl<L: ConnectivityPort> MqttUplink<L> {
    pub fn new(config: &SystemConfig, link: L) -> Self {
        Self {
            link,
            broker_url: config.mqtt_broker_url.clone(),
            topic: config.mqtt_topic.clone(),
            device_id: config.device_id.clone(),
            gate: ReconnectGate::new(u64::from(config.reconnect_interval_ms)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            reconnect_interval_ms: config.reconnect_interval_ms,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                available: true,
                connected: false,
                connect_attempts: 0,
                published: Vec::new(),
            },
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim(&self) -> &SimBroker {
        &self.sim
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_mut(&mut self) -> &mut SimBroker {
        &mut self.sim
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};

        if self.client.is_some() {
            // The IDF client retries on its own once created.
            return Ok(());
        }

        let conf = MqttClientConfiguration {
            client_id: Some(self.device_id.as_str()),
            reconnect_timeout: Some(core::time::Duration::from_millis(u64::from(
                self.reconnect_interval_ms,
            ))),
            ..Default::default()
        };
        let flag = self.connected.clone();
        let client = EspMqttClient::new_cb(self.broker_url.as_str(), &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => flag.store(true, Ordering::Release),
                EventPayload::Disconnected => flag.store(false, Ordering::Release),
                _ => {}
            }
        })
        .map_err(|_| CommsError::MqttConnectFailed)?;
        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        self.sim.connect_attempts += 1;
        if self.sim.available {
            self.sim.connected = true;
            Ok(())
        } else {
            Err(CommsError::MqttConnectFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.connected && self.sim.available
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, payload: &str) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(CommsError::MqttDisconnected)?;
        client
            .enqueue(self.topic.as_str(), QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, payload: &str) -> Result<(), CommsError> {
        self.sim
            .published
            .push((self.topic.as_str().to_owned(), payload.to_owned()));
        Ok(())
    }
}

impl<L: ConnectivityPort> UplinkPort for MqttUplink<L> {
    fn poll(&mut self, now_ms: u64) {
        self.link.poll(now_ms);
        if !self.link.is_connected() || self.platform_is_connected() {
            return;
        }
        if self.gate.should_attempt(now_ms) {
            info!("MQTT: connecting to {}", self.broker_url);
            match self.platform_connect() {
                Ok(()) => info!("MQTT: client started"),
                Err(e) => warn!("MQTT: {}", e),
            }
        }
    }

    fn publish_telemetry(
        &mut self,
        voltage: f32,
        current: f32,
        power: f32,
        status: &str,
    ) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::MqttDisconnected);
        }
        let payload = encode_telemetry(&self.device_id, voltage, current, power, status)?;
        self.platform_publish(&payload)
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected() && self.platform_is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_expected_fields() {
        let json = encode_telemetry("esp32_box_1", 231.9, 0.25, 57.975, "LEVEL_2").unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["device_id"], "esp32_box_1");
        assert_eq!(v["voltage"], 231);
        assert_eq!(v["status"], "LEVEL_2");
        assert!((v["current"].as_f64().unwrap() - 0.25).abs() < 1e-6);
        assert!((v["power"].as_f64().unwrap() - 57.975).abs() < 1e-3);
    }

    #[test]
    fn voltage_truncates_toward_zero() {
        let json = encode_telemetry("d", 0.99, 0.0, 0.0, "IDLE").unwrap();
        assert!(json.contains("\"voltage\":0"));
        let json = encode_telemetry("d", f32::NAN, 0.0, 0.0, "IDLE").unwrap();
        assert!(json.contains("\"voltage\":0"));
    }
}
