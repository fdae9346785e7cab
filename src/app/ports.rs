//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AcquisitionService / Foreground
//! ```
//!
//! Driven adapters (ADC, relay, model, event sink, display, uplink)
//! implement these traits. The domain core consumes them via generics, so
//! it never touches hardware directly and runs unchanged under host tests.

use embedded_hal::delay::DelayNs;

use crate::error::CommsError;
use crate::sensors::AdcChannel;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw ADC access plus the micro-delay used to pace conversions.
///
/// Pacing is part of the port so that host tests can replace the busy
/// wait with a no-op.
pub trait SensorPort: DelayNs {
    /// One 12-bit conversion on `channel`.
    fn read_raw(&mut self, channel: AdcChannel) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Load relay output. `true` energizes the load.
///
/// Implementations drive the pin unconditionally; idempotence is handled
/// by [`RelayController`](crate::safety::RelayController).
pub trait RelayPort {
    fn set_energized(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Inference port (driven adapter: domain → model backend)
// ───────────────────────────────────────────────────────────────

/// Opaque classifier model: `[voltage, current, power]` in, one
/// probability per class out.
pub trait InferenceModel {
    fn infer(&mut self, input: &[f32; 3]) -> [f32; crate::classifier::CLASS_COUNT];
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Display port (foreground consumer)
// ───────────────────────────────────────────────────────────────

/// Dashboard collaborator. Rendering and layout belong to the adapter.
pub trait DisplayPort {
    fn update_power(&mut self, watts: f32);
    fn update_current(&mut self, amps: f32);
    fn update_voltage(&mut self, volts: f32);
    fn update_status(&mut self, status: &str);
    fn update_waveform(&mut self, points: &[u16]);
}

// ───────────────────────────────────────────────────────────────
// Uplink port (foreground consumer)
// ───────────────────────────────────────────────────────────────

/// Network collaborator. Owns connection lifecycle and payload encoding.
pub trait UplinkPort {
    /// Drive reconnect attempts. Must return promptly.
    fn poll(&mut self, now_ms: u64);

    /// Publish one telemetry record.
    fn publish_telemetry(
        &mut self,
        voltage: f32,
        current: f32,
        power: f32,
        status: &str,
    ) -> Result<(), CommsError>;

    fn is_connected(&self) -> bool;
}
