//! Relay safety controller and latched-fault supervisor.
//!
//! Two pieces of state, deliberately kept apart:
//!
//! - [`RelayController`] tracks the physical relay. Requests to enter the
//!   current state are no-ops; only real transitions drive the pin and
//!   emit a status event.
//! - [`SafetySupervisor`] holds the sticky fault bitmask. Once a fault is
//!   latched the acquisition loop forces the relay off every cycle and
//!   skips classification until an explicit clear.
//!
//! ## Fault lifecycle
//!
//! 1. The classifier verdict (model FAULT class or overcurrent) latches one
//!    or more [`SafetyFault`] bits.
//! 2. Each following cycle sees `is_latched()` and de-energizes.
//! 3. Nothing clears the latch except [`SafetySupervisor::clear`], called
//!    from the RESET command. There is no timeout.

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RelayPort};
use crate::error::SafetyFault;

// ───────────────────────────────────────────────────────────────
// Relay controller
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Energized,
    DeEnergized,
}

impl RelayState {
    pub fn is_energized(self) -> bool {
        self == Self::Energized
    }
}

/// Idempotent relay actuator.
///
/// Starts de-energized in software so that [`boot`](Self::boot) produces
/// exactly one transition to the energized default.
#[derive(Debug)]
pub struct RelayController {
    state: RelayState,
}

impl Default for RelayController {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayController {
    pub fn new() -> Self {
        Self {
            state: RelayState::DeEnergized,
        }
    }

    /// Drive the boot default: service restored.
    pub fn boot(&mut self, hw: &mut impl RelayPort, sink: &mut impl EventSink) {
        self.request_on(hw, sink);
    }

    /// Energize the load. Returns `true` if this was a transition.
    pub fn request_on(&mut self, hw: &mut impl RelayPort, sink: &mut impl EventSink) -> bool {
        self.transition(RelayState::Energized, hw, sink)
    }

    /// De-energize the load. Returns `true` if this was a transition.
    pub fn request_off(&mut self, hw: &mut impl RelayPort, sink: &mut impl EventSink) -> bool {
        self.transition(RelayState::DeEnergized, hw, sink)
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    fn transition(
        &mut self,
        target: RelayState,
        hw: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state == target {
            return false;
        }
        hw.set_energized(target.is_energized());
        self.state = target;
        sink.emit(&AppEvent::RelayChanged(target));
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Safety supervisor
// ───────────────────────────────────────────────────────────────

/// Sticky fault latch.
#[derive(Debug, Default)]
pub struct SafetySupervisor {
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self { faults: 0 }
    }

    /// OR `mask` into the latch. Returns `true` if the latch was clear before.
    pub fn latch(&mut self, mask: u8) -> bool {
        let was_clear = self.faults == 0;
        for fault in [SafetyFault::ModelFault, SafetyFault::Overcurrent] {
            if mask & fault.mask() != 0 && self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
        }
        self.faults |= mask;
        was_clear && mask != 0
    }

    /// Operator acknowledgement. Returns `true` if anything was latched.
    pub fn clear(&mut self) -> bool {
        let had = self.faults != 0;
        if had {
            info!("SAFETY FAULT CLEARED: flags=0b{:08b}", self.faults);
        }
        self.faults = 0;
        had
    }

    pub fn is_latched(&self) -> bool {
        self.faults != 0
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Check if a specific fault is latched.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }
}
