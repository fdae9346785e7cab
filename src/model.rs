//! Inference backends for the fault classifier.
//!
//! Two back-ends, selected at compile time:
//!
//! - default: [`ReferenceModel`], a current-band heuristic that mirrors the
//!   trained model's class boundaries closely enough to exercise the whole
//!   pipeline before the real network is linked.
//! - `tflite` feature: [`LinkedModel`], which calls the quantised network
//!   through a small C shim linked at build time.

use crate::app::ports::InferenceModel;
use crate::classifier::CLASS_COUNT;

/// Model back-end chosen by the build configuration.
#[cfg(not(feature = "tflite"))]
pub type DefaultModel = ReferenceModel;
#[cfg(feature = "tflite")]
pub type DefaultModel = LinkedModel;

/// Construct the build's default model.
pub fn default_model() -> DefaultModel {
    DefaultModel::new()
}

// ---------------------------------------------------------------------------
// Reference back-end
// ---------------------------------------------------------------------------

/// Current bands (amps) separating the load classes.
const LEVEL_1_MIN_A: f32 = 0.10;
const LEVEL_2_MIN_A: f32 = 0.18;
const FAULT_MIN_A: f32 = 0.30;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceModel;

impl ReferenceModel {
    pub fn new() -> Self {
        Self
    }
}

impl InferenceModel for ReferenceModel {
    fn infer(&mut self, input: &[f32; 3]) -> [f32; CLASS_COUNT] {
        let current = input[1];

        let preds = if current >= FAULT_MIN_A {
            [0.88, 0.04, 0.03, 0.05] // fault
        } else if current >= LEVEL_2_MIN_A {
            [0.06, 0.03, 0.08, 0.83] // level 2
        } else if current >= LEVEL_1_MIN_A {
            [0.03, 0.05, 0.87, 0.05] // level 1
        } else {
            [0.02, 0.94, 0.02, 0.02] // idle
        };

        log::trace!("reference model: i={:.3}A -> {:?}", current, preds);
        preds
    }
}

// ---------------------------------------------------------------------------
// Linked back-end
// ---------------------------------------------------------------------------

#[cfg(feature = "tflite")]
mod ffi {
    unsafe extern "C" {
        /// Runs the network on 3 inputs and writes 4 probabilities.
        /// Returns 0 on success.
        pub fn gridguard_model_predict(input: *const f32, output: *mut f32) -> i32;
    }
}

#[cfg(feature = "tflite")]
#[derive(Debug, Default)]
pub struct LinkedModel {
    failures: u32,
}

#[cfg(feature = "tflite")]
impl LinkedModel {
    pub fn new() -> Self {
        Self { failures: 0 }
    }

    /// Number of invocations the shim reported as failed.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(feature = "tflite")]
impl InferenceModel for LinkedModel {
    fn infer(&mut self, input: &[f32; 3]) -> [f32; CLASS_COUNT] {
        let mut out = [0.0f32; CLASS_COUNT];
        // SAFETY: both buffers are live for the call and sized as the shim expects.
        let rc = unsafe { ffi::gridguard_model_predict(input.as_ptr(), out.as_mut_ptr()) };
        if rc != 0 {
            self.failures = self.failures.saturating_add(1);
            log::error!("model: invoke failed (rc={})", rc);
            // All-zero output: arg-max resolves to the fault class.
            return [0.0; CLASS_COUNT];
        }
        out
    }
}
