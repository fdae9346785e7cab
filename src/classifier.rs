//! Fault classifier decision logic.
//!
//! The model itself is opaque (see [`InferenceModel`]). This module owns
//! what is done with its output: arg-max with a first-index tie-break, the
//! label table, and the hard overcurrent backstop that forces a fault
//! regardless of the model.

use crate::app::ports::InferenceModel;
use crate::error::SafetyFault;

/// Number of output classes.
pub const CLASS_COUNT: usize = 4;

/// Class index reserved for FAULT by the model's label space.
pub const FAULT_CLASS: usize = 0;

pub const IDLE_CLASS: usize = 1;
pub const LEVEL_1_CLASS: usize = 2;
pub const LEVEL_2_CLASS: usize = 3;

/// Labels in model output order.
pub const CLASS_LABELS: [&str; CLASS_COUNT] = ["FAULT", "IDLE", "LEVEL_1", "LEVEL_2"];

/// Current RMS above which a fault is forced (amps).
pub const OVERCURRENT_THRESHOLD: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub class_index: usize,
    pub probabilities: [f32; CLASS_COUNT],
}

impl ClassificationResult {
    pub fn label(&self) -> &'static str {
        label_for(self.class_index)
    }

    pub fn is_fault_class(&self) -> bool {
        self.class_index == FAULT_CLASS
    }
}

/// Outcome of combining the model decision with the overcurrent backstop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Bitmask of [`SafetyFault`]s raised this cycle; 0 means normal.
    pub faults: u8,
}

impl Verdict {
    pub fn is_fault(&self) -> bool {
        self.faults != 0
    }
}

/// Index of the largest probability. Ties go to the lowest index.
///
/// NaN entries never win a comparison, so an all-NaN vector yields 0.
pub fn argmax(probabilities: &[f32; CLASS_COUNT]) -> usize {
    let mut best = 0;
    for (idx, &p) in probabilities.iter().enumerate().skip(1) {
        if p > probabilities[best] {
            best = idx;
        }
    }
    best
}

/// Human-readable label for `class_index`; out-of-range maps to the fault label.
pub fn label_for(class_index: usize) -> &'static str {
    CLASS_LABELS
        .get(class_index)
        .copied()
        .unwrap_or(CLASS_LABELS[FAULT_CLASS])
}

/// Run the model on `[voltage, current, power]` and pick a class.
pub fn classify(
    model: &mut impl InferenceModel,
    voltage: f32,
    current: f32,
    power: f32,
) -> ClassificationResult {
    let probabilities = model.infer(&[voltage, current, power]);
    ClassificationResult {
        class_index: argmax(&probabilities),
        probabilities,
    }
}

/// Apply the fault rule: model picked FAULT, or current is over threshold.
pub fn judge(result: &ClassificationResult, current: f32) -> Verdict {
    let mut faults = 0;
    if result.is_fault_class() {
        faults |= SafetyFault::ModelFault.mask();
    }
    if current > OVERCURRENT_THRESHOLD {
        faults |= SafetyFault::Overcurrent.mask();
    }
    Verdict { faults }
}
