//! Knob-layer error types.

use thiserror::Error;

/// Failures in calibration loading and knob transformation. All fatal;
/// none is ever retried.
#[derive(Debug, Clone, Error)]
pub enum KnobError {
    /// Bad or missing calibration data.
    #[error("calibration for family '{family}' unusable: {detail}")]
    Configuration { family: String, detail: String },

    /// A knob name did not match exactly one family.
    #[error("knob '{name}' matches {matched} families, expected exactly one")]
    Classification { name: String, matched: usize },

    /// A knob name appeared more than once in one vector.
    #[error("duplicate knob name '{0}'")]
    DuplicateKnob(String),

    /// No baseline was captured for a family being applied.
    #[error("no baseline captured for family '{0}'")]
    MissingBaseline(String),

    /// Baseline length does not match the calibration actuator count.
    #[error("baseline for family '{family}' has {got} entries, calibration expects {want}")]
    BaselineMismatch {
        family: String,
        want: usize,
        got: usize,
    },
}

impl KnobError {
    pub fn configuration(family: impl Into<String>, detail: impl Into<String>) -> Self {
        KnobError::Configuration {
            family: family.into(),
            detail: detail.into(),
        }
    }
}
