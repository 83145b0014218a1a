//! # Ringtune Knobs
//!
//! Calibration matrices and the knob-to-setpoint transform.
//!
//! ## Description
//! A knob is an abstract tuning variable: one dimensionless amplitude
//! that fans out over a whole family of physical actuators through a
//! precomputed calibration matrix. This crate loads those matrices,
//! names their rows, projects them onto knob subsets and turns a knob
//! vector plus a per-session baseline into absolute physical setpoints.
//!
//! ## Invariants
//! - A matrix is immutable after load; row-name ordering is fixed.
//! - Amplitudes are matched against matrix rows **by name**, never by
//!   position, so reordering the input vector cannot desynchronize it
//!   from the projection.
//! - The baseline is captured once per session; every application adds
//!   deltas to that baseline, never to the actuators' current state.

pub mod engine;
pub mod error;
pub mod matrix;
pub mod vector;

pub use engine::{Baseline, FamilySetpoints, KnobFamily, KnobSet};
pub use error::KnobError;
pub use matrix::KnobMatrix;
pub use vector::KnobVector;
