//! # Ringtune Env
//!
//! Optimizer-facing tuning environments.
//!
//! ## Description
//! An environment exposes a named set of variables (knob amplitudes or
//! raw power-supply channels) and observables (injection efficiency,
//! losses, lifetime) behind the `Environment` trait. The numeric
//! optimizer driving these lives elsewhere; this crate is the boundary
//! where abstract moves become hardware writes and measurements.
//!
//! ## Variants
//! - [`KnobEnvironment`]: sextupole/octupole knob space via the
//!   calibration-matrix transform, baseline captured at connect.
//! - [`DirectChannelEnvironment`]: raw bounded channels, defaulting to
//!   the transfer-line optics.

pub mod config;
pub mod direct_env;
pub mod environment;
pub mod error;
pub mod knob_env;
pub mod observable;
pub mod telemetry;

pub use config::{AmplitudeRange, EnvConfig};
pub use direct_env::{transfer_line_bounds, BoundedChannel, DirectChannelEnvironment};
pub use environment::Environment;
pub use error::EnvError;
pub use knob_env::KnobEnvironment;
pub use observable::Observable;
