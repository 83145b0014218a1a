//! # Ringtune Acquisition
//!
//! Reduction of noisy diagnostic acquisitions to a single scalar.
//!
//! ## Description
//! Two reduction paths exist and must not be confused:
//! - the continuous path samples a live channel a fixed number of
//!   times with a pause between samples and averages the raw readings;
//! - the history path fetches a window of archived samples, drops
//!   invalid ones (absent or non-positive) and averages the rest.
//!
//! A normalized variant pipes each lifetime sample through the Touschek
//! normalization before averaging.

pub mod normalize;
pub mod reduce;

pub use normalize::{
    normalize_lifetime, scaled_total_losses, LifetimeObservation, NormalizationRefs,
};
pub use reduce::{normalized_lifetime_mean, sample_mean, valid_mean, LifetimeChannels};
