//! # Ringtune Sequencer
//!
//! The injection shot sequence: a guarded walk across three hardware
//! subsystems (ramping supply, electron gun, injection kicker) that
//! produces one shot-train and reduces the resulting diagnostic
//! history to a single efficiency figure.
//!
//! ## Design
//! There is no persisted state machine. Device state is re-read at
//! every decision point, so a re-run after a partial failure resumes
//! from the correct branch. The decision logic itself is pure
//! (`decide` module) and unit-testable without hardware; the driver
//! (`ShotSequencer`) applies the decisions through the channel bus.
//!
//! ## Retry Policy
//! Every recoverable device call is retried exactly once after a fixed
//! back-off; the kicker additionally gets a `Reset` between attempts.
//! A second failure always propagates.
//!
//! ## Safety Invariant
//! Every exit path — guard abort, unexpected-kicker abort, normal
//! completion — leaves the ramping supply stopped and the gun off.

pub mod config;
pub mod decide;
pub mod error;
pub mod sequencer;
pub mod state;

pub use config::ShotConfig;
pub use decide::{
    decide_fire, decide_guard, decide_guard_after_ack, decide_ramp_start, decide_ramp_stop,
};
pub use decide::{FireDecision, GuardDecision, GuardVerdict, RampDecision};
pub use error::SequenceError;
pub use sequencer::ShotSequencer;
pub use state::{KickerState, SourceState, SupplyState};
