//! Sequencer error types.

use ringtune_channels::ChannelError;
use thiserror::Error;

/// Failures of the shot sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Beam current above the safety limit after the operator had a
    /// chance to intervene. The sequence was never started.
    #[error("beam current {current:.1} mA still above safety limit {limit:.1} mA, shot sequence aborted")]
    SafetyAbort { current: f64, limit: f64 },

    /// The kicker was not in standby when the sequence reached the
    /// fire step. Devices were driven to safe shutdown before this
    /// surfaced.
    #[error("kicker not in standby")]
    UnexpectedKickerState,

    /// A device call failed twice (the single retry included).
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
