//! Environment error types.

use ringtune_channels::ChannelError;
use ringtune_knobs::KnobError;
use ringtune_sequencer::SequenceError;
use thiserror::Error;

/// Anything that can go wrong behind the environment surface.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The requested variable is not part of this environment.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// The requested observable is not part of this environment.
    #[error("unknown observable '{0}'")]
    UnknownObservable(String),

    /// A direct-channel setpoint outside the variable's safe range.
    #[error("value {value} for '{variable}' outside [{low}, {high}]")]
    OutOfBounds {
        variable: String,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error(transparent)]
    Knob(#[from] KnobError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}
