//! Channel-level error types.

use thiserror::Error;

/// Failures surfaced by the channel layer.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The remote device did not answer or rejected the operation.
    /// Transient: callers retry exactly once with a fixed back-off
    /// before letting this propagate.
    #[error("device unavailable on '{channel}': {detail}")]
    DeviceUnavailable { channel: String, detail: String },

    /// A channel returned a value of the wrong shape (scalar where a
    /// vector was expected, or the reverse). Fatal, never retried.
    #[error("channel '{channel}' returned a {got} where a {want} was expected")]
    WrongShape {
        channel: String,
        want: &'static str,
        got: &'static str,
    },
}

impl ChannelError {
    /// Construct a `DeviceUnavailable` for the given channel.
    pub fn unavailable(channel: impl Into<String>, detail: impl Into<String>) -> Self {
        ChannelError::DeviceUnavailable {
            channel: channel.into(),
            detail: detail.into(),
        }
    }
}
