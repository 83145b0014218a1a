//! Channel bus contract: values, device states, commands, history.

use crate::error::ChannelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ChannelValue — scalar or vector reading
// =============================================================================

/// Value carried by a named channel.
///
/// Power-supply setpoints and diagnostics are scalars; correction
/// strength tables are vectors with one entry per magnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl ChannelValue {
    /// Interpret as a scalar, failing with `WrongShape` otherwise.
    pub fn as_scalar(&self, channel: &str) -> Result<f64, ChannelError> {
        match self {
            ChannelValue::Scalar(v) => Ok(*v),
            ChannelValue::Vector(_) => Err(ChannelError::WrongShape {
                channel: channel.to_string(),
                want: "scalar",
                got: "vector",
            }),
        }
    }

    /// Interpret as a vector, failing with `WrongShape` otherwise.
    pub fn as_vector(&self, channel: &str) -> Result<&[f64], ChannelError> {
        match self {
            ChannelValue::Vector(v) => Ok(v),
            ChannelValue::Scalar(_) => Err(ChannelError::WrongShape {
                channel: channel.to_string(),
                want: "vector",
                got: "scalar",
            }),
        }
    }
}

impl From<f64> for ChannelValue {
    fn from(v: f64) -> Self {
        ChannelValue::Scalar(v)
    }
}

impl From<Vec<f64>> for ChannelValue {
    fn from(v: Vec<f64>) -> Self {
        ChannelValue::Vector(v)
    }
}

// =============================================================================
// DeviceState — observable state of a remote device
// =============================================================================

/// Raw device state as reported by the control system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    On,
    Off,
    /// The device is actively ramping or pulsing.
    Running,
    /// The device is transitioning between states.
    Moving,
    Standby,
    Fault,
    Unknown,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceState::On => "on",
            DeviceState::Off => "off",
            DeviceState::Running => "running",
            DeviceState::Moving => "moving",
            DeviceState::Standby => "standby",
            DeviceState::Fault => "fault",
            DeviceState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// DeviceCommand — imperative operations on a device
// =============================================================================

/// Commands accepted by the sequenced devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCommand {
    StartRamping,
    StopRamping,
    On,
    Off,
    Standby,
    Reset,
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceCommand::StartRamping => "start_ramping",
            DeviceCommand::StopRamping => "stop_ramping",
            DeviceCommand::On => "on",
            DeviceCommand::Off => "off",
            DeviceCommand::Standby => "standby",
            DeviceCommand::Reset => "reset",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Sample — timestamped history reading
// =============================================================================

/// One timestamped reading from a diagnostic channel's history buffer.
///
/// A sample is valid iff a value is present and strictly positive.
/// Invalid samples are excluded from reductions, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ts: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(ts: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { ts, value }
    }

    /// Present and strictly positive.
    pub fn is_valid(&self) -> bool {
        matches!(self.value, Some(v) if v > 0.0)
    }
}

// =============================================================================
// ChannelBus — the transport contract
// =============================================================================

/// Read/write access to the remote channel namespace.
///
/// The namespace is a single global mutable resource shared with other
/// control-room actors; a write is guaranteed visible to the next read
/// issued by this process, nothing more. Implementations perform no
/// retries of their own — the retry policy lives in
/// [`HardwareContext`](crate::context::HardwareContext).
pub trait ChannelBus {
    /// Read the current value of a named channel.
    fn read(&mut self, channel: &str) -> Result<ChannelValue, ChannelError>;

    /// Write a value to a named channel.
    fn write(&mut self, channel: &str, value: ChannelValue) -> Result<(), ChannelError>;

    /// Read the state of a named device.
    fn state_of(&mut self, device: &str) -> Result<DeviceState, ChannelError>;

    /// Issue a command to a named device.
    fn command(&mut self, device: &str, command: DeviceCommand) -> Result<(), ChannelError>;

    /// Fetch the most recent `depth` history samples of a channel,
    /// oldest first.
    fn history(&mut self, channel: &str, depth: usize) -> Result<Vec<Sample>, ChannelError>;
}
