//! Scripted test doubles for the channel layer.
//!
//! `ScriptedBus` plays back configured values and states, injects
//! per-operation failures and journals every operation it sees, so the
//! sequencing logic can be exercised without hardware. Handles are
//! reference-counted clones; keep one in the test to inspect the
//! journal after the context has consumed the bus.

use crate::bus::{ChannelBus, ChannelValue, DeviceCommand, DeviceState, Sample};
use crate::context::{OperatorPrompt, Sleeper};
use crate::error::ChannelError;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// One journaled bus operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BusOp {
    Read(String),
    Write(String, ChannelValue),
    State(String),
    Command(String, DeviceCommand),
    History(String, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FailKey {
    Read(String),
    Write(String),
    State(String),
    Command(String, DeviceCommand),
    History(String),
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, ChannelValue>,
    queued: HashMap<String, VecDeque<ChannelValue>>,
    written: HashMap<String, ChannelValue>,
    states: HashMap<String, DeviceState>,
    histories: HashMap<String, Vec<Sample>>,
    failures: HashMap<FailKey, u32>,
    journal: Vec<BusOp>,
}

impl Inner {
    /// Consume one injected failure for `key` if armed.
    fn take_failure(&mut self, key: FailKey, channel: &str) -> Result<(), ChannelError> {
        if let Some(remaining) = self.failures.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChannelError::unavailable(channel, "injected failure"));
            }
        }
        Ok(())
    }
}

/// Scripted, journaling channel bus.
///
/// Commands move the device state the way the real hardware does:
/// `StartRamping` leaves the device `Running`, `StopRamping` returns it
/// to `On`, `Reset` parks it in `Standby`.
#[derive(Clone, Default)]
pub struct ScriptedBus {
    inner: Rc<RefCell<Inner>>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steady value returned by every read of `channel` (until
    /// overwritten by a `write`).
    pub fn set_value(&self, channel: &str, value: ChannelValue) {
        self.inner
            .borrow_mut()
            .values
            .insert(channel.to_string(), value);
    }

    /// One-shot value consumed before the steady value.
    pub fn push_value(&self, channel: &str, value: ChannelValue) {
        self.inner
            .borrow_mut()
            .queued
            .entry(channel.to_string())
            .or_default()
            .push_back(value);
    }

    pub fn set_state(&self, device: &str, state: DeviceState) {
        self.inner
            .borrow_mut()
            .states
            .insert(device.to_string(), state);
    }

    pub fn set_history(&self, channel: &str, samples: Vec<Sample>) {
        self.inner
            .borrow_mut()
            .histories
            .insert(channel.to_string(), samples);
    }

    pub fn fail_read(&self, channel: &str, times: u32) {
        self.arm(FailKey::Read(channel.to_string()), times);
    }

    pub fn fail_write(&self, channel: &str, times: u32) {
        self.arm(FailKey::Write(channel.to_string()), times);
    }

    pub fn fail_state(&self, device: &str, times: u32) {
        self.arm(FailKey::State(device.to_string()), times);
    }

    pub fn fail_command(&self, device: &str, command: DeviceCommand, times: u32) {
        self.arm(FailKey::Command(device.to_string(), command), times);
    }

    pub fn fail_history(&self, channel: &str, times: u32) {
        self.arm(FailKey::History(channel.to_string()), times);
    }

    fn arm(&self, key: FailKey, times: u32) {
        self.inner.borrow_mut().failures.insert(key, times);
    }

    /// Everything the bus has seen, in order.
    pub fn journal(&self) -> Vec<BusOp> {
        self.inner.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.inner.borrow_mut().journal.clear();
    }

    /// Last value written to `channel`, if any.
    pub fn last_written(&self, channel: &str) -> Option<ChannelValue> {
        self.inner.borrow().written.get(channel).cloned()
    }

    /// All commands issued to `device`, in order.
    pub fn commands_for(&self, device: &str) -> Vec<DeviceCommand> {
        self.inner
            .borrow()
            .journal
            .iter()
            .filter_map(|op| match op {
                BusOp::Command(d, c) if d == device => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Current scripted state of `device`.
    pub fn device_state(&self, device: &str) -> DeviceState {
        self.inner
            .borrow()
            .states
            .get(device)
            .copied()
            .unwrap_or(DeviceState::Unknown)
    }
}

impl ChannelBus for ScriptedBus {
    fn read(&mut self, channel: &str) -> Result<ChannelValue, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner.journal.push(BusOp::Read(channel.to_string()));
        inner.take_failure(FailKey::Read(channel.to_string()), channel)?;
        if let Some(queue) = inner.queued.get_mut(channel) {
            if let Some(v) = queue.pop_front() {
                return Ok(v);
            }
        }
        inner
            .values
            .get(channel)
            .cloned()
            .ok_or_else(|| ChannelError::unavailable(channel, "no scripted value"))
    }

    fn write(&mut self, channel: &str, value: ChannelValue) -> Result<(), ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner
            .journal
            .push(BusOp::Write(channel.to_string(), value.clone()));
        inner.take_failure(FailKey::Write(channel.to_string()), channel)?;
        inner.written.insert(channel.to_string(), value.clone());
        inner.values.insert(channel.to_string(), value);
        Ok(())
    }

    fn state_of(&mut self, device: &str) -> Result<DeviceState, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner.journal.push(BusOp::State(device.to_string()));
        inner.take_failure(FailKey::State(device.to_string()), device)?;
        Ok(inner
            .states
            .get(device)
            .copied()
            .unwrap_or(DeviceState::Unknown))
    }

    fn command(&mut self, device: &str, command: DeviceCommand) -> Result<(), ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner
            .journal
            .push(BusOp::Command(device.to_string(), command));
        inner.take_failure(FailKey::Command(device.to_string(), command), device)?;
        let next = match command {
            DeviceCommand::StartRamping => DeviceState::Running,
            DeviceCommand::StopRamping => DeviceState::On,
            DeviceCommand::On => DeviceState::On,
            DeviceCommand::Off => DeviceState::Off,
            DeviceCommand::Standby => DeviceState::Standby,
            DeviceCommand::Reset => DeviceState::Standby,
        };
        inner.states.insert(device.to_string(), next);
        Ok(())
    }

    fn history(&mut self, channel: &str, depth: usize) -> Result<Vec<Sample>, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner.journal.push(BusOp::History(channel.to_string(), depth));
        inner.take_failure(FailKey::History(channel.to_string()), channel)?;
        let samples = inner.histories.get(channel).cloned().unwrap_or_default();
        Ok(samples.into_iter().rev().take(depth).rev().collect())
    }
}

// =============================================================================
// Recording capabilities
// =============================================================================

/// Shared log of observed sleep durations.
pub type SleepLog = Rc<RefCell<Vec<Duration>>>;

/// Records every requested sleep without waiting.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    log: SleepLog,
}

impl RecordingSleeper {
    pub fn new() -> (Self, SleepLog) {
        let sleeper = Self::default();
        let log = sleeper.log.clone();
        (sleeper, log)
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.log.borrow_mut().push(duration);
    }
}

/// Shared log of confirmation messages shown to the operator.
pub type PromptLog = Rc<RefCell<Vec<String>>>;

/// Acknowledges immediately, recording the message.
#[derive(Clone, Default)]
pub struct CountingPrompt {
    log: PromptLog,
}

impl CountingPrompt {
    pub fn new() -> (Self, PromptLog) {
        let prompt = Self::default();
        let log = prompt.log.clone();
        (prompt, log)
    }
}

impl OperatorPrompt for CountingPrompt {
    fn confirm(&mut self, message: &str) {
        self.log.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_values_are_consumed_before_steady() {
        let mut bus = ScriptedBus::new();
        bus.set_value("c", 1.0.into());
        bus.push_value("c", 9.0.into());
        assert_eq!(bus.read("c").unwrap(), ChannelValue::Scalar(9.0));
        assert_eq!(bus.read("c").unwrap(), ChannelValue::Scalar(1.0));
        assert_eq!(bus.read("c").unwrap(), ChannelValue::Scalar(1.0));
    }

    #[test]
    fn commands_move_device_state() {
        let mut bus = ScriptedBus::new();
        bus.set_state("sy/ps-rips/manager", DeviceState::On);
        bus.command("sy/ps-rips/manager", DeviceCommand::StartRamping)
            .unwrap();
        assert_eq!(
            bus.state_of("sy/ps-rips/manager").unwrap(),
            DeviceState::Running
        );
        bus.command("sy/ps-rips/manager", DeviceCommand::StopRamping)
            .unwrap();
        assert_eq!(bus.state_of("sy/ps-rips/manager").unwrap(), DeviceState::On);
    }

    #[test]
    fn history_returns_most_recent_depth_samples() {
        use chrono::Utc;
        let mut bus = ScriptedBus::new();
        let ts = Utc::now();
        let samples: Vec<Sample> = (0..5)
            .map(|i| Sample::new(ts, Some(i as f64 + 1.0)))
            .collect();
        bus.set_history("h", samples);
        let got = bus.history("h", 2).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].value, Some(4.0));
        assert_eq!(got[1].value, Some(5.0));
    }

    #[test]
    fn failure_injection_is_bounded() {
        let mut bus = ScriptedBus::new();
        bus.set_value("c", 2.0.into());
        bus.fail_read("c", 1);
        assert!(bus.read("c").is_err());
        assert!(bus.read("c").is_ok());
    }
}
