//! Hardware context: bus plus blocking capabilities, with the
//! single-retry policy at every seam.

use crate::bus::{ChannelBus, ChannelValue, DeviceCommand, DeviceState, Sample};
use crate::error::ChannelError;
use std::io::{BufRead, Write};
use std::time::Duration;

/// Fixed back-off applied before retrying a plain read or write.
pub const DEFAULT_RW_BACKOFF: Duration = Duration::from_secs(2);

// =============================================================================
// Capabilities
// =============================================================================

/// Blocking sleep. Injected so tests can observe waits without real
/// wall-clock time.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Suspends the thread for real.
#[derive(Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocking operator acknowledgment.
///
/// The safety guard asks the operator to intervene (kill the stored
/// beam) and blocks until acknowledged. No timeout wraps this call; it
/// can block indefinitely.
pub trait OperatorPrompt {
    fn confirm(&mut self, message: &str);
}

/// Prints the message and blocks on one line of stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl OperatorPrompt for StdinPrompt {
    fn confirm(&mut self, message: &str) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "{}", message);
        let _ = stdout.flush();
        let mut line = String::new();
        // EOF counts as an acknowledgment; the guard re-reads the
        // hardware afterwards either way.
        let _ = std::io::stdin().lock().read_line(&mut line);
    }
}

// =============================================================================
// HardwareContext
// =============================================================================

/// Bundle of the channel bus and the blocking capabilities, constructed
/// once and passed by mutable reference into the sequencer and reducer.
///
/// All retry helpers implement the same policy: on failure, back off
/// for a fixed duration and retry exactly once; a second failure
/// propagates.
pub struct HardwareContext {
    bus: Box<dyn ChannelBus>,
    sleeper: Box<dyn Sleeper>,
    prompt: Box<dyn OperatorPrompt>,
}

impl HardwareContext {
    pub fn new(
        bus: Box<dyn ChannelBus>,
        sleeper: Box<dyn Sleeper>,
        prompt: Box<dyn OperatorPrompt>,
    ) -> Self {
        Self {
            bus,
            sleeper,
            prompt,
        }
    }

    /// Production context: real sleeps, stdin confirmation.
    pub fn with_thread_runtime(bus: Box<dyn ChannelBus>) -> Self {
        Self::new(bus, Box::new(ThreadSleeper), Box::new(StdinPrompt))
    }

    pub fn sleep(&mut self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    pub fn confirm(&mut self, message: &str) {
        self.prompt.confirm(message);
    }

    // -------------------------------------------------------------------------
    // Plain delegation
    // -------------------------------------------------------------------------

    pub fn read(&mut self, channel: &str) -> Result<ChannelValue, ChannelError> {
        self.bus.read(channel)
    }

    pub fn write(&mut self, channel: &str, value: ChannelValue) -> Result<(), ChannelError> {
        self.bus.write(channel, value)
    }

    pub fn state_of(&mut self, device: &str) -> Result<DeviceState, ChannelError> {
        self.bus.state_of(device)
    }

    pub fn command(&mut self, device: &str, command: DeviceCommand) -> Result<(), ChannelError> {
        self.bus.command(device, command)
    }

    // -------------------------------------------------------------------------
    // Retry-wrapped operations
    // -------------------------------------------------------------------------

    /// Read with one retry after `backoff`.
    pub fn read_retry(
        &mut self,
        channel: &str,
        backoff: Duration,
    ) -> Result<ChannelValue, ChannelError> {
        match self.bus.read(channel) {
            Ok(v) => Ok(v),
            Err(first) => {
                tracing::warn!(channel, error = %first, "read failed, retrying once");
                self.sleeper.sleep(backoff);
                self.bus.read(channel)
            }
        }
    }

    /// Read a scalar with one retry after `backoff`.
    pub fn read_scalar_retry(
        &mut self,
        channel: &str,
        backoff: Duration,
    ) -> Result<f64, ChannelError> {
        self.read_retry(channel, backoff)?.as_scalar(channel)
    }

    /// Read a vector with one retry after `backoff`.
    pub fn read_vector_retry(
        &mut self,
        channel: &str,
        backoff: Duration,
    ) -> Result<Vec<f64>, ChannelError> {
        let value = self.read_retry(channel, backoff)?;
        value.as_vector(channel).map(<[f64]>::to_vec)
    }

    /// Write with one retry after `backoff`.
    pub fn write_retry(
        &mut self,
        channel: &str,
        value: ChannelValue,
        backoff: Duration,
    ) -> Result<(), ChannelError> {
        match self.bus.write(channel, value.clone()) {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(channel, error = %first, "write failed, retrying once");
                self.sleeper.sleep(backoff);
                self.bus.write(channel, value)
            }
        }
    }

    /// Command with one retry after `backoff`.
    pub fn command_retry(
        &mut self,
        device: &str,
        command: DeviceCommand,
        backoff: Duration,
    ) -> Result<(), ChannelError> {
        match self.bus.command(device, command) {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(device, %command, error = %first, "command failed, retrying once");
                self.sleeper.sleep(backoff);
                self.bus.command(device, command)
            }
        }
    }

    /// Command with a `Reset` issued before the single retry — the
    /// pulser recovery policy. A failure of the reset itself
    /// propagates.
    pub fn command_with_reset(
        &mut self,
        device: &str,
        command: DeviceCommand,
        backoff: Duration,
    ) -> Result<(), ChannelError> {
        match self.bus.command(device, command) {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(device, %command, error = %first, "command failed, resetting and retrying once");
                self.bus.command(device, DeviceCommand::Reset)?;
                self.sleeper.sleep(backoff);
                self.bus.command(device, command)
            }
        }
    }

    /// History fetch with one retry after `backoff`.
    pub fn history_retry(
        &mut self,
        channel: &str,
        depth: usize,
        backoff: Duration,
    ) -> Result<Vec<Sample>, ChannelError> {
        match self.bus.history(channel, depth) {
            Ok(v) => Ok(v),
            Err(first) => {
                tracing::warn!(channel, depth, error = %first, "history fetch failed, retrying once");
                self.sleeper.sleep(backoff);
                self.bus.history(channel, depth)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{CountingPrompt, RecordingSleeper, ScriptedBus};

    fn context(bus: &ScriptedBus) -> (HardwareContext, crate::mock::SleepLog) {
        let (sleeper, log) = RecordingSleeper::new();
        let (prompt, _) = CountingPrompt::new();
        (
            HardwareContext::new(Box::new(bus.clone()), Box::new(sleeper), Box::new(prompt)),
            log,
        )
    }

    #[test]
    fn read_recovers_after_single_failure() {
        let bus = ScriptedBus::new();
        bus.set_value("srdiag/beam-current/total/Current", 120.0.into());
        bus.fail_read("srdiag/beam-current/total/Current", 1);

        let (mut ctx, sleeps) = context(&bus);
        let v = ctx
            .read_scalar_retry("srdiag/beam-current/total/Current", DEFAULT_RW_BACKOFF)
            .unwrap();
        assert_eq!(v, 120.0);
        assert_eq!(sleeps.borrow().as_slice(), &[DEFAULT_RW_BACKOFF]);
    }

    #[test]
    fn read_gives_up_after_second_failure() {
        let bus = ScriptedBus::new();
        bus.set_value("srdiag/beam-current/total/Current", 120.0.into());
        bus.fail_read("srdiag/beam-current/total/Current", 2);

        let (mut ctx, sleeps) = context(&bus);
        let err = ctx
            .read_scalar_retry("srdiag/beam-current/total/Current", DEFAULT_RW_BACKOFF)
            .unwrap_err();
        assert!(matches!(err, ChannelError::DeviceUnavailable { .. }));
        // One back-off only: never a retry loop.
        assert_eq!(sleeps.borrow().len(), 1);
    }

    #[test]
    fn command_with_reset_issues_reset_between_attempts() {
        use crate::mock::BusOp;

        let bus = ScriptedBus::new();
        bus.set_state("sy/ps-ke/1", DeviceState::Standby);
        bus.fail_command("sy/ps-ke/1", DeviceCommand::On, 1);

        let (mut ctx, _) = context(&bus);
        ctx.command_with_reset("sy/ps-ke/1", DeviceCommand::On, Duration::from_millis(500))
            .unwrap();

        let journal = bus.journal();
        assert_eq!(
            journal,
            vec![
                BusOp::Command("sy/ps-ke/1".into(), DeviceCommand::On),
                BusOp::Command("sy/ps-ke/1".into(), DeviceCommand::Reset),
                BusOp::Command("sy/ps-ke/1".into(), DeviceCommand::On),
            ]
        );
    }

    #[test]
    fn write_retry_preserves_value() {
        let bus = ScriptedBus::new();
        bus.fail_write("tl2/ps/qf1/Current", 1);

        let (mut ctx, _) = context(&bus);
        ctx.write_retry("tl2/ps/qf1/Current", 53.0.into(), DEFAULT_RW_BACKOFF)
            .unwrap();
        assert_eq!(
            bus.last_written("tl2/ps/qf1/Current"),
            Some(ChannelValue::Scalar(53.0))
        );
    }
}
