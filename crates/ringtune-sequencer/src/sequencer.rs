//! The effectful shot-sequence driver.

use crate::config::ShotConfig;
use crate::decide::{
    decide_fire, decide_guard, decide_guard_after_ack, decide_ramp_start, decide_ramp_stop,
    FireDecision, GuardDecision, GuardVerdict, RampDecision,
};
use crate::error::SequenceError;
use crate::state::{KickerState, SourceState, SupplyState};
use ringtune_acquisition::valid_mean;
use ringtune_channels::{ChannelValue, DeviceCommand, HardwareContext};

/// Message shown to the operator when the stored beam must be dumped
/// before injection can proceed.
pub const KILL_BEAM_PROMPT: &str =
    "Please kill beam before injection. After killing, please press any key to continue.";

/// Drives one injection shot-train and reduces the diagnostic history
/// to a mean efficiency.
///
/// The sequence is re-evaluated from live device state at every step;
/// running it again after a partial failure resumes from the correct
/// branch.
#[derive(Debug, Clone)]
pub struct ShotSequencer {
    config: ShotConfig,
}

impl ShotSequencer {
    pub fn new(config: ShotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShotConfig {
        &self.config
    }

    /// Run the full sequence. On success and on the unexpected-kicker
    /// abort the supply ends stopped and the source off.
    pub fn run(&self, ctx: &mut HardwareContext) -> Result<f64, SequenceError> {
        self.check_guard(ctx)?;
        self.start_ramp(ctx)?;
        self.enable_source(ctx)?;
        self.fire_kicker(ctx)?;
        self.stop_ramp(ctx)?;
        self.disable_source(ctx)?;
        self.collect(ctx)
    }

    /// Step 1: beam-current safety guard with blocking operator
    /// confirmation.
    fn check_guard(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let current = ctx.read_scalar_retry(&cfg.guard_channel, cfg.read_backoff())?;
        if decide_guard(current, cfg.beam_current_limit) == GuardDecision::Proceed {
            return Ok(());
        }
        tracing::warn!(
            current,
            limit = cfg.beam_current_limit,
            "beam current above limit, waiting for operator"
        );
        ctx.confirm(KILL_BEAM_PROMPT);

        let current = ctx.read_scalar_retry(&cfg.guard_channel, cfg.read_backoff())?;
        match decide_guard_after_ack(current, cfg.beam_current_limit) {
            GuardVerdict::Proceed => Ok(()),
            GuardVerdict::Abort => Err(SequenceError::SafetyAbort {
                current,
                limit: cfg.beam_current_limit,
            }),
        }
    }

    /// Step 2: bring the supply to ramping.
    fn start_ramp(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let supply = SupplyState::from_device(ctx.state_of(&cfg.supply_device)?);
        match decide_ramp_start(supply) {
            RampDecision::AlreadyThere => return Ok(()),
            RampDecision::SettleThenAct => ctx.sleep(cfg.settle()),
            RampDecision::Act => {}
        }
        tracing::info!(device = %cfg.supply_device, "starting ramp");
        ctx.command_retry(
            &cfg.supply_device,
            DeviceCommand::StartRamping,
            cfg.ramp_backoff(),
        )?;
        // Let the ramp actually start before touching the source.
        ctx.sleep(cfg.settle());
        Ok(())
    }

    /// Step 3: gun on if it is off.
    fn enable_source(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let source = SourceState::from_device(ctx.state_of(&cfg.source_device)?);
        if source == SourceState::Off {
            tracing::info!(device = %cfg.source_device, "enabling source");
            ctx.command(&cfg.source_device, DeviceCommand::On)?;
        }
        Ok(())
    }

    /// Step 4: fire the shot-train, or unwind safely when the kicker is
    /// in an unexpected state.
    fn fire_kicker(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let kicker = KickerState::from_device(ctx.state_of(&cfg.kicker_device)?);
        match decide_fire(kicker) {
            FireDecision::Fire => {
                let saved = ctx.read_scalar_retry(&cfg.shot_register, cfg.read_backoff())?;
                ctx.write_retry(
                    &cfg.shot_register,
                    ChannelValue::Scalar(cfg.number_of_shots as f64),
                    cfg.read_backoff(),
                )?;

                tracing::info!(shots = cfg.number_of_shots, "firing kicker");
                ctx.command_with_reset(
                    &cfg.kicker_device,
                    DeviceCommand::On,
                    cfg.kicker_backoff(),
                )?;

                ctx.sleep(cfg.shot_wait());

                ctx.command_with_reset(
                    &cfg.kicker_device,
                    DeviceCommand::Standby,
                    cfg.kicker_backoff(),
                )?;

                ctx.write_retry(
                    &cfg.shot_register,
                    ChannelValue::Scalar(saved),
                    cfg.read_backoff(),
                )?;
                Ok(())
            }
            FireDecision::AbortShutdown => {
                tracing::error!(device = %cfg.kicker_device, "kicker not in standby, unwinding");
                self.stop_ramp(ctx)?;
                ctx.command(&cfg.source_device, DeviceCommand::Off)?;
                ctx.command(&cfg.kicker_device, DeviceCommand::Standby)?;
                Err(SequenceError::UnexpectedKickerState)
            }
        }
    }

    /// Step 5: bring the supply back to stopped.
    fn stop_ramp(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let supply = SupplyState::from_device(ctx.state_of(&cfg.supply_device)?);
        match decide_ramp_stop(supply) {
            RampDecision::AlreadyThere => return Ok(()),
            RampDecision::SettleThenAct => ctx.sleep(cfg.settle()),
            RampDecision::Act => {}
        }
        tracing::info!(device = %cfg.supply_device, "stopping ramp");
        ctx.command_retry(
            &cfg.supply_device,
            DeviceCommand::StopRamping,
            cfg.ramp_backoff(),
        )?;
        Ok(())
    }

    /// Step 6: gun off if it is on.
    fn disable_source(&self, ctx: &mut HardwareContext) -> Result<(), SequenceError> {
        let cfg = &self.config;
        let source = SourceState::from_device(ctx.state_of(&cfg.source_device)?);
        if source == SourceState::On {
            tracing::info!(device = %cfg.source_device, "disabling source");
            ctx.command(&cfg.source_device, DeviceCommand::Off)?;
        }
        Ok(())
    }

    /// Step 7: reduce the diagnostic history window.
    fn collect(&self, ctx: &mut HardwareContext) -> Result<f64, SequenceError> {
        let cfg = &self.config;
        let samples = ctx.history_retry(
            &cfg.diagnostic_channel,
            cfg.history_depth,
            cfg.read_backoff(),
        )?;
        let mean = valid_mean(&samples);
        tracing::info!(
            window = samples.len(),
            shots = cfg.number_of_shots,
            efficiency = mean,
            "shot-train efficiency"
        );
        Ok(mean)
    }
}
