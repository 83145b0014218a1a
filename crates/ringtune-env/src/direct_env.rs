//! Direct-channel tuning environment.
//!
//! Variables are raw power-supply setpoints with per-channel safe
//! ranges, defaulting to the transfer-line optics between the booster
//! and the storage ring. No calibration matrix is involved; values are
//! written as-is after a bounds check.

use crate::config::EnvConfig;
use crate::environment::Environment;
use crate::error::EnvError;
use crate::observable::Observable;
use ringtune_acquisition::sample_mean;
use ringtune_channels::{HardwareContext, DEFAULT_RW_BACKOFF};
use ringtune_sequencer::ShotSequencer;

/// One directly tunable channel with its safe range.
#[derive(Debug, Clone)]
pub struct BoundedChannel {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

impl BoundedChannel {
    pub fn new(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            low,
            high,
        }
    }
}

/// Default variable set: transfer-line quadrupoles, steerers, septa and
/// injection timing, each with its operational range.
pub fn transfer_line_bounds() -> Vec<BoundedChannel> {
    vec![
        BoundedChannel::new("tl2/ps/qf1/Current", 46.0, 56.0),
        BoundedChannel::new("tl2/ps/qd2/Current", 25.0, 35.0),
        BoundedChannel::new("tl2/ps/qf3/Current", 9.0, 19.0),
        BoundedChannel::new("tl2/ps/qf4/Current", 71.0, 81.0),
        BoundedChannel::new("tl2/ps/qd5/Current", 59.0, 69.0),
        BoundedChannel::new("tl2/ps/qf6/Current", 28.0, 38.0),
        BoundedChannel::new("tl2/ps-sx/bs/Current", 5.0, 30.0),
        BoundedChannel::new("tl2/ps/qf7/Current", 5.0, 15.0),
        BoundedChannel::new("tl2/ps/qd8/Current", 13.0, 23.0),
        BoundedChannel::new("tl2/ps/qf9/Current", 1.0, 10.0),
        BoundedChannel::new("tl2/ps/qd10/Current", 2.0, 12.0),
        BoundedChannel::new("tl2/ps/qf11/Current", 50.0, 60.0),
        BoundedChannel::new("tl2/ps/qd12/Current", 51.0, 61.0),
        BoundedChannel::new("tl2/ps/qf13/Current", 7.0, 17.0),
        BoundedChannel::new("tl2/ps/qf14/Current", 46.0, 56.0),
        BoundedChannel::new("tl2/ps-c1/cv7/Current", -2.0, 2.0),
        BoundedChannel::new("tl2/ps-c1/cv8/Current", -2.0, 2.0),
        BoundedChannel::new("tl2/ps-c1/cv9/Current", -2.0, 2.0),
        BoundedChannel::new("sr/ps-si/2/Current", 9400.0, 10600.0),
        BoundedChannel::new("sr/ps-si/3/Current", 7100.0, 7700.0),
        BoundedChannel::new("infra/t-whist/bunchclock/Text", 0.143655, 0.144655),
        BoundedChannel::new("infra/t-phase/all/phase_SY_SR", 40.0, 80.0),
        BoundedChannel::new("sy/ps-ke/1/Current", 880.0, 985.0),
        BoundedChannel::new("sy/ps-se/1/Current", 2750.0, 3030.0),
        BoundedChannel::new("sy/ps-se/2-1/Current", 9700.0, 10500.0),
    ]
}

pub struct DirectChannelEnvironment {
    config: EnvConfig,
    ctx: HardwareContext,
    channels: Vec<BoundedChannel>,
    /// Setpoints at connect time, kept for reference and restoration.
    initial: Vec<(String, f64)>,
    sequencer: ShotSequencer,
}

impl DirectChannelEnvironment {
    /// Capture the initial setpoint of every channel.
    pub fn connect(
        config: EnvConfig,
        channels: Vec<BoundedChannel>,
        mut ctx: HardwareContext,
    ) -> Result<Self, EnvError> {
        let mut initial = Vec::with_capacity(channels.len());
        for channel in &channels {
            let value = ctx.read_scalar_retry(&channel.name, DEFAULT_RW_BACKOFF)?;
            initial.push((channel.name.clone(), value));
        }
        tracing::info!(variables = channels.len(), "direct environment connected");
        let sequencer = ShotSequencer::new(config.shot.clone());
        Ok(Self {
            config,
            ctx,
            channels,
            initial,
            sequencer,
        })
    }

    pub fn initial_values(&self) -> &[(String, f64)] {
        &self.initial
    }

    fn bounds_of(&self, name: &str) -> Result<&BoundedChannel, EnvError> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EnvError::UnknownVariable(name.to_string()))
    }
}

impl Environment for DirectChannelEnvironment {
    fn name(&self) -> &str {
        "transfer-line-direct"
    }

    fn variable_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    fn observable_names(&self) -> Vec<String> {
        vec![
            Observable::InjEffShooting.name().to_string(),
            Observable::InjEffContinuous.name().to_string(),
        ]
    }

    fn get_variables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            self.bounds_of(name)?;
            let value = self.ctx.read_scalar_retry(name, DEFAULT_RW_BACKOFF)?;
            out.push((name.clone(), value));
        }
        Ok(out)
    }

    fn set_variables(&mut self, values: &[(String, f64)]) -> Result<(), EnvError> {
        for (name, value) in values {
            let bounds = self.bounds_of(name)?;
            if *value < bounds.low || *value > bounds.high {
                return Err(EnvError::OutOfBounds {
                    variable: name.clone(),
                    value: *value,
                    low: bounds.low,
                    high: bounds.high,
                });
            }
        }
        for (name, value) in values {
            self.ctx
                .write_retry(name, (*value).into(), DEFAULT_RW_BACKOFF)?;
        }
        Ok(())
    }

    fn get_observables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError> {
        let requested = names
            .iter()
            .map(|name| match Observable::parse(name)? {
                o @ (Observable::InjEffShooting | Observable::InjEffContinuous) => Ok(o),
                _ => Err(EnvError::UnknownObservable(name.clone())),
            })
            .collect::<Result<Vec<_>, EnvError>>()?;

        self.ctx.sleep(self.config.wait_time());

        let mut out = Vec::with_capacity(requested.len());
        for observable in requested {
            let value = match observable {
                Observable::InjEffShooting => self.sequencer.run(&mut self.ctx)?,
                _ => sample_mean(
                    &mut self.ctx,
                    &self.config.shot.diagnostic_channel,
                    self.config.acquisitions,
                    self.config.interval(),
                )?,
            };
            tracing::info!(%observable, value, "observable measured");
            out.push((observable.name().to_string(), value));
        }
        Ok(out)
    }
}
