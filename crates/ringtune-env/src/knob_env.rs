//! Knob-space tuning environment.
//!
//! Variables are dimensionless knob amplitudes over the sextupole and
//! octupole calibration families. The baseline correction strengths and
//! the reference beam current are captured exactly once, when the
//! environment connects; every later `set_variables` is a delta on that
//! baseline, never on the magnets' current state.

use crate::config::{AmplitudeRange, EnvConfig};
use crate::environment::Environment;
use crate::error::EnvError;
use crate::observable::Observable;
use ringtune_acquisition::{
    normalized_lifetime_mean, sample_mean, scaled_total_losses,
};
use ringtune_channels::{ChannelValue, HardwareContext, DEFAULT_RW_BACKOFF};
use ringtune_knobs::{Baseline, KnobFamily, KnobMatrix, KnobSet, KnobVector};
use ringtune_sequencer::ShotSequencer;

pub struct KnobEnvironment {
    config: EnvConfig,
    ctx: HardwareContext,
    knobs: KnobSet,
    baseline: Baseline,
    /// Beam current at connect time, mA. Loss and lifetime observables
    /// are rescaled to this.
    reference_current_ma: f64,
    /// Last commanded amplitude per knob, zero until moved.
    amplitudes: Vec<(String, f64)>,
    /// Allowed travel per knob, same order as `amplitudes`.
    bounds: Vec<(String, AmplitudeRange)>,
    sequencer: ShotSequencer,
}

impl KnobEnvironment {
    /// Load the calibration tables and capture the session baseline.
    pub fn connect(config: EnvConfig, mut ctx: HardwareContext) -> Result<Self, EnvError> {
        let sext = KnobMatrix::from_csv_path("sext", &config.sext_matrix_path)?;
        let oct = KnobMatrix::from_csv_path("oct", &config.oct_matrix_path)?;
        let knobs = KnobSet::new(vec![
            KnobFamily::new(sext, &config.sext_strengths_channel),
            KnobFamily::new(oct, &config.oct_strengths_channel),
        ])?;

        let mut baseline = Baseline::new();
        for family in knobs.families() {
            let values = ctx.read_vector_retry(&family.strengths_channel, DEFAULT_RW_BACKOFF)?;
            tracing::info!(
                family = family.name(),
                actuators = values.len(),
                "baseline strengths captured"
            );
            baseline.insert(family.name(), values);
        }

        let reference_current_ma =
            ctx.read_scalar_retry(&config.shot.guard_channel, DEFAULT_RW_BACKOFF)?;
        tracing::info!(reference_current_ma, "knob environment connected");

        let names = knobs.all_names();
        let amplitudes = names.iter().map(|n| (n.clone(), 0.0)).collect();
        let bounds = names
            .into_iter()
            .map(|n| {
                let range = config.knob_range_for(&n);
                (n, range)
            })
            .collect();
        let sequencer = ShotSequencer::new(config.shot.clone());
        Ok(Self {
            config,
            ctx,
            knobs,
            baseline,
            reference_current_ma,
            amplitudes,
            bounds,
            sequencer,
        })
    }

    pub fn reference_current_ma(&self) -> f64 {
        self.reference_current_ma
    }

    /// Allowed travel per knob, in variable order.
    pub fn amplitude_bounds(&self) -> &[(String, AmplitudeRange)] {
        &self.bounds
    }

    fn observe(&mut self, observable: Observable) -> Result<f64, EnvError> {
        let count = self.config.acquisitions;
        let interval = self.config.interval();
        match observable {
            Observable::InjEffShooting => Ok(self.sequencer.run(&mut self.ctx)?),
            Observable::InjEffContinuous => Ok(sample_mean(
                &mut self.ctx,
                &self.config.shot.diagnostic_channel,
                count,
                interval,
            )?),
            Observable::TotalLosses => {
                let count = count.max(1);
                let mut sum = 0.0;
                for i in 0..count {
                    if i > 0 {
                        self.ctx.sleep(interval);
                    }
                    let loss = self
                        .ctx
                        .read_scalar_retry(&self.config.total_losses_channel, DEFAULT_RW_BACKOFF)?;
                    let current = self
                        .ctx
                        .read_scalar_retry(&self.config.shot.guard_channel, DEFAULT_RW_BACKOFF)?;
                    sum += scaled_total_losses(loss, self.reference_current_ma, current);
                }
                Ok(sum / count as f64)
            }
            Observable::LiberaLifetime => {
                let count = count.max(1);
                let mut sum = 0.0;
                for i in 0..count {
                    if i > 0 {
                        self.ctx.sleep(interval);
                    }
                    let lifetime_s = self
                        .ctx
                        .read_scalar_retry(&self.config.lifetime_channel, DEFAULT_RW_BACKOFF)?;
                    let current = self
                        .ctx
                        .read_scalar_retry(&self.config.shot.guard_channel, DEFAULT_RW_BACKOFF)?;
                    // Hours, linearly rescaled to the reference current.
                    sum += lifetime_s / 3600.0 * current / self.reference_current_ma;
                }
                Ok(sum / count as f64)
            }
            Observable::NormalizedLiberaLifetime => Ok(normalized_lifetime_mean(
                &mut self.ctx,
                &self.config.lifetime_channels(),
                &self.config.normalization,
                count,
                interval,
            )?),
        }
    }
}

impl Environment for KnobEnvironment {
    fn name(&self) -> &str {
        "ring-knob-tuning"
    }

    fn variable_names(&self) -> Vec<String> {
        self.knobs.all_names()
    }

    fn observable_names(&self) -> Vec<String> {
        Observable::ALL.iter().map(|o| o.name().to_string()).collect()
    }

    fn get_variables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError> {
        names
            .iter()
            .map(|name| {
                self.amplitudes
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(n, a)| (n.clone(), *a))
                    .ok_or_else(|| EnvError::UnknownVariable(name.clone()))
            })
            .collect()
    }

    fn set_variables(&mut self, values: &[(String, f64)]) -> Result<(), EnvError> {
        // Validate every requested move before touching any amplitude.
        for (name, value) in values {
            let range = self
                .bounds
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, r)| *r)
                .ok_or_else(|| EnvError::UnknownVariable(name.clone()))?;
            if !range.contains(*value) {
                return Err(EnvError::OutOfBounds {
                    variable: name.clone(),
                    value: *value,
                    low: range.low,
                    high: range.high,
                });
            }
        }
        for (name, value) in values {
            if let Some(slot) = self.amplitudes.iter_mut().find(|(n, _)| n == name) {
                slot.1 = *value;
            }
        }

        // The full amplitude vector is reapplied so that setpoints
        // always reflect the complete knob state, not just this move.
        let knobs = KnobVector::from_pairs(self.amplitudes.clone())?;
        let setpoints = self.knobs.apply(&knobs, &self.baseline)?;
        for family in setpoints {
            tracing::info!(
                family = %family.family,
                channel = %family.channel,
                "writing strengths"
            );
            self.ctx.write_retry(
                &family.channel,
                ChannelValue::Vector(family.values),
                DEFAULT_RW_BACKOFF,
            )?;
        }
        Ok(())
    }

    fn get_observables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError> {
        let requested = names
            .iter()
            .map(|n| Observable::parse(n))
            .collect::<Result<Vec<_>, _>>()?;

        // Let the last setpoint settle before measuring anything.
        self.ctx.sleep(self.config.wait_time());

        let mut out = Vec::with_capacity(requested.len());
        for observable in requested {
            let value = self.observe(observable)?;
            tracing::info!(%observable, value, "observable measured");
            out.push((observable.name().to_string(), value));
        }
        Ok(out)
    }
}
