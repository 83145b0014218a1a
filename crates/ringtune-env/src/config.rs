//! Environment configuration.

use anyhow::Context;
use ringtune_acquisition::{LifetimeChannels, NormalizationRefs};
use ringtune_channels::catalog;
use ringtune_sequencer::ShotConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Closed interval a knob amplitude may move within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeRange {
    pub low: f64,
    pub high: f64,
}

impl AmplitudeRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl Default for AmplitudeRange {
    fn default() -> Self {
        Self {
            low: -1.0,
            high: 1.0,
        }
    }
}

/// Everything a tuning environment needs: calibration sources, channel
/// names, acquisition cadence and the shot-sequence parameters. All
/// fields default to the storage-ring setup and can be overridden from
/// a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Settling wait before any observable is measured, seconds.
    pub wait_time_s: f64,
    /// Samples per continuous acquisition.
    pub acquisitions: u32,
    /// Pause between consecutive acquisition samples, seconds.
    pub acquisition_interval_s: f64,

    /// Sextupole calibration table (headerless CSV).
    pub sext_matrix_path: PathBuf,
    /// Octupole calibration table (headerless CSV).
    pub oct_matrix_path: PathBuf,
    /// Channel carrying the sextupole strength vector.
    pub sext_strengths_channel: String,
    /// Channel carrying the octupole strength vector.
    pub oct_strengths_channel: String,

    /// Beam-loss monitor sum channel.
    pub total_losses_channel: String,
    /// Lifetime channel, seconds.
    pub lifetime_channel: String,
    /// Horizontal emittance channel, m rad.
    pub emittance_h_channel: String,
    /// Vertical emittance channel, m rad.
    pub emittance_v_channel: String,

    /// Amplitude range applied to every knob without an override.
    pub knob_range: AmplitudeRange,
    /// Per-knob range overrides, keyed by knob name.
    pub knob_range_overrides: BTreeMap<String, AmplitudeRange>,

    /// Shot-sequence parameters.
    pub shot: ShotConfig,
    /// Reference conditions for the lifetime normalization.
    pub normalization: NormalizationRefs,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            wait_time_s: 1.0,
            acquisitions: 2,
            acquisition_interval_s: 2.0,
            sext_matrix_path: PathBuf::from("config/sext_knobs.csv"),
            oct_matrix_path: PathBuf::from("config/oct_knobs.csv"),
            sext_strengths_channel: catalog::SEXT_STRENGTHS.to_string(),
            oct_strengths_channel: catalog::OCT_STRENGTHS.to_string(),
            total_losses_channel: catalog::TOTAL_LOSSES.to_string(),
            lifetime_channel: catalog::LIFETIME.to_string(),
            emittance_h_channel: catalog::EMITTANCE_H.to_string(),
            emittance_v_channel: catalog::EMITTANCE_V.to_string(),
            knob_range: AmplitudeRange::default(),
            // The third sextupole knob moves a weaker pattern and is
            // allowed twice the travel.
            knob_range_overrides: BTreeMap::from([(
                "sext-2".to_string(),
                AmplitudeRange::new(-2.0, 2.0),
            )]),
            shot: ShotConfig::default(),
            normalization: NormalizationRefs::default(),
        }
    }
}

impl EnvConfig {
    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::info!(path = %path.display(), "environment config loaded");
        Ok(config)
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs_f64(self.wait_time_s)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.acquisition_interval_s)
    }

    /// Amplitude range for one knob, override first.
    pub fn knob_range_for(&self, knob: &str) -> AmplitudeRange {
        self.knob_range_overrides
            .get(knob)
            .copied()
            .unwrap_or(self.knob_range)
    }

    /// Channel set consulted per normalized lifetime sample.
    pub fn lifetime_channels(&self) -> LifetimeChannels {
        LifetimeChannels {
            lifetime: self.lifetime_channel.clone(),
            current: self.shot.guard_channel.clone(),
            emittance_h: self.emittance_h_channel.clone(),
            emittance_v: self.emittance_v_channel.clone(),
        }
    }
}
