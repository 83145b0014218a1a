//! Shot sequence configuration.

use ringtune_channels::catalog;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Devices, channels and timing of one shot sequence. All fields have
/// storage-ring defaults and can be overridden from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotConfig {
    /// Ramping supply manager device.
    pub supply_device: String,
    /// Particle source (gun) device.
    pub source_device: String,
    /// Injection kicker device.
    pub kicker_device: String,
    /// Shot-count register of the kicker.
    pub shot_register: String,
    /// Total beam current channel, mA.
    pub guard_channel: String,
    /// Injection efficiency diagnostic channel.
    pub diagnostic_channel: String,
    /// Shots per train.
    pub number_of_shots: u32,
    /// Beam current above which injection requires operator
    /// intervention, mA.
    pub beam_current_limit: f64,
    /// History window consulted for the result.
    pub history_depth: usize,
    /// Settle wait around supply transitions, seconds.
    pub settle_s: f64,
    /// Back-off before the single ramp command retry, seconds.
    pub ramp_retry_backoff_s: f64,
    /// Back-off before the single kicker command retry, seconds.
    pub kicker_retry_backoff_s: f64,
    /// Back-off before the single read/write retry, seconds.
    pub read_retry_backoff_s: f64,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            supply_device: catalog::RAMPING_SUPPLY.to_string(),
            source_device: catalog::ELECTRON_GUN.to_string(),
            kicker_device: catalog::INJECTION_KICKER.to_string(),
            shot_register: catalog::KICKER_SHOT_REGISTER.to_string(),
            guard_channel: catalog::BEAM_CURRENT_TOTAL.to_string(),
            diagnostic_channel: catalog::INJECTION_EFFICIENCY.to_string(),
            number_of_shots: 10,
            beam_current_limit: 198.0,
            history_depth: 50,
            settle_s: 1.0,
            ramp_retry_backoff_s: 5.0,
            kicker_retry_backoff_s: 0.5,
            read_retry_backoff_s: 2.0,
        }
    }
}

impl ShotConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle_s)
    }

    pub fn ramp_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.ramp_retry_backoff_s)
    }

    pub fn kicker_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.kicker_retry_backoff_s)
    }

    pub fn read_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.read_retry_backoff_s)
    }

    /// Physical pulse-train duration: `0.25 * n_shots + 1.0` seconds.
    pub fn shot_wait(&self) -> Duration {
        Duration::from_secs_f64(0.25 * self.number_of_shots as f64 + 1.0)
    }
}
