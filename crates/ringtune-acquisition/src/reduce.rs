//! Timed sampling and reduction.

use crate::normalize::{normalize_lifetime, LifetimeObservation, NormalizationRefs};
use ringtune_channels::{ChannelError, HardwareContext, Sample, DEFAULT_RW_BACKOFF};
use std::time::Duration;

/// Mean of `count` raw readings of `channel`, sleeping `interval`
/// between consecutive readings only — `count - 1` sleeps, none when
/// `count == 1`. No validity filtering on this path.
pub fn sample_mean(
    ctx: &mut HardwareContext,
    channel: &str,
    count: u32,
    interval: Duration,
) -> Result<f64, ChannelError> {
    let count = count.max(1);
    let mut sum = 0.0;
    for i in 0..count {
        if i > 0 {
            ctx.sleep(interval);
        }
        sum += ctx.read_scalar_retry(channel, DEFAULT_RW_BACKOFF)?;
    }
    Ok(sum / count as f64)
}

/// Mean of the valid samples in a history window; 0.0 when none is
/// valid. Invalid samples are dropped, never zero-filled.
pub fn valid_mean(samples: &[Sample]) -> f64 {
    let valid: Vec<f64> = samples
        .iter()
        .filter(|s| s.is_valid())
        .map(|s| s.value.unwrap_or_default())
        .collect();
    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Channels consulted per normalized lifetime sample.
#[derive(Debug, Clone)]
pub struct LifetimeChannels {
    /// Lifetime, seconds.
    pub lifetime: String,
    /// Total current, mA.
    pub current: String,
    /// Horizontal emittance, m rad.
    pub emittance_h: String,
    /// Vertical emittance, m rad.
    pub emittance_v: String,
}

/// Mean of `count` normalized lifetime samples. Each sample reads the
/// lifetime together with the auxiliary current and emittance channels
/// and normalizes before averaging; sleeps follow the same
/// between-samples-only rule as [`sample_mean`].
pub fn normalized_lifetime_mean(
    ctx: &mut HardwareContext,
    channels: &LifetimeChannels,
    refs: &NormalizationRefs,
    count: u32,
    interval: Duration,
) -> Result<f64, ChannelError> {
    let count = count.max(1);
    let mut sum = 0.0;
    for i in 0..count {
        if i > 0 {
            ctx.sleep(interval);
        }
        let current_ma = ctx.read_scalar_retry(&channels.current, DEFAULT_RW_BACKOFF)?;
        let eh = ctx.read_scalar_retry(&channels.emittance_h, DEFAULT_RW_BACKOFF)?;
        let ev = ctx.read_scalar_retry(&channels.emittance_v, DEFAULT_RW_BACKOFF)?;
        let lifetime_s = ctx.read_scalar_retry(&channels.lifetime, DEFAULT_RW_BACKOFF)?;

        let obs = LifetimeObservation {
            lifetime_h: lifetime_s / 3600.0,
            single_bunch_lifetime_h: 0.0,
            current_a: current_ma / 1e3,
            single_bunch_current_a: 0.0,
            eh_m_rad: eh,
            ev_m_rad: ev,
            energy_spread: None,
            bunch_length_m: None,
        };
        let normalized = normalize_lifetime(&obs, refs);
        tracing::debug!(sample = i, normalized, "normalized lifetime sample");
        sum += normalized;
    }
    Ok(sum / count as f64)
}
