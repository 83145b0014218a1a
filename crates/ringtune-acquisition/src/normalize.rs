//! Touschek lifetime normalization.
//!
//! Strips the machine-condition dependence out of a measured lifetime
//! so that values taken at different currents and emittances are
//! comparable: the vacuum and single-bunch contributions are removed,
//! then the Touschek term is rescaled to reference current and
//! emittances, optionally to a reference bunch length and energy
//! spread.

use serde::{Deserialize, Serialize};

/// Reference machine conditions the lifetime is normalized to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationRefs {
    /// Reference total current, A.
    pub ref_current_a: f64,
    /// Reference horizontal emittance, m rad.
    pub ref_eh_m_rad: f64,
    /// Reference vertical emittance, m rad.
    pub ref_ev_m_rad: f64,
    /// Reference relative energy spread.
    pub ref_energy_spread: f64,
    /// Reference bunch length, m.
    pub ref_bunch_length_m: f64,
    /// Expected or measured vacuum lifetime, hours.
    pub vacuum_lifetime_h: f64,
}

impl Default for NormalizationRefs {
    fn default() -> Self {
        Self {
            ref_current_a: 0.200,
            ref_eh_m_rad: 140e-12,
            ref_ev_m_rad: 10e-12,
            ref_energy_spread: 1e-3,
            ref_bunch_length_m: 0.003,
            vacuum_lifetime_h: 120.0,
        }
    }
}

/// One lifetime measurement with the machine conditions it was taken
/// under.
#[derive(Debug, Clone)]
pub struct LifetimeObservation {
    /// Total measured lifetime, hours.
    pub lifetime_h: f64,
    /// Single-bunch lifetime, hours (ignored below the single-bunch
    /// current threshold).
    pub single_bunch_lifetime_h: f64,
    /// Total current at measurement time, A.
    pub current_a: f64,
    /// Single-bunch current, A.
    pub single_bunch_current_a: f64,
    /// Horizontal emittance, m rad.
    pub eh_m_rad: f64,
    /// Vertical emittance, m rad.
    pub ev_m_rad: f64,
    /// Measured relative energy spread, when available.
    pub energy_spread: Option<f64>,
    /// Measured or expected bunch length, m, when available.
    pub bunch_length_m: Option<f64>,
}

/// Single-bunch current threshold above which the single-bunch
/// contribution is subtracted, A.
const SINGLE_BUNCH_THRESHOLD_A: f64 = 0.003;

/// Vertical emittances below this are treated as measurement noise.
const EV_FLOOR_M_RAD: f64 = 0.01e-12;

/// Normalized Touschek lifetime, hours.
pub fn normalize_lifetime(obs: &LifetimeObservation, refs: &NormalizationRefs) -> f64 {
    let mut ev = obs.ev_m_rad;
    if ev < EV_FLOOR_M_RAD {
        tracing::warn!(ev_m_rad = ev, "vertical emittance too small, clamping to 0.1 pm rad");
        ev = 0.1e-12;
    }

    let i = obs.current_a;
    let touschek = if obs.single_bunch_current_a > SINGLE_BUNCH_THRESHOLD_A {
        i / (i / obs.lifetime_h
            - obs.single_bunch_current_a / obs.single_bunch_lifetime_h
            - i / refs.vacuum_lifetime_h)
    } else {
        i / (i / obs.lifetime_h - i / refs.vacuum_lifetime_h)
    };

    let mut lt = touschek * i / refs.ref_current_a;
    lt = lt / ev.sqrt() * refs.ref_ev_m_rad.sqrt();
    lt = lt / obs.eh_m_rad.sqrt() * refs.ref_eh_m_rad.sqrt();

    if let Some(bl) = obs.bunch_length_m {
        lt = lt / bl * refs.ref_bunch_length_m;
    }

    if let Some(spread) = obs.energy_spread {
        // The upstream analysis argues this correction is redundant,
        // yet applies it whenever a measured spread is supplied. Both
        // behaviors are kept as-is.
        lt = lt / spread * refs.ref_energy_spread;
    }

    lt
}

/// Loss-monitor reading rescaled to the session's reference current:
/// `loss * (reference / current)^2`.
pub fn scaled_total_losses(loss: f64, reference_current: f64, current: f64) -> f64 {
    loss * (reference_current / current).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> LifetimeObservation {
        LifetimeObservation {
            lifetime_h: 22.0,
            single_bunch_lifetime_h: 5.0,
            current_a: 0.194,
            single_bunch_current_a: 0.006,
            eh_m_rad: 122e-12,
            ev_m_rad: 10e-12,
            energy_spread: None,
            bunch_length_m: None,
        }
    }

    #[test]
    fn reference_conditions_reduce_to_the_touschek_term() {
        // At exactly the reference current and emittances with no
        // vacuum contribution, the normalization is the identity on
        // the Touschek lifetime.
        let refs = NormalizationRefs {
            vacuum_lifetime_h: f64::INFINITY,
            ..NormalizationRefs::default()
        };
        let obs = LifetimeObservation {
            lifetime_h: 15.0,
            single_bunch_lifetime_h: 0.0,
            current_a: refs.ref_current_a,
            single_bunch_current_a: 0.0,
            eh_m_rad: refs.ref_eh_m_rad,
            ev_m_rad: refs.ref_ev_m_rad,
            energy_spread: None,
            bunch_length_m: None,
        };
        let lt = normalize_lifetime(&obs, &refs);
        assert!((lt - 15.0).abs() < 1e-9);
    }

    #[test]
    fn single_bunch_contribution_is_subtracted_above_threshold() {
        let refs = NormalizationRefs::default();
        let with = normalize_lifetime(&observation(), &refs);
        let without = normalize_lifetime(
            &LifetimeObservation {
                single_bunch_current_a: 0.001,
                ..observation()
            },
            &refs,
        );
        // Removing a loss channel leaves a longer pure-Touschek
        // lifetime.
        assert!(with > without);
    }

    #[test]
    fn halving_vertical_emittance_scales_by_sqrt_two() {
        let refs = NormalizationRefs::default();
        let base = normalize_lifetime(&observation(), &refs);
        let halved = normalize_lifetime(
            &LifetimeObservation {
                ev_m_rad: 5e-12,
                ..observation()
            },
            &refs,
        );
        assert!((halved / base - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn tiny_vertical_emittance_is_clamped() {
        let refs = NormalizationRefs::default();
        let clamped = normalize_lifetime(
            &LifetimeObservation {
                ev_m_rad: 0.0,
                ..observation()
            },
            &refs,
        );
        let explicit = normalize_lifetime(
            &LifetimeObservation {
                ev_m_rad: 0.1e-12,
                ..observation()
            },
            &refs,
        );
        assert!((clamped - explicit).abs() < 1e-9);
    }

    #[test]
    fn energy_spread_path_applies_when_supplied() {
        let refs = NormalizationRefs::default();
        let plain = normalize_lifetime(&observation(), &refs);
        let spread = normalize_lifetime(
            &LifetimeObservation {
                energy_spread: Some(2e-3),
                ..observation()
            },
            &refs,
        );
        assert!((spread - plain / 2.0).abs() < 1e-9);
    }

    #[test]
    fn loss_scaling_is_quadratic_in_current_ratio() {
        assert!((scaled_total_losses(8.0, 200.0, 100.0) - 32.0).abs() < 1e-12);
        assert!((scaled_total_losses(8.0, 100.0, 100.0) - 8.0).abs() < 1e-12);
    }
}
