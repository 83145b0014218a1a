//! The observables an environment can be asked to measure.

use crate::error::EnvError;
use std::fmt;

/// One measurable quantity. The string names are the identifiers the
/// optimizer requests observables by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observable {
    /// Injection efficiency via a full shot sequence.
    InjEffShooting,
    /// Injection efficiency sampled from the live diagnostic during
    /// continuous injection.
    InjEffContinuous,
    /// Beam-loss monitor sum, rescaled to the session's reference
    /// current.
    TotalLosses,
    /// Raw lifetime scaled by the current ratio to the reference.
    LiberaLifetime,
    /// Touschek-normalized lifetime.
    NormalizedLiberaLifetime,
}

impl Observable {
    pub const ALL: [Observable; 5] = [
        Observable::InjEffShooting,
        Observable::InjEffContinuous,
        Observable::TotalLosses,
        Observable::LiberaLifetime,
        Observable::NormalizedLiberaLifetime,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Observable::InjEffShooting => "inj_eff_shooting",
            Observable::InjEffContinuous => "inj_eff_continuous",
            Observable::TotalLosses => "total_losses",
            Observable::LiberaLifetime => "libera_lifetime",
            Observable::NormalizedLiberaLifetime => "normalized_libera_lifetime",
        }
    }

    pub fn parse(name: &str) -> Result<Self, EnvError> {
        Self::ALL
            .into_iter()
            .find(|o| o.name() == name)
            .ok_or_else(|| EnvError::UnknownObservable(name.to_string()))
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
