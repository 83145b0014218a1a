//! Canonical channel and device names of the storage-ring control
//! system. Environments default to these; every name can be overridden
//! through configuration.

/// Ramping power-supply manager driven during injection.
pub const RAMPING_SUPPLY: &str = "sy/ps-rips/manager";

/// Electron gun run control.
pub const ELECTRON_GUN: &str = "elin/beam/run";

/// Injection kicker / extraction pulser.
pub const INJECTION_KICKER: &str = "sy/ps-ke/1";

/// Shot-count register of the injection kicker.
pub const KICKER_SHOT_REGISTER: &str = "sy/ps-ke/1/CounterMode";

/// Total stored beam current, in mA.
pub const BEAM_CURRENT_TOTAL: &str = "srdiag/beam-current/total/Current";

/// Injection efficiency diagnostic.
pub const INJECTION_EFFICIENCY: &str = "srdiag/trefflite/sy-sr/InjectionEfficiency";

/// Summed beam-loss monitor reading.
pub const TOTAL_LOSSES: &str = "srdiag/blm/all/TotalLoss";

/// Beam lifetime from the BPM system, in seconds.
pub const LIFETIME: &str = "srdiag/bpm/lifetime/Lifetime";

/// Horizontal emittance at the reference source point, in m rad.
pub const EMITTANCE_H: &str = "srdiag/emittance/id25/Emittance_h";

/// Vertical emittance at the reference source point, in m rad.
pub const EMITTANCE_V: &str = "srdiag/emittance/id25/Emittance_v";

/// Sextupole correction strength table (one entry per magnet).
pub const SEXT_STRENGTHS: &str = "srmag/m-s/all/CorrectionStrengths";

/// Octupole correction strength table (one entry per magnet).
pub const OCT_STRENGTHS: &str = "srmag/m-o/all/CorrectionStrengths";
