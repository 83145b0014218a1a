//! Pure decision functions of the shot sequence.
//!
//! These take the freshly read device state and return what the driver
//! should do; they perform no effects themselves.

use crate::state::{KickerState, SupplyState};

/// What to do about the ramp at a start or stop point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampDecision {
    /// The supply is already where this step wants it.
    AlreadyThere,
    /// Issue the command now.
    Act,
    /// Let the transition settle first, then issue the command.
    SettleThenAct,
}

pub fn decide_ramp_start(supply: SupplyState) -> RampDecision {
    match supply {
        SupplyState::Ramping => RampDecision::AlreadyThere,
        SupplyState::Transitioning => RampDecision::SettleThenAct,
        SupplyState::Stopped => RampDecision::Act,
    }
}

pub fn decide_ramp_stop(supply: SupplyState) -> RampDecision {
    match supply {
        SupplyState::Stopped => RampDecision::AlreadyThere,
        SupplyState::Transitioning => RampDecision::SettleThenAct,
        SupplyState::Ramping => RampDecision::Act,
    }
}

/// Whether the kicker may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    Fire,
    /// Unexpected kicker state: drive everything to safe shutdown and
    /// abort.
    AbortShutdown,
}

pub fn decide_fire(kicker: KickerState) -> FireDecision {
    match kicker {
        KickerState::Standby => FireDecision::Fire,
        KickerState::Other => FireDecision::AbortShutdown,
    }
}

/// Beam-current guard, before the operator has been asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Above the limit: block on operator confirmation, then re-check.
    Confirm,
}

pub fn decide_guard(current: f64, limit: f64) -> GuardDecision {
    if current <= limit {
        GuardDecision::Proceed
    } else {
        GuardDecision::Confirm
    }
}

/// Beam-current guard after the operator acknowledged. There is nobody
/// left to ask; a reading still above the limit aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Proceed,
    Abort,
}

pub fn decide_guard_after_ack(current: f64, limit: f64) -> GuardVerdict {
    if current <= limit {
        GuardVerdict::Proceed
    } else {
        GuardVerdict::Abort
    }
}
