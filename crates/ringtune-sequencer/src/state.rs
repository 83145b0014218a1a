//! Sequencer views of device state.
//!
//! Each subsystem exposes only the distinctions the sequence branches
//! on; everything else collapses to the conservative default.

use ringtune_channels::DeviceState;

/// Ramping supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyState {
    Stopped,
    Ramping,
    /// Mid-transition between stopped and ramping.
    Transitioning,
}

impl SupplyState {
    pub fn from_device(state: DeviceState) -> Self {
        match state {
            DeviceState::Running => SupplyState::Ramping,
            DeviceState::Moving => SupplyState::Transitioning,
            _ => SupplyState::Stopped,
        }
    }
}

/// Particle source (electron gun).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Off,
    On,
}

impl SourceState {
    pub fn from_device(state: DeviceState) -> Self {
        match state {
            DeviceState::On => SourceState::On,
            _ => SourceState::Off,
        }
    }
}

/// Injection kicker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickerState {
    Standby,
    /// Anything but standby: firing is not allowed.
    Other,
}

impl KickerState {
    pub fn from_device(state: DeviceState) -> Self {
        match state {
            DeviceState::Standby => KickerState::Standby,
            _ => KickerState::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supply_mapping() {
        assert_eq!(
            SupplyState::from_device(DeviceState::Running),
            SupplyState::Ramping
        );
        assert_eq!(
            SupplyState::from_device(DeviceState::Moving),
            SupplyState::Transitioning
        );
        assert_eq!(
            SupplyState::from_device(DeviceState::On),
            SupplyState::Stopped
        );
        assert_eq!(
            SupplyState::from_device(DeviceState::Unknown),
            SupplyState::Stopped
        );
    }

    #[test]
    fn kicker_collapses_everything_but_standby() {
        assert_eq!(
            KickerState::from_device(DeviceState::Standby),
            KickerState::Standby
        );
        for s in [
            DeviceState::On,
            DeviceState::Off,
            DeviceState::Running,
            DeviceState::Fault,
        ] {
            assert_eq!(KickerState::from_device(s), KickerState::Other);
        }
    }
}
