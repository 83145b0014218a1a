//! End-to-end shot sequence runs against the scripted bus.

use chrono::Utc;
use ringtune_channels::mock::{BusOp, CountingPrompt, PromptLog, RecordingSleeper, ScriptedBus, SleepLog};
use ringtune_channels::{ChannelValue, DeviceCommand, DeviceState, HardwareContext, Sample};
use ringtune_sequencer::sequencer::KILL_BEAM_PROMPT;
use ringtune_sequencer::{SequenceError, ShotConfig, ShotSequencer};
use std::time::Duration;

struct Rig {
    bus: ScriptedBus,
    ctx: HardwareContext,
    sleeps: SleepLog,
    prompts: PromptLog,
    config: ShotConfig,
}

/// Healthy ring at rest: low current, supply stopped, gun off, kicker
/// in standby, a diagnostic window of two valid and two invalid shots.
fn make_rig() -> Rig {
    let config = ShotConfig::default();
    let bus = ScriptedBus::new();
    bus.set_value(&config.guard_channel, 120.0.into());
    bus.set_value(&config.shot_register, 1.0.into());
    bus.set_state(&config.supply_device, DeviceState::On);
    bus.set_state(&config.source_device, DeviceState::Off);
    bus.set_state(&config.kicker_device, DeviceState::Standby);

    let ts = Utc::now();
    bus.set_history(
        &config.diagnostic_channel,
        vec![
            Sample::new(ts, Some(90.0)),
            Sample::new(ts, None),
            Sample::new(ts, Some(0.0)),
            Sample::new(ts, Some(80.0)),
        ],
    );

    let (sleeper, sleeps) = RecordingSleeper::new();
    let (prompt, prompts) = CountingPrompt::new();
    let ctx = HardwareContext::new(Box::new(bus.clone()), Box::new(sleeper), Box::new(prompt));
    Rig {
        bus,
        ctx,
        sleeps,
        prompts,
        config,
    }
}

#[test]
fn full_run_returns_mean_of_valid_shots() {
    let mut rig = make_rig();
    let sequencer = ShotSequencer::new(rig.config.clone());

    let efficiency = sequencer.run(&mut rig.ctx).unwrap();
    assert_eq!(efficiency, 85.0);

    // Devices back at rest.
    assert_eq!(rig.bus.device_state(&rig.config.supply_device), DeviceState::On);
    assert_eq!(rig.bus.device_state(&rig.config.source_device), DeviceState::Off);
    assert_eq!(rig.bus.device_state(&rig.config.kicker_device), DeviceState::Standby);
    assert!(rig.prompts.borrow().is_empty());
}

#[test]
fn full_run_command_order() {
    let mut rig = make_rig();
    let sequencer = ShotSequencer::new(rig.config.clone());
    sequencer.run(&mut rig.ctx).unwrap();

    let commands: Vec<(String, DeviceCommand)> = rig
        .bus
        .journal()
        .into_iter()
        .filter_map(|op| match op {
            BusOp::Command(d, c) => Some((d, c)),
            _ => None,
        })
        .collect();

    assert_eq!(
        commands,
        vec![
            (rig.config.supply_device.clone(), DeviceCommand::StartRamping),
            (rig.config.source_device.clone(), DeviceCommand::On),
            (rig.config.kicker_device.clone(), DeviceCommand::On),
            (rig.config.kicker_device.clone(), DeviceCommand::Standby),
            (rig.config.supply_device.clone(), DeviceCommand::StopRamping),
            (rig.config.source_device.clone(), DeviceCommand::Off),
        ]
    );
}

#[test]
fn full_run_waits_for_settle_and_pulse_train() {
    let mut rig = make_rig();
    let sequencer = ShotSequencer::new(rig.config.clone());
    sequencer.run(&mut rig.ctx).unwrap();

    // Post-start settle, then the 0.25 * 10 + 1.0 s pulse train.
    assert_eq!(
        rig.sleeps.borrow().as_slice(),
        &[Duration::from_secs_f64(1.0), Duration::from_secs_f64(3.5)]
    );
}

#[test]
fn shot_register_is_saved_and_restored() {
    let mut rig = make_rig();
    rig.bus.set_value(&rig.config.shot_register, 3.0.into());
    let sequencer = ShotSequencer::new(rig.config.clone());
    sequencer.run(&mut rig.ctx).unwrap();

    let writes: Vec<ChannelValue> = rig
        .bus
        .journal()
        .into_iter()
        .filter_map(|op| match op {
            BusOp::Write(c, v) if c == rig.config.shot_register => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(
        writes,
        vec![ChannelValue::Scalar(10.0), ChannelValue::Scalar(3.0)]
    );
    assert_eq!(
        rig.bus.last_written(&rig.config.shot_register),
        Some(ChannelValue::Scalar(3.0))
    );
}

#[test]
fn high_current_blocks_until_operator_clears_it() {
    let mut rig = make_rig();
    // Above the limit at first, cleared by the time of the re-read.
    rig.bus.push_value(&rig.config.guard_channel, 250.0.into());
    let sequencer = ShotSequencer::new(rig.config.clone());

    let efficiency = sequencer.run(&mut rig.ctx).unwrap();
    assert_eq!(efficiency, 85.0);
    assert_eq!(rig.prompts.borrow().as_slice(), &[KILL_BEAM_PROMPT.to_string()]);
}

#[test]
fn persistent_high_current_aborts_without_touching_devices() {
    let mut rig = make_rig();
    rig.bus.set_value(&rig.config.guard_channel, 250.0.into());
    let sequencer = ShotSequencer::new(rig.config.clone());

    let err = sequencer.run(&mut rig.ctx).unwrap_err();
    assert!(matches!(
        err,
        SequenceError::SafetyAbort { current, limit } if current == 250.0 && limit == 198.0
    ));
    assert_eq!(rig.prompts.borrow().len(), 1);

    // The guard aborts before any device is commanded.
    for op in rig.bus.journal() {
        assert!(matches!(op, BusOp::Read(_)), "unexpected operation {op:?}");
    }
}

#[test]
fn unexpected_kicker_state_unwinds_to_safe_shutdown() {
    let mut rig = make_rig();
    rig.bus.set_state(&rig.config.kicker_device, DeviceState::On);
    let sequencer = ShotSequencer::new(rig.config.clone());

    let err = sequencer.run(&mut rig.ctx).unwrap_err();
    assert!(matches!(err, SequenceError::UnexpectedKickerState));

    // The kicker never fired: the shot register was left alone.
    assert!(rig.bus.last_written(&rig.config.shot_register).is_none());

    // Ramp stopped, gun off, kicker parked.
    assert_eq!(
        rig.bus.commands_for(&rig.config.supply_device),
        vec![DeviceCommand::StartRamping, DeviceCommand::StopRamping]
    );
    assert_eq!(
        rig.bus.commands_for(&rig.config.source_device),
        vec![DeviceCommand::On, DeviceCommand::Off]
    );
    assert_eq!(
        rig.bus.commands_for(&rig.config.kicker_device),
        vec![DeviceCommand::Standby]
    );
}

#[test]
fn ramp_start_is_retried_once_after_a_failure() {
    let mut rig = make_rig();
    rig.bus
        .fail_command(&rig.config.supply_device, DeviceCommand::StartRamping, 1);
    let sequencer = ShotSequencer::new(rig.config.clone());

    sequencer.run(&mut rig.ctx).unwrap();
    assert_eq!(
        rig.bus.commands_for(&rig.config.supply_device),
        vec![
            DeviceCommand::StartRamping,
            DeviceCommand::StartRamping,
            DeviceCommand::StopRamping,
        ]
    );
    // The retry back-off comes before the settle and the pulse train.
    assert_eq!(rig.sleeps.borrow()[0], Duration::from_secs_f64(5.0));
}

#[test]
fn kicker_failure_gets_a_reset_before_the_retry() {
    let mut rig = make_rig();
    rig.bus
        .fail_command(&rig.config.kicker_device, DeviceCommand::On, 1);
    let sequencer = ShotSequencer::new(rig.config.clone());

    sequencer.run(&mut rig.ctx).unwrap();
    assert_eq!(
        rig.bus.commands_for(&rig.config.kicker_device),
        vec![
            DeviceCommand::On,
            DeviceCommand::Reset,
            DeviceCommand::On,
            DeviceCommand::Standby,
        ]
    );
}

#[test]
fn already_ramping_supply_is_left_alone_on_start() {
    let mut rig = make_rig();
    rig.bus
        .set_state(&rig.config.supply_device, DeviceState::Running);
    let sequencer = ShotSequencer::new(rig.config.clone());

    sequencer.run(&mut rig.ctx).unwrap();
    // No StartRamping: the sequence picked up the ramp already running.
    assert_eq!(
        rig.bus.commands_for(&rig.config.supply_device),
        vec![DeviceCommand::StopRamping]
    );
}

#[test]
fn empty_diagnostic_window_reduces_to_zero() {
    let mut rig = make_rig();
    rig.bus.set_history(&rig.config.diagnostic_channel, vec![]);
    let sequencer = ShotSequencer::new(rig.config.clone());

    assert_eq!(sequencer.run(&mut rig.ctx).unwrap(), 0.0);
}
