//! Integration test: operator drive cycles through the full simulator.
//!
//! Spin-up, coasting with the engine off, forced braking to the crawl floor,
//! zero-length frames and session reset.

use rail_common::config::{MotionConfig, SimConfig};
use rail_common::settings::TrainSettings;
use rail_common::state::ThrottleBrakePolicy;
use rail_control::input::{ControlAction, HeldControls, InputFrame};
use rail_control::motion::{MotionInputs, MotionModel};

use super::{DT, brake, default_sim, press, recorded_sim, spin_up, throttle};

fn scenario_settings() -> TrainSettings {
    TrainSettings {
        maximum_speed: 0.4,
        acceleration: 0.02,
        maximum_acceleration: 0.05,
        acceleration_factor: 0.01,
        ..TrainSettings::default()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn throttle_from_rest_increases_toward_max() {
    let (mut sim, _log) = recorded_sim(&SimConfig::default(), &scenario_settings());
    sim.tick(DT, &press(ControlAction::ToggleEngine));

    let mut previous = sim.speed();
    for _ in 0..100 {
        sim.tick(DT, &throttle());
        assert!(sim.speed() > previous);
        assert!(sim.speed() <= 0.4);
        previous = sim.speed();
    }

    // Keep going: saturates at the ceiling, never above.
    for _ in 0..5_000 {
        sim.tick(DT, &throttle());
        assert!(sim.speed() <= 0.4);
        assert!(sim.motion().acceleration <= 0.05);
    }
    assert!((sim.speed() - 0.4).abs() < 1e-12);
}

#[test]
fn progress_accumulates_speed() {
    let (mut sim, _log) = default_sim();
    sim.tick(DT, &press(ControlAction::ToggleEngine));

    let mut expected = 0.0;
    for _ in 0..200 {
        sim.tick(DT, &throttle());
        expected += sim.speed();
    }
    assert!((sim.progress() - expected).abs() < 1e-9);
}

#[test]
fn engine_off_decays_to_zero_and_stays() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.1);
    sim.tick(DT, &press(ControlAction::ToggleEngine));
    assert!(!sim.flags().engine_on);

    let gravity = sim.motion().gravity_braking_factor;
    let mut previous = sim.speed();
    while previous > 0.0 {
        sim.tick(DT, &InputFrame::idle());
        let expected = (previous - gravity * DT).max(0.0);
        assert!((sim.speed() - expected).abs() < 1e-12);
        previous = sim.speed();
    }
    for _ in 0..50 {
        sim.tick(DT, &InputFrame::idle());
        assert_eq!(sim.speed(), 0.0);
    }
}

#[test]
fn forced_braking_converges_to_crawl_floor() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.4);
    sim.toggle_forced_braking();

    for _ in 0..2_000 {
        sim.tick(DT, &throttle());
        assert!(sim.speed() >= 0.2);
    }
    assert!((sim.speed() - 0.2).abs() < 1e-12);

    // Releasing the override hands control back to the throttle.
    sim.toggle_forced_braking();
    sim.tick(DT, &throttle());
    assert!(sim.speed() > 0.2);
}

#[test]
fn forced_braking_below_floor_never_raises_speed() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.05);
    let start = sim.speed();
    assert!(start < 0.2);

    sim.toggle_forced_braking();
    for _ in 0..100 {
        sim.tick(DT, &InputFrame::idle());
        assert!(sim.speed() <= start);
    }
}

#[test]
fn zero_dt_frames_are_idempotent() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.1);
    let motion = *sim.motion();
    let progress = sim.progress();
    let voices = sim.sound().voice_count();

    for frame in [throttle(), brake(), InputFrame::holding(HeldControls::all())] {
        sim.tick(0.0, &frame);
        assert_eq!(*sim.motion(), motion);
        assert_eq!(sim.progress(), progress);
        assert_eq!(sim.sound().voice_count(), voices);
    }
}

#[test]
fn reset_mid_drive_restores_rest_state() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.2);
    sim.tick(DT, &brake());
    sim.toggle_forced_braking();
    sim.tick(DT, &press(ControlAction::Reset));

    let m = sim.motion();
    let defaults = TrainSettings::default();
    assert_eq!(m.speed, 0.0);
    assert_eq!(m.acceleration, defaults.acceleration);
    assert_eq!(m.braking_speed, defaults.braking_speed);
    assert!(!m.engine_on && !m.forced_braking && !m.stopping_at_station && !m.braking);
    assert_eq!(sim.progress(), 0.0);
    assert_eq!(sim.sound().voice_count(), 0);
}

#[test]
fn brake_priority_ignores_throttle_while_braking() {
    let settings = TrainSettings::default();
    let dual = MotionConfig::default();
    let priority = MotionConfig {
        throttle_brake_policy: ThrottleBrakePolicy::BrakePriority,
        ..MotionConfig::default()
    };
    let both = MotionInputs {
        throttle_held: true,
        brake_held: true,
        engine_on: true,
        ..MotionInputs::default()
    };
    let go = MotionInputs {
        throttle_held: true,
        engine_on: true,
        ..MotionInputs::default()
    };

    let mut a = MotionModel::new(&settings, &dual);
    let mut b = MotionModel::new(&settings, &priority);
    for _ in 0..300 {
        a.tick(DT, &go);
        b.tick(DT, &go);
    }
    assert_eq!(a.speed(), b.speed());

    let ta = a.tick(DT, &both);
    let tb = b.tick(DT, &both);
    assert!(ta.throttling && ta.braking);
    assert!(!tb.throttling && tb.braking);
    assert!(b.speed() < a.speed());
}

#[test]
fn brake_priority_config_reaches_simulator() {
    let mut config = SimConfig::default();
    config.motion.throttle_brake_policy = ThrottleBrakePolicy::BrakePriority;
    let (mut sim, _log) = recorded_sim(&config, &TrainSettings::default());
    spin_up(&mut sim, 0.1);

    let before = sim.speed();
    sim.tick(DT, &InputFrame::holding(HeldControls::all()));
    assert!(sim.speed() < before);
    assert!(!sim.last_tick().throttling);
}
