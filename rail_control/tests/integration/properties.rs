//! Property tests: motion invariants over arbitrary input sequences.

use proptest::prelude::*;

use rail_common::config::{MotionConfig, SimConfig};
use rail_common::settings::TrainSettings;
use rail_common::state::ThrottleBrakePolicy;
use rail_control::input::{ControlAction, HeldControls, InputFrame};
use rail_control::motion::{MotionInputs, MotionModel};

use super::recorded_sim;

fn inputs_strategy() -> impl Strategy<Value = MotionInputs> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(throttle_held, brake_held, engine_on, forced_braking, stopping_at_station)| MotionInputs {
            throttle_held,
            brake_held,
            engine_on,
            forced_braking,
            stopping_at_station,
        },
    )
}

fn policy_strategy() -> impl Strategy<Value = ThrottleBrakePolicy> {
    prop_oneof![
        Just(ThrottleBrakePolicy::DualApply),
        Just(ThrottleBrakePolicy::BrakePriority),
    ]
}

fn frame_strategy() -> impl Strategy<Value = InputFrame> {
    (
        0u8..4,
        prop::collection::vec(
            prop_oneof![
                Just(ControlAction::ToggleEngine),
                Just(ControlAction::ToggleLights),
                Just(ControlAction::Horn),
                Just(ControlAction::ToggleForcedBraking),
                Just(ControlAction::StationStop),
                Just(ControlAction::CancelStationStop),
            ],
            0..2,
        ),
    )
        .prop_map(|(bits, pressed)| InputFrame {
            held: HeldControls::from_bits_truncate(bits),
            pressed,
        })
}

proptest! {
    /// Property: speed and rates never leave their bounds.
    #[test]
    fn prop_motion_stays_within_ceilings(
        steps in prop::collection::vec((inputs_strategy(), 0.0f64..0.1), 1..400),
        policy in policy_strategy(),
    ) {
        let settings = TrainSettings::default();
        let config = MotionConfig { throttle_brake_policy: policy, ..MotionConfig::default() };
        let mut model = MotionModel::new(&settings, &config);

        for (inputs, dt) in steps {
            model.tick(dt, &inputs);
            let s = model.state();
            prop_assert!(s.speed >= 0.0);
            prop_assert!(s.speed <= s.maximum_speed);
            prop_assert!(s.acceleration <= s.maximum_acceleration);
            prop_assert!(s.braking_speed <= s.maximum_braking_speed);
        }
    }

    /// Property: a zero-length tick never changes state.
    #[test]
    fn prop_zero_dt_is_idempotent(
        warmup in prop::collection::vec((inputs_strategy(), 0.0f64..0.1), 0..200),
        held in inputs_strategy(),
    ) {
        let mut model = MotionModel::new(&TrainSettings::default(), &MotionConfig::default());
        for (inputs, dt) in warmup {
            model.tick(dt, &inputs);
        }
        let before = *model.state();
        model.tick(0.0, &held);
        model.tick(0.0, &held);
        prop_assert_eq!(*model.state(), before);
    }

    /// Property: reset restores rest state regardless of history.
    #[test]
    fn prop_reset_restores_rest_state(
        history in prop::collection::vec((inputs_strategy(), 0.0f64..0.1), 0..300),
    ) {
        let settings = TrainSettings::default();
        let mut model = MotionModel::new(&settings, &MotionConfig::default());
        for (inputs, dt) in history {
            model.tick(dt, &inputs);
        }
        model.reset();
        let s = model.state();
        prop_assert_eq!(s.speed, 0.0);
        prop_assert_eq!(s.acceleration, settings.acceleration);
        prop_assert_eq!(s.braking_speed, settings.braking_speed);
        prop_assert!(!s.engine_on && !s.forced_braking && !s.stopping_at_station && !s.braking);
    }

    /// Property: speed never rises unless the throttle rule ran.
    #[test]
    fn prop_speed_rises_only_when_throttling(
        steps in prop::collection::vec((inputs_strategy(), 0.0f64..0.1), 1..300),
    ) {
        let mut model = MotionModel::new(&TrainSettings::default(), &MotionConfig::default());
        for (inputs, dt) in steps {
            let before = model.speed();
            let tick = model.tick(dt, &inputs);
            if !tick.throttling {
                prop_assert!(model.speed() <= before);
            }
        }
    }

    /// Property: the full simulator keeps motion bounds and a sane loop
    /// registry under arbitrary frames.
    #[test]
    fn prop_simulator_invariants(
        frames in prop::collection::vec(frame_strategy(), 1..300),
    ) {
        let mut config = SimConfig::default();
        config.controls.dev_mode = true;
        let (mut sim, _log) = recorded_sim(&config, &TrainSettings::default());

        for frame in &frames {
            sim.tick(super::DT, frame);
            let m = sim.motion();
            prop_assert!(m.speed >= 0.0 && m.speed <= m.maximum_speed);
            prop_assert!(sim.sound().loop_count() <= 2);
            prop_assert!(sim.progress() >= 0.0);
            if sim.sound().get_loop("engine").is_some() {
                prop_assert!(sim.flags().engine_on);
            }
        }
    }
}
