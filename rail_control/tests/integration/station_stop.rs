//! Integration test: station stop from cruising speed.
//!
//! Validates the full sequence through the simulator tick loop:
//! 1. Forced braking with a zero floor until exact standstill
//! 2. Dwell, then the door sound
//! 3. Door clip elapsed → flags released, session dropped
//! 4. Cancellation and rejection paths

use rail_common::config::SimConfig;
use rail_common::settings::TrainSettings;
use rail_common::state::StationStopPhase;
use rail_control::input::{ControlAction, InputFrame};
use rail_control::station::SequenceError;

use super::{DT, default_sim, press, recorded_sim, spin_up, throttle};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn stop_from_cruise_holds_only_at_standstill() {
    let (mut sim, log) = default_sim();
    spin_up(&mut sim, 0.3);
    sim.do_station_stop().unwrap();
    assert_eq!(sim.station_phase(), Some(StationStopPhase::Decelerating));

    let mut elapsed = 0.0;
    let mut decel_time = None;
    let mut door_time = None;

    for _ in 0..5_000 {
        // Throttle held while stopping is overridden by the forced brake.
        let frame = if sim.station_phase() == Some(StationStopPhase::Decelerating) {
            throttle()
        } else {
            InputFrame::idle()
        };
        sim.tick(DT, &frame);
        elapsed += DT;

        match sim.station_phase() {
            Some(StationStopPhase::Decelerating) => assert!(sim.speed() > 0.0),
            Some(StationStopPhase::Holding) => {
                assert_eq!(sim.speed(), 0.0);
                decel_time.get_or_insert(elapsed);
            }
            _ => {}
        }
        if door_time.is_none() && log.spawn_count("door") == 1 {
            door_time = Some(elapsed);
        }
        if sim.station_phase().is_none() {
            break;
        }
    }

    let decel_time = decel_time.expect("never reached Holding");
    let door_time = door_time.expect("door sound never played");
    assert!(decel_time > 0.0);
    assert!(door_time >= decel_time + 2.0 - 1e-9);

    // Session over: flags released, engine still on, vehicle at rest.
    assert_eq!(sim.station_phase(), None);
    assert!(!sim.flags().forced_braking);
    assert!(!sim.flags().stopping_at_station);
    assert!(sim.flags().engine_on);
    assert_eq!(sim.speed(), 0.0);
    assert_eq!(log.spawn_count("door"), 1);

    // Normal control resumes.
    sim.tick(DT, &throttle());
    assert!(sim.speed() > 0.0);
}

#[test]
fn station_stop_ignores_idle_crawl_floor() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.3);
    sim.do_station_stop().unwrap();

    let mut ticks = 0;
    while sim.speed() > 0.0 {
        sim.tick(DT, &InputFrame::idle());
        ticks += 1;
        assert!(ticks < 10_000);
    }
    assert_eq!(sim.speed(), 0.0);
}

#[test]
fn door_waits_for_configured_dwell() {
    let mut config = SimConfig::default();
    config.station.dwell_time = 0.5;
    let (mut sim, log) = recorded_sim(&config, &TrainSettings::default());
    sim.tick(DT, &press(ControlAction::StationStop));
    assert_eq!(sim.station_phase(), Some(StationStopPhase::Holding));

    // 0.48s: still holding.
    for _ in 0..30 {
        sim.tick(DT, &InputFrame::idle());
    }
    assert_eq!(log.spawn_count("door"), 0);

    for _ in 0..3 {
        sim.tick(DT, &InputFrame::idle());
    }
    assert_eq!(log.spawn_count("door"), 1);
    assert_eq!(sim.station_phase(), Some(StationStopPhase::DoorOpen));
}

#[test]
fn second_request_rejected_while_active() {
    let (mut sim, _log) = default_sim();
    sim.do_station_stop().unwrap();
    assert_eq!(
        sim.do_station_stop(),
        Err(SequenceError::AlreadyActive(StationStopPhase::Decelerating))
    );
}

#[test]
fn cancel_mid_deceleration_releases_brake() {
    let (mut sim, log) = default_sim();
    spin_up(&mut sim, 0.3);
    sim.do_station_stop().unwrap();
    for _ in 0..5 {
        sim.tick(DT, &InputFrame::idle());
    }
    let moving = sim.speed();
    assert!(moving > 0.0);

    sim.tick(DT, &press(ControlAction::CancelStationStop));
    assert_eq!(sim.station_phase(), None);
    assert!(!sim.flags().forced_braking);
    assert!(!sim.flags().stopping_at_station);
    assert_eq!(log.spawn_count("door"), 0);

    sim.tick(DT, &throttle());
    assert!(sim.speed() > 0.0);
}

#[test]
fn cancel_disabled_by_config() {
    let mut config = SimConfig::default();
    config.station.allow_cancel = false;
    let (mut sim, _log) = recorded_sim(&config, &TrainSettings::default());
    sim.do_station_stop().unwrap();
    assert_eq!(
        sim.cancel_station_stop(),
        Err(SequenceError::CancelNotAuthorized)
    );
    assert!(sim.flags().stopping_at_station);
}

#[test]
fn reset_abandons_stop() {
    let (mut sim, _log) = default_sim();
    spin_up(&mut sim, 0.2);
    sim.do_station_stop().unwrap();
    sim.tick(DT, &press(ControlAction::Reset));
    assert_eq!(sim.station_phase(), None);
    assert!(!sim.flags().forced_braking);
    assert!(sim.do_station_stop().is_ok());
}
