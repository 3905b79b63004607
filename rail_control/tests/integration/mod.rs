//! Shared fixtures for the integration suites.

mod drive_cycle;
mod properties;
mod startup;
mod station_stop;

use rail_common::config::SimConfig;
use rail_common::settings::TrainSettings;
use rail_control::audio::backend::{BackendLog, RecordingBackend};
use rail_control::input::{ControlAction, HeldControls, InputFrame};
use rail_control::path::TrackCursor;
use rail_control::simulator::Simulator;

pub const DT: f64 = 0.016;

/// Simulator on an unbounded track with a recording audio backend.
pub fn recorded_sim(config: &SimConfig, settings: &TrainSettings) -> (Simulator, BackendLog) {
    let (backend, log) = RecordingBackend::new();
    let sim = Simulator::new(
        config,
        settings,
        Box::new(backend),
        Box::new(TrackCursor::new()),
    );
    (sim, log)
}

pub fn default_sim() -> (Simulator, BackendLog) {
    recorded_sim(&SimConfig::default(), &TrainSettings::default())
}

pub fn throttle() -> InputFrame {
    InputFrame::holding(HeldControls::THROTTLE)
}

pub fn brake() -> InputFrame {
    InputFrame::holding(HeldControls::BRAKE)
}

pub fn press(action: ControlAction) -> InputFrame {
    InputFrame::pressing(action)
}

/// Turn the engine on and throttle until `speed >= target`.
pub fn spin_up(sim: &mut Simulator, target: f64) {
    if !sim.flags().engine_on {
        sim.tick(DT, &press(ControlAction::ToggleEngine));
    }
    let mut guard = 0;
    while sim.speed() < target {
        sim.tick(DT, &throttle());
        guard += 1;
        assert!(guard < 100_000, "speed never reached {target}");
    }
}
