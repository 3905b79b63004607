//! Integration test: startup from files and scripted replay.
//!
//! Config TOML → settings JSON (first run writes defaults) → simulator →
//! `TickRunner` replay of a key script.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rail_common::config::{ConfigError, ConfigLoader, SimConfig};
use rail_common::settings::{SettingsError, SettingsStore, TrainSettings};
use rail_common::state::ThrottleBrakePolicy;
use rail_control::audio::backend::NullBackend;
use rail_control::cycle::{BackgroundFrames, LineFrames, RunnerError, StopReason, TickRunner};
use rail_control::path::TrackCursor;
use rail_control::simulator::Simulator;
use tempfile::TempDir;

use super::DT;

const CONFIG_TOML: &str = r#"
[shared]
log_level = "debug"

[motion]
throttle_brake_policy = "brake_priority"

[station]
dwell_time = 1.5
allow_cancel = false

[controls]
dev_mode = true
light_count = 4
"#;

fn build(config: &SimConfig, settings: &TrainSettings) -> TickRunner {
    let sim = Simulator::new(
        config,
        settings,
        Box::new(NullBackend),
        Box::new(TrackCursor::new()),
    );
    TickRunner::new(sim, config.cycle.cycle_time_us)
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn first_run_writes_settings_then_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trainsettings.json");
    let store = SettingsStore::new(&path);

    let first = store.load_or_init().unwrap();
    assert_eq!(first, TrainSettings::default());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"maximumSpeed\""));
    assert!(written.contains("\"gravityBrakingFactor\""));

    let tuned = TrainSettings {
        maximum_speed: 0.8,
        ..first
    };
    store.save(&tuned).unwrap();
    assert_eq!(store.load_or_init().unwrap(), tuned);
}

#[test]
fn malformed_settings_are_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trainsettings.json");
    fs::write(&path, "{ \"maximumSpeed\": ").unwrap();
    let err = SettingsStore::new(&path).load_or_init().unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn config_file_drives_simulator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("railsim.toml");
    fs::write(&path, CONFIG_TOML).unwrap();

    let config = SimConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(
        config.motion.throttle_brake_policy,
        ThrottleBrakePolicy::BrakePriority
    );

    let runner = build(&config, &TrainSettings::default());
    let sim = runner.simulator();
    assert!(sim.dev_mode());
    assert_eq!(sim.lights().len(), 4);
}

#[test]
fn missing_config_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let err = SimConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound));
}

#[test]
fn scripted_replay_runs_to_exit() {
    let mut script = String::from("# spin up\ne\n");
    for _ in 0..120 {
        script.push_str("w\n");
    }
    script.push_str("l h\n");
    for _ in 0..10 {
        script.push_str("s\n");
    }
    script.push_str("esc\nw\n");

    let mut runner = build(&SimConfig::default(), &TrainSettings::default());
    let mut frames = LineFrames::new(Cursor::new(script));
    let summary = runner.run_fixed(&mut frames, DT, &AtomicBool::new(true)).unwrap();

    assert_eq!(summary.reason, StopReason::ExitRequested);
    assert_eq!(summary.ticks, 133);
    let sim = runner.simulator();
    assert!(sim.lights().lights_on());
    assert!(sim.speed() > 0.0);
    assert!(sim.progress() > 0.0);
}

#[test]
fn bad_script_line_reports_position() {
    let mut runner = build(&SimConfig::default(), &TrainSettings::default());
    let mut frames = LineFrames::new(Cursor::new("e\nw\nzz\n"));
    match runner.run_fixed(&mut frames, DT, &AtomicBool::new(true)) {
        Err(RunnerError::Input { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected input error, got {other:?}"),
    }
    assert_eq!(runner.stats().tick_count, 2);
}

#[test]
fn background_reader_replays_until_input_ends() {
    let running = Arc::new(AtomicBool::new(true));
    let mut runner = build(&SimConfig::default(), &TrainSettings::default());
    let mut frames = BackgroundFrames::spawn(Cursor::new("e\nw\nw\n\nw\n"), running.clone());

    let summary = runner.run_fixed(&mut frames, DT, &running).unwrap();
    assert_eq!(summary.reason, StopReason::SourceExhausted);
    assert_eq!(summary.ticks, 4);
    assert!(runner.simulator().speed() > 0.0);
}
