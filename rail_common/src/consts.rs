//! System-wide constants for the rail simulator workspace.
//!
//! Single source of truth for tuning defaults, sound names and default paths.
//! Imported by all crates: no duplication permitted.

use static_assertions::const_assert;

/// Default frame time in microseconds (60 Hz).
pub const DEFAULT_CYCLE_TIME_US: u32 = 16_667;

/// Default settings file name, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "trainsettings.json";

/// Default simulator configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config/railsim.toml";

/// Registry name of the engine loop.
pub const ENGINE_LOOP: &str = "engine";

/// Registry name of the rail loop.
pub const RAIL_LOOP: &str = "rail";

/// Speed floor while forced braking outside a station stop.
pub const IDLE_CRAWL_SPEED: f64 = 0.2;

/// Dwell between standstill and door sound during a station stop [s].
pub const STATION_DWELL_S: f64 = 2.0;

/// Volume a fade-in starts from.
pub const FADE_IN_START_VOLUME: f64 = 0.1;

/// A fade finishes once the volume is this close to its target.
pub const FADE_EPSILON: f64 = 0.002;

/// Maximum number of lights in a light bank.
pub const MAX_LIGHTS: usize = 32;

const_assert!(DEFAULT_CYCLE_TIME_US > 0);
const_assert!(MAX_LIGHTS > 0);

// ─── Tuning defaults (trainsettings.json) ──────────────────────────

pub const DEFAULT_MAXIMUM_SPEED: f64 = 0.5;
pub const DEFAULT_ACCELERATION: f64 = 0.01;
pub const DEFAULT_MAXIMUM_ACCELERATION: f64 = 1.0;
pub const DEFAULT_ACCELERATION_FACTOR: f64 = 0.01;
pub const DEFAULT_BRAKING_SPEED: f64 = 0.05;
pub const DEFAULT_MAXIMUM_BRAKING_SPEED: f64 = 0.25;
pub const DEFAULT_BRAKING_FACTOR: f64 = 0.05;
pub const DEFAULT_GRAVITY_BRAKING_FACTOR: f64 = 0.05;
