//! Configuration loading traits and types.
//!
//! Provides the `ConfigLoader` trait for TOML files and the simulator
//! configuration (`SimConfig`). Every section has defaults, so an empty file
//! is a valid configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rail_common::config::{ConfigLoader, ConfigError, SimConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SimConfig::load(Path::new("config/railsim.toml"))?;
//!     config.validate()?;
//!     println!("Frame time: {}us", config.cycle.cycle_time_us);
//!     Ok(())
//! }
//! ```
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//!
//! [motion]
//! idle_crawl_speed = 0.2
//! throttle_brake_policy = "brake_priority"
//!
//! [clips.horn]
//! name = "horn_long"
//! length = 2.5
//!
//! [station]
//! dwell_time = 2.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    DEFAULT_CYCLE_TIME_US, DEFAULT_SETTINGS_FILE, FADE_EPSILON, FADE_IN_START_VOLUME,
    IDLE_CRAWL_SPEED, MAX_LIGHTS, STATION_DWELL_S,
};
use crate::sound::SoundClip;
use crate::state::ThrottleBrakePolicy;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common fields shared across simulator applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "railsim".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Simulator Configuration ────────────────────────────────────────

/// Frame clock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CycleConfig {
    /// Target frame time [µs].
    pub cycle_time_us: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: DEFAULT_CYCLE_TIME_US,
        }
    }
}

/// Motion model policy knobs not covered by the tuning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Speed floor while forced braking outside a station stop.
    pub idle_crawl_speed: f64,
    /// Resolution of throttle and brake held in the same tick.
    pub throttle_brake_policy: ThrottleBrakePolicy,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            idle_crawl_speed: IDLE_CRAWL_SPEED,
            throttle_brake_policy: ThrottleBrakePolicy::default(),
        }
    }
}

/// Fade times [s] and volume curve limits for the audio controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    pub engine_fade_in: f64,
    pub engine_fade_out: f64,
    /// Engine volume reached by the start-up fade at standstill.
    pub engine_start_volume: f64,
    /// Upper bound of the engine loop volume.
    pub engine_volume_cap: f64,
    /// Lower bound of the engine loop volume while braking.
    pub engine_volume_floor: f64,
    pub rail_fade_in: f64,
    pub rail_fade_out: f64,
    pub rail_start_volume: f64,
    pub horn_fade_in: f64,
    /// Volume every fade-in starts from.
    pub fade_in_start_volume: f64,
    /// Distance to target at which a fade snaps and finishes.
    pub fade_epsilon: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            engine_fade_in: 1.0,
            engine_fade_out: 0.7,
            engine_start_volume: 0.01,
            engine_volume_cap: 0.2,
            engine_volume_floor: 0.01,
            rail_fade_in: 0.5,
            rail_fade_out: 0.5,
            rail_start_volume: 0.1,
            horn_fade_in: 0.7,
            fade_in_start_volume: FADE_IN_START_VOLUME,
            fade_epsilon: FADE_EPSILON,
        }
    }
}

/// Clips used by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClipConfig {
    pub engine: SoundClip,
    pub rail: SoundClip,
    pub braking: SoundClip,
    pub horn: SoundClip,
    pub door: SoundClip,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            engine: SoundClip::new("engine", 4.0),
            rail: SoundClip::new("rail", 6.0),
            braking: SoundClip::new("braking", 3.0),
            horn: SoundClip::new("horn", 2.0),
            door: SoundClip::new("door", 3.0),
        }
    }
}

/// Station-stop sequencing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// Pause between standstill and the door sound [s].
    pub dwell_time: f64,
    /// Whether an in-progress stop may be cancelled.
    pub allow_cancel: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            dwell_time: STATION_DWELL_S,
            allow_cancel: true,
        }
    }
}

/// Operator controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlsConfig {
    /// Enables developer-only controls (forced-braking toggle).
    pub dev_mode: bool,
    /// Number of lights in the vehicle's light bank.
    pub light_count: usize,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            light_count: 2,
        }
    }
}

/// Location of the tuning settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFileConfig {
    pub path: String,
}

impl Default for SettingsFileConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SETTINGS_FILE.to_string(),
        }
    }
}

/// Complete simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub shared: SharedConfig,
    pub cycle: CycleConfig,
    pub motion: MotionConfig,
    pub audio: AudioConfig,
    pub clips: ClipConfig,
    pub station: StationConfig,
    pub controls: ControlsConfig,
    pub settings: SettingsFileConfig,
}

impl SimConfig {
    /// Validate numeric bounds across all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.cycle.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be > 0".to_string(),
            ));
        }
        check_non_negative("motion.idle_crawl_speed", self.motion.idle_crawl_speed)?;

        let a = &self.audio;
        for (name, value) in [
            ("audio.engine_fade_in", a.engine_fade_in),
            ("audio.engine_fade_out", a.engine_fade_out),
            ("audio.rail_fade_in", a.rail_fade_in),
            ("audio.rail_fade_out", a.rail_fade_out),
            ("audio.horn_fade_in", a.horn_fade_in),
            ("audio.fade_epsilon", a.fade_epsilon),
        ] {
            check_non_negative(name, value)?;
        }
        for (name, value) in [
            ("audio.engine_start_volume", a.engine_start_volume),
            ("audio.engine_volume_cap", a.engine_volume_cap),
            ("audio.engine_volume_floor", a.engine_volume_floor),
            ("audio.rail_start_volume", a.rail_start_volume),
            ("audio.fade_in_start_volume", a.fade_in_start_volume),
        ] {
            check_unit_volume(name, value)?;
        }

        let c = &self.clips;
        for clip in [&c.engine, &c.rail, &c.braking, &c.horn, &c.door] {
            if clip.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "clip name cannot be empty".to_string(),
                ));
            }
            check_non_negative(&format!("clips.{}.length", clip.name), clip.length)?;
        }

        check_non_negative("station.dwell_time", self.station.dwell_time)?;

        if self.controls.light_count > MAX_LIGHTS {
            return Err(ConfigError::ValidationError(format!(
                "controls.light_count {} exceeds {MAX_LIGHTS}",
                self.controls.light_count
            )));
        }

        if self.settings.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "settings.path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn check_unit_volume(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}
