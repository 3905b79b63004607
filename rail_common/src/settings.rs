//! Motion tuning settings and their JSON store.
//!
//! The tuning record is eight flat floats persisted as `trainsettings.json`.
//! A missing file is a first run: defaults are written and returned. A present
//! file is loaded verbatim: every field is required and unknown fields are
//! rejected. There is no schema versioning and no partial-field merge.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{
    DEFAULT_ACCELERATION, DEFAULT_ACCELERATION_FACTOR, DEFAULT_BRAKING_FACTOR,
    DEFAULT_BRAKING_SPEED, DEFAULT_GRAVITY_BRAKING_FACTOR, DEFAULT_MAXIMUM_ACCELERATION,
    DEFAULT_MAXIMUM_BRAKING_SPEED, DEFAULT_MAXIMUM_SPEED,
};

/// Errors raised while loading or persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid settings record.
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the record failed.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The record parsed but holds inconsistent values.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Motion tuning parameters.
///
/// `acceleration` and `braking_speed` are the starting rates; the motion
/// model grows them per tick up to the matching ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrainSettings {
    pub maximum_speed: f64,
    pub acceleration: f64,
    pub maximum_acceleration: f64,
    pub acceleration_factor: f64,
    pub braking_speed: f64,
    pub maximum_braking_speed: f64,
    pub braking_factor: f64,
    pub gravity_braking_factor: f64,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            maximum_speed: DEFAULT_MAXIMUM_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            maximum_acceleration: DEFAULT_MAXIMUM_ACCELERATION,
            acceleration_factor: DEFAULT_ACCELERATION_FACTOR,
            braking_speed: DEFAULT_BRAKING_SPEED,
            maximum_braking_speed: DEFAULT_MAXIMUM_BRAKING_SPEED,
            braking_factor: DEFAULT_BRAKING_FACTOR,
            gravity_braking_factor: DEFAULT_GRAVITY_BRAKING_FACTOR,
        }
    }
}

impl TrainSettings {
    /// Check that all values are finite, non-negative, and that starting
    /// rates do not exceed their ceilings.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("maximumSpeed", self.maximum_speed),
            ("acceleration", self.acceleration),
            ("maximumAcceleration", self.maximum_acceleration),
            ("accelerationFactor", self.acceleration_factor),
            ("brakingSpeed", self.braking_speed),
            ("maximumBrakingSpeed", self.maximum_braking_speed),
            ("brakingFactor", self.braking_factor),
            ("gravityBrakingFactor", self.gravity_braking_factor),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if self.acceleration > self.maximum_acceleration {
            return Err(SettingsError::Invalid(format!(
                "acceleration {} exceeds maximumAcceleration {}",
                self.acceleration, self.maximum_acceleration
            )));
        }
        if self.braking_speed > self.maximum_braking_speed {
            return Err(SettingsError::Invalid(format!(
                "brakingSpeed {} exceeds maximumBrakingSpeed {}",
                self.braking_speed, self.maximum_braking_speed
            )));
        }
        Ok(())
    }
}

/// File-backed settings store at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, writing defaults on first run.
    pub fn load_or_init(&self) -> Result<TrainSettings, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let settings: TrainSettings =
                    serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                        path: self.path.clone(),
                        source,
                    })?;
                settings.validate()?;
                debug!("Loaded settings from {}", self.path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let defaults = TrainSettings::default();
                self.save(&defaults)?;
                info!(
                    "No settings at {}; wrote defaults",
                    self.path.display()
                );
                Ok(defaults)
            }
            Err(source) => Err(SettingsError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Persist the settings as pretty-printed JSON.
    pub fn save(&self, settings: &TrainSettings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
