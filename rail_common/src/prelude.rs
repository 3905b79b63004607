//! Prelude module for common re-exports.
//!
//! Consumers can do `use rail_common::prelude::*;` and get the most important
//! types without listing individual paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AudioConfig, ClipConfig, ConfigError, ConfigLoader, MotionConfig, SharedConfig, SimConfig,
    StationConfig,
};

// ─── Settings ───────────────────────────────────────────────────────
pub use crate::settings::{SettingsError, SettingsStore, TrainSettings};

// ─── Sound & State ──────────────────────────────────────────────────
pub use crate::sound::{Position, SoundClip};
pub use crate::state::{StationStopPhase, ThrottleBrakePolicy};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CYCLE_TIME_US, ENGINE_LOOP, RAIL_LOOP};
