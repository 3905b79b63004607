//! Rail Simulator Common Library
//!
//! Shared constants, tuning settings, configuration loading and state types
//! for the rail simulator workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Tuning defaults, sound names and default paths
//! - [`config`] - Configuration loading trait and simulator configuration
//! - [`settings`] - Motion tuning record and its JSON store
//! - [`sound`] - Clip descriptors and emitter positions
//! - [`state`] - Station-stop phase and throttle/brake policy enums
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rail_common::prelude::*;
//!
//! let config = SimConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod settings;
pub mod sound;
pub mod state;
