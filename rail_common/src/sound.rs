//! Sound clip descriptors and emitter positions.

use serde::{Deserialize, Serialize};

/// A playable audio clip: a name the backend resolves plus its duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundClip {
    /// Asset name, resolved by the audio backend.
    pub name: String,
    /// Clip duration [s].
    pub length: f64,
}

impl SoundClip {
    pub fn new(name: impl Into<String>, length: f64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// World position a voice is spawned at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}
