//! Path following: advances a cursor along an externally owned path.
//!
//! Path geometry and position sampling belong to the collaborator behind
//! [`PathCursor`]; the core only increments its progress value and reads
//! back the vehicle position for sound emitters.

use rail_common::sound::Position;

/// Mutable progress value on an external path object.
pub trait PathCursor {
    /// Accumulated progress along the path.
    fn progress(&self) -> f64;

    /// Overwrite the accumulated progress.
    fn set_progress(&mut self, progress: f64);

    /// World position at the current progress.
    fn position(&self) -> Position {
        Position::ORIGIN
    }
}

/// In-memory cursor. Optionally wraps at a fixed path length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackCursor {
    progress: f64,
    length: Option<f64>,
}

impl TrackCursor {
    /// Unbounded cursor starting at zero.
    pub const fn new() -> Self {
        Self {
            progress: 0.0,
            length: None,
        }
    }

    /// Cursor that wraps back to the start after `length`.
    pub const fn looped(length: f64) -> Self {
        Self {
            progress: 0.0,
            length: Some(length),
        }
    }
}

impl PathCursor for TrackCursor {
    #[inline]
    fn progress(&self) -> f64 {
        self.progress
    }

    fn set_progress(&mut self, progress: f64) {
        self.progress = match self.length {
            Some(len) if len > 0.0 => progress.rem_euclid(len),
            _ => progress,
        };
    }

    /// Straight track along the x axis.
    fn position(&self) -> Position {
        Position::new(self.progress, 0.0, 0.0)
    }
}

/// Moves a cursor by the current speed once per tick.
pub struct PathDriver;

impl PathDriver {
    /// Add `speed` to the cursor's progress. Returns whether it moved.
    ///
    /// Non-positive speed leaves the cursor where it is.
    pub fn advance(cursor: &mut dyn PathCursor, speed: f64) -> bool {
        if speed <= 0.0 {
            return false;
        }
        cursor.set_progress(cursor.progress() + speed);
        true
    }
}
