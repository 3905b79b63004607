//! State enums shared between the control core and its configuration.
//!
//! All enums use `#[repr(u8)]` for compact, loggable snapshots.

use serde::{Deserialize, Serialize};

/// Phase of an in-progress station stop.
///
/// A stop runs `Decelerating → Holding → DoorOpen → Resuming` and then ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StationStopPhase {
    /// Forced braking toward a full standstill.
    Decelerating = 0,
    /// Standing still, waiting for the dwell to elapse.
    Holding = 1,
    /// Door sound playing.
    DoorOpen = 2,
    /// Releasing the forced brake; the session ends on the next tick.
    Resuming = 3,
}

impl StationStopPhase {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Decelerating),
            1 => Some(Self::Holding),
            2 => Some(Self::DoorOpen),
            3 => Some(Self::Resuming),
            _ => None,
        }
    }
}

impl Default for StationStopPhase {
    fn default() -> Self {
        Self::Decelerating
    }
}

/// How a tick resolves throttle and brake asserted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleBrakePolicy {
    /// Accelerate, then brake, within the same tick.
    #[default]
    DualApply,
    /// Brake only; the throttle is ignored while the brake is held.
    BrakePriority,
}
