//! Station-stop sequencing across many ticks.
//!
//! Decelerating: forced braking with a zero floor until speed is exactly 0.
//! Holding: dwell at standstill.
//! DoorOpen: door one-shot playing.
//! Resuming: mode flags released; the session ends on the next tick.

use rail_common::config::StationConfig;
use rail_common::state::StationStopPhase;
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::controller::AudioStateController;
use crate::audio::service::SoundService;
use crate::motion::ModeFlags;

/// Station-stop request errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("station stop already in progress ({0:?})")]
    AlreadyActive(StationStopPhase),
    #[error("no station stop in progress")]
    NotActive,
    #[error("station stop cancellation is disabled")]
    CancelNotAuthorized,
}

/// Result of one sequencer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationStep {
    /// No session.
    Idle,
    /// Still in the given phase.
    Continue(StationStopPhase),
    /// Phase change this tick.
    Transition {
        from: StationStopPhase,
        to: StationStopPhase,
    },
    /// Session finished and dropped.
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    phase: StationStopPhase,
    /// Time spent in the current phase [s].
    phase_elapsed: f64,
    /// Door clip length, known once the door sound starts [s].
    door_length: f64,
}

/// Drives one station stop at a time.
#[derive(Debug)]
pub struct StationStopSequencer {
    dwell_time: f64,
    allow_cancel: bool,
    session: Option<Session>,
}

impl StationStopSequencer {
    pub fn new(config: &StationConfig) -> Self {
        Self {
            dwell_time: config.dwell_time,
            allow_cancel: config.allow_cancel,
            session: None,
        }
    }

    /// Current phase, `None` when no stop is in progress.
    #[inline]
    pub fn phase(&self) -> Option<StationStopPhase> {
        self.session.map(|s| s.phase)
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start a station stop: sets `stopping_at_station` and forces braking.
    ///
    /// # Errors
    /// `SequenceError::AlreadyActive` if a stop is already running.
    pub fn begin(&mut self, flags: &mut ModeFlags) -> Result<(), SequenceError> {
        if let Some(session) = self.session {
            return Err(SequenceError::AlreadyActive(session.phase));
        }
        flags.stopping_at_station = true;
        flags.forced_braking = true;
        self.session = Some(Session {
            phase: StationStopPhase::Decelerating,
            phase_elapsed: 0.0,
            door_length: 0.0,
        });
        info!("Station stop: decelerating");
        Ok(())
    }

    /// Abandon the stop and resume at once.
    ///
    /// # Errors
    /// `CancelNotAuthorized` when cancellation is disabled, `NotActive` when
    /// there is nothing to cancel.
    pub fn cancel(&mut self, flags: &mut ModeFlags) -> Result<(), SequenceError> {
        if !self.allow_cancel {
            return Err(SequenceError::CancelNotAuthorized);
        }
        let session = self.session.as_mut().ok_or(SequenceError::NotActive)?;
        if session.phase != StationStopPhase::Resuming {
            info!("Station stop cancelled in {:?}", session.phase);
            Self::enter(session, StationStopPhase::Resuming);
            release(flags);
        }
        Ok(())
    }

    /// Advance the session by `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f64,
        speed: f64,
        flags: &mut ModeFlags,
        audio: &mut AudioStateController,
        sound: &mut SoundService,
    ) -> StationStep {
        let Some(session) = self.session.as_mut() else {
            return StationStep::Idle;
        };
        let from = session.phase;

        match from {
            StationStopPhase::Decelerating => {
                if speed == 0.0 {
                    Self::enter(session, StationStopPhase::Holding);
                }
            }
            StationStopPhase::Holding => {
                session.phase_elapsed += dt;
                if session.phase_elapsed >= self.dwell_time {
                    let (voice, length) = audio.play_door(sound);
                    debug!("Door sound {voice}, {length:.2}s");
                    session.door_length = length;
                    Self::enter(session, StationStopPhase::DoorOpen);
                }
            }
            StationStopPhase::DoorOpen => {
                session.phase_elapsed += dt;
                if session.phase_elapsed >= session.door_length {
                    Self::enter(session, StationStopPhase::Resuming);
                    release(flags);
                }
            }
            StationStopPhase::Resuming => {
                self.session = None;
                info!("Station stop complete");
                return StationStep::Completed;
            }
        }

        let to = session.phase;
        if to == from {
            StationStep::Continue(to)
        } else {
            info!("Station stop: {from:?} -> {to:?}");
            StationStep::Transition { from, to }
        }
    }

    /// Drop any session without resuming (session restart).
    pub fn reset(&mut self) {
        self.session = None;
    }

    fn enter(session: &mut Session, phase: StationStopPhase) {
        session.phase = phase;
        session.phase_elapsed = 0.0;
    }
}

fn release(flags: &mut ModeFlags) {
    flags.forced_braking = false;
    flags.stopping_at_station = false;
}
