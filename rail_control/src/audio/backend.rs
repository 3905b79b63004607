//! Playback backend trait and stock implementations.
//!
//! The sound service owns voice bookkeeping (volume, lifetime, fades) and
//! forwards every effect to an `AudioBackend`. Backends are driven from the
//! tick thread only.
//!
//! - `NullBackend`: discards everything.
//! - `TracingBackend`: logs every event at TRACE level (headless runs).
//! - `RecordingBackend`: appends events to a shared log for inspection.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rail_common::sound::{Position, SoundClip};
use tracing::trace;

/// Identifier of a playback voice. Never reused within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Interface the sound service drives.
///
/// # Lifecycle
///
/// `spawn` → (`play` | `stop` | `set_volume`)* → `destroy`. `play` always
/// starts the clip from time zero.
pub trait AudioBackend {
    /// Backend identifier (e.g. "null", "tracing").
    fn name(&self) -> &'static str;

    /// Create a playback instance for `clip` at `position`.
    fn spawn(&mut self, voice: VoiceId, clip: &SoundClip, position: Position, looping: bool);

    /// Start (or restart) playback from the beginning.
    fn play(&mut self, voice: VoiceId);

    /// Stop playback; the instance stays alive.
    fn stop(&mut self, voice: VoiceId);

    fn set_volume(&mut self, voice: VoiceId, volume: f64);

    /// Release the instance.
    fn destroy(&mut self, voice: VoiceId);
}

/// Backend that discards every event.
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }
    fn spawn(&mut self, _: VoiceId, _: &SoundClip, _: Position, _: bool) {}
    fn play(&mut self, _: VoiceId) {}
    fn stop(&mut self, _: VoiceId) {}
    fn set_volume(&mut self, _: VoiceId, _: f64) {}
    fn destroy(&mut self, _: VoiceId) {}
}

/// Backend that logs events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingBackend;

impl AudioBackend for TracingBackend {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn spawn(&mut self, voice: VoiceId, clip: &SoundClip, position: Position, looping: bool) {
        trace!(%voice, clip = %clip.name, ?position, looping, "spawn");
    }

    fn play(&mut self, voice: VoiceId) {
        trace!(%voice, "play");
    }

    fn stop(&mut self, voice: VoiceId) {
        trace!(%voice, "stop");
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f64) {
        trace!(%voice, volume, "set_volume");
    }

    fn destroy(&mut self, voice: VoiceId) {
        trace!(%voice, "destroy");
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Spawn {
        voice: VoiceId,
        clip: String,
        position: Position,
        looping: bool,
    },
    Play(VoiceId),
    Stop(VoiceId),
    SetVolume(VoiceId, f64),
    Destroy(VoiceId),
}

/// Shared handle onto a `RecordingBackend`'s event log.
#[derive(Debug, Clone, Default)]
pub struct BackendLog(Rc<RefCell<Vec<BackendEvent>>>);

impl BackendLog {
    /// Copy of all events recorded so far.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.0.borrow().clone()
    }

    /// Number of voices spawned for the named clip.
    pub fn spawn_count(&self, clip_name: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, BackendEvent::Spawn { clip, .. } if clip == clip_name))
            .count()
    }

    /// Number of `play` calls for a voice.
    pub fn play_count(&self, voice: VoiceId) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| **e == BackendEvent::Play(voice))
            .count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, event: BackendEvent) {
        self.0.borrow_mut().push(event);
    }
}

/// Backend that records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: BackendLog,
}

impl RecordingBackend {
    /// Create a backend and a handle onto its log.
    pub fn new() -> (Self, BackendLog) {
        let log = BackendLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl AudioBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn spawn(&mut self, voice: VoiceId, clip: &SoundClip, position: Position, looping: bool) {
        self.log.push(BackendEvent::Spawn {
            voice,
            clip: clip.name.clone(),
            position,
            looping,
        });
    }

    fn play(&mut self, voice: VoiceId) {
        self.log.push(BackendEvent::Play(voice));
    }

    fn stop(&mut self, voice: VoiceId) {
        self.log.push(BackendEvent::Stop(voice));
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f64) {
        self.log.push(BackendEvent::SetVolume(voice, volume));
    }

    fn destroy(&mut self, voice: VoiceId) {
        self.log.push(BackendEvent::Destroy(voice));
    }
}
