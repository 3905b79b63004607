//! Sound service: named loop registry, one-shot voices and volume fades.
//!
//! Owned by the simulator and driven from the tick thread. Fades are explicit
//! per-voice ramps advanced by [`SoundService::tick`]; each step re-reads the
//! voice's volume, so a direct `set_volume` between steps wins until the
//! next step. A fade whose voice has been destroyed is dropped.
//!
//! One-shot lifetime is measured in elapsed playback time since the last
//! (re)start and lasts `max(clip.length, fade_in)`.

use std::collections::{BTreeMap, HashMap};

use rail_common::config::AudioConfig;
use rail_common::consts::{FADE_EPSILON, FADE_IN_START_VOLUME};
use rail_common::sound::{Position, SoundClip};
use thiserror::Error;
use tracing::{debug, warn};

use super::backend::{AudioBackend, VoiceId};

/// Errors raised by the sound service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundError {
    /// A live loop is already registered under this name.
    #[error("duplicate loop name: {0}")]
    DuplicateLoop(String),
}

/// Playback options for new voices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Target volume.
    pub volume: f64,
    /// Fade-in duration [s]; `None` starts at full target volume.
    pub fade_in: Option<f64>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fade_in: None,
        }
    }
}

impl PlayOptions {
    pub const fn volume(volume: f64) -> Self {
        Self {
            volume,
            fade_in: None,
        }
    }

    pub const fn with_fade_in(mut self, fade_time: f64) -> Self {
        self.fade_in = Some(fade_time);
        self
    }
}

#[derive(Debug)]
struct Voice {
    volume: f64,
    playing: bool,
    /// Playback time since the last (re)start [s].
    elapsed: f64,
    /// One-shots only: destroy once `elapsed` reaches this.
    lifetime: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeEnd {
    /// Hold at target.
    Hold,
    /// Stop playback, optionally destroying the voice.
    Stop { destroy: bool },
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    voice: VoiceId,
    target: f64,
    /// Volume change per second (signed).
    rate: f64,
    end: FadeEnd,
}

/// Owned registry of playback voices.
pub struct SoundService {
    backend: Box<dyn AudioBackend>,
    voices: BTreeMap<VoiceId, Voice>,
    loops: HashMap<String, VoiceId>,
    fades: Vec<Fade>,
    next_id: u64,
    fade_in_start: f64,
    epsilon: f64,
}

impl SoundService {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            voices: BTreeMap::new(),
            loops: HashMap::new(),
            fades: Vec::new(),
            next_id: 1,
            fade_in_start: FADE_IN_START_VOLUME,
            epsilon: FADE_EPSILON,
        }
    }

    /// Service with fade parameters taken from the audio config.
    pub fn with_config(backend: Box<dyn AudioBackend>, config: &AudioConfig) -> Self {
        Self {
            fade_in_start: config.fade_in_start_volume,
            epsilon: config.fade_epsilon,
            ..Self::new(backend)
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Play a one-shot voice. It destroys itself when its lifetime elapses.
    pub fn play_one_shot(
        &mut self,
        clip: &SoundClip,
        position: Position,
        options: PlayOptions,
    ) -> VoiceId {
        let lifetime = clip.length.max(options.fade_in.unwrap_or(0.0));
        self.spawn(clip, position, false, Some(lifetime), options)
    }

    /// Start a named looping voice.
    ///
    /// # Errors
    /// `SoundError::DuplicateLoop` if a live loop already uses `name`; the
    /// registry is left unchanged.
    pub fn start_loop(
        &mut self,
        name: &str,
        clip: &SoundClip,
        position: Position,
        options: PlayOptions,
    ) -> Result<VoiceId, SoundError> {
        if self.loops.contains_key(name) {
            warn!("Loop '{name}' already registered; start rejected");
            return Err(SoundError::DuplicateLoop(name.to_string()));
        }
        let voice = self.spawn(clip, position, true, None, options);
        self.loops.insert(name.to_string(), voice);
        debug!("Loop '{name}' started as {voice}");
        Ok(voice)
    }

    /// Look up a named loop. Never creates one.
    #[inline]
    pub fn get_loop(&self, name: &str) -> Option<VoiceId> {
        self.loops.get(name).copied()
    }

    /// Unregister a named loop immediately, then fade it out and destroy it,
    /// or stop and destroy it at once when `fade_out` is `None`.
    ///
    /// Absent names are a no-op.
    pub fn stop_loop(&mut self, name: &str, fade_out: Option<f64>) -> Option<VoiceId> {
        let voice = self.loops.remove(name)?;
        debug!("Loop '{name}' ({voice}) stopping, fade={fade_out:?}");
        match fade_out {
            Some(time) => self.fade_to(voice, 0.0, time, FadeEnd::Stop { destroy: true }),
            None => {
                self.stop(voice);
                self.destroy(voice);
            }
        }
        Some(voice)
    }

    /// Whether the voice still exists.
    #[inline]
    pub fn is_alive(&self, voice: VoiceId) -> bool {
        self.voices.contains_key(&voice)
    }

    pub fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).is_some_and(|v| v.playing)
    }

    pub fn volume(&self, voice: VoiceId) -> Option<f64> {
        self.voices.get(&voice).map(|v| v.volume)
    }

    /// Write a voice's volume directly. Clamping is the caller's job.
    pub fn set_volume(&mut self, voice: VoiceId, volume: f64) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.volume = volume;
            self.backend.set_volume(voice, volume);
        }
    }

    /// Restart a live voice from time zero, resetting its lifetime.
    pub fn restart(&mut self, voice: VoiceId) -> bool {
        let Some(v) = self.voices.get_mut(&voice) else {
            return false;
        };
        v.elapsed = 0.0;
        v.playing = true;
        self.backend.play(voice);
        true
    }

    /// Stop playback of a live voice; it stays alive until destroyed.
    pub fn stop(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            if v.playing {
                v.playing = false;
                self.backend.stop(voice);
            }
        }
    }

    /// Destroy every voice and clear the registry.
    pub fn stop_all(&mut self) {
        let ids: Vec<VoiceId> = self.voices.keys().copied().collect();
        for voice in ids {
            self.stop(voice);
            self.destroy(voice);
        }
        self.loops.clear();
        self.fades.clear();
    }

    /// Number of live voices.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Number of registered loops.
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Number of fades in progress.
    pub fn active_fades(&self) -> usize {
        self.fades.len()
    }

    /// Advance fades and one-shot lifetimes by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        let fades = std::mem::take(&mut self.fades);
        let mut pending = Vec::with_capacity(fades.len());
        for fade in fades {
            if self.step_fade(&fade, dt) {
                pending.push(fade);
            }
        }
        // Fades started during this tick's steps are kept too.
        pending.append(&mut self.fades);
        self.fades = pending;

        let mut expired = Vec::new();
        for (id, voice) in self.voices.iter_mut() {
            voice.elapsed += dt;
            if voice.lifetime.is_some_and(|limit| voice.elapsed >= limit) {
                expired.push(*id);
            }
        }
        for voice in expired {
            self.stop(voice);
            self.destroy(voice);
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn spawn(
        &mut self,
        clip: &SoundClip,
        position: Position,
        looping: bool,
        lifetime: Option<f64>,
        options: PlayOptions,
    ) -> VoiceId {
        let voice = VoiceId(self.next_id);
        self.next_id += 1;

        self.backend.spawn(voice, clip, position, looping);

        let start_volume = match options.fade_in {
            Some(_) => self.fade_in_start,
            None => options.volume,
        };
        self.voices.insert(
            voice,
            Voice {
                volume: start_volume,
                playing: true,
                elapsed: 0.0,
                lifetime,
            },
        );
        self.backend.set_volume(voice, start_volume);
        self.backend.play(voice);

        if let Some(time) = options.fade_in {
            self.fade_to(voice, options.volume, time, FadeEnd::Hold);
        }
        voice
    }

    fn destroy(&mut self, voice: VoiceId) {
        if self.voices.remove(&voice).is_some() {
            self.backend.destroy(voice);
        }
    }

    fn fade_to(&mut self, voice: VoiceId, target: f64, time: f64, end: FadeEnd) {
        let Some(current) = self.volume(voice) else {
            return;
        };
        // A new ramp replaces any running one on the same voice.
        self.fades.retain(|f| f.voice != voice);
        let fade = Fade {
            voice,
            target,
            rate: if time > 0.0 {
                (target - current) / time
            } else {
                0.0
            },
            end,
        };
        if time <= 0.0 || (current - target).abs() <= self.epsilon {
            self.finish_fade(&fade);
        } else {
            self.fades.push(fade);
        }
    }

    /// One fade step. Returns whether the fade is still running.
    fn step_fade(&mut self, fade: &Fade, dt: f64) -> bool {
        let Some(current) = self.volume(fade.voice) else {
            return false;
        };
        let next = current + fade.rate * dt;
        let reached = if fade.rate >= 0.0 {
            next >= fade.target - self.epsilon
        } else {
            next <= fade.target + self.epsilon
        };
        if reached {
            self.finish_fade(fade);
            false
        } else {
            self.set_volume(fade.voice, next);
            true
        }
    }

    fn finish_fade(&mut self, fade: &Fade) {
        self.set_volume(fade.voice, fade.target);
        if let FadeEnd::Stop { destroy } = fade.end {
            self.stop(fade.voice);
            if destroy {
                self.destroy(fade.voice);
            }
        }
    }
}
