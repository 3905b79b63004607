//! Audio state controller: motion state deltas → sound lifecycle events.
//!
//! Runs once per tick after the motion model. Start/stop events are edge
//! driven (engine flag, braking flag, first throttling tick, speed reaching
//! zero), so repeated ticks with unchanged state only adjust volumes.
//!
//! | Sound | Start | Stop |
//! |-------|-------|------|
//! | engine loop | engine off → on (fade in) | engine on → off (fade out) |
//! | rail loop | first throttling tick that leaves the vehicle moving | speed reaches 0 (fade out) |
//! | braking one-shot | braking flag false → true | braking flag true → false, or speed 0 |
//! | horn one-shot | explicit trigger, cooldown = clip length | lifetime |

use rail_common::config::{AudioConfig, ClipConfig};
use rail_common::consts::{ENGINE_LOOP, RAIL_LOOP};
use rail_common::sound::Position;
use tracing::{debug, info, warn};

use super::backend::VoiceId;
use super::service::{PlayOptions, SoundService};
use crate::motion::{MotionState, MotionTick};

/// Drives sound lifecycle from motion state.
#[derive(Debug)]
pub struct AudioStateController {
    config: AudioConfig,
    clips: ClipConfig,
    position: Position,
    /// Engine flag seen on the previous tick.
    engine_on: bool,
    /// Pooled braking voice, restarted instead of re-spawned while alive.
    braking_voice: Option<VoiceId>,
    /// Controller clock [s].
    clock: f64,
    /// Earliest clock value at which the horn may sound again.
    horn_ready_at: f64,
}

impl AudioStateController {
    pub fn new(config: &AudioConfig, clips: &ClipConfig) -> Self {
        Self {
            config: config.clone(),
            clips: clips.clone(),
            position: Position::ORIGIN,
            engine_on: false,
            braking_voice: None,
            clock: 0.0,
            horn_ready_at: 0.0,
        }
    }

    /// Emitter position for newly spawned voices.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    #[inline]
    pub const fn clock(&self) -> f64 {
        self.clock
    }

    #[inline]
    pub const fn braking_voice(&self) -> Option<VoiceId> {
        self.braking_voice
    }

    /// Apply this tick's motion outcome to the sound service.
    pub fn on_tick(
        &mut self,
        dt: f64,
        state: &MotionState,
        tick: &MotionTick,
        sound: &mut SoundService,
    ) {
        self.clock += dt;
        let speed = state.speed;

        self.apply_engine_edge(state, sound);

        if tick.throttling {
            // Throttle held against the brake at rest leaves speed at zero.
            if speed > 0.0 && sound.get_loop(RAIL_LOOP).is_none() {
                let options = PlayOptions::volume(self.config.rail_start_volume)
                    .with_fade_in(self.config.rail_fade_in);
                if let Err(e) = sound.start_loop(RAIL_LOOP, &self.clips.rail, self.position, options)
                {
                    warn!("Rail loop not started: {e}");
                }
            }
            self.adjust_loop(sound, ENGINE_LOOP, |v| {
                (v + speed / 100.0).min(self.config.engine_volume_cap)
            });
            self.adjust_loop(sound, RAIL_LOOP, |v| (v + speed / 100.0).min(1.0));
        }

        if tick.braking_started {
            self.start_braking_sound(sound);
        }

        if tick.braking {
            if state.engine_on {
                self.adjust_loop(sound, ENGINE_LOOP, |v| {
                    (v - speed / 75.0).max(self.config.engine_volume_floor)
                });
            }
            self.adjust_loop(sound, RAIL_LOOP, |v| (v - speed / 100.0).clamp(0.0, 1.0));
            if let Some(voice) = self.braking_voice {
                let volume = if state.maximum_speed > 0.0 {
                    (speed / state.maximum_speed).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                sound.set_volume(voice, volume);
            }
        }

        if tick.braking_released {
            self.stop_braking_sound(sound);
        }

        // No longer moving.
        if speed <= 0.0 {
            self.stop_braking_sound(sound);
            if sound.stop_loop(RAIL_LOOP, Some(self.config.rail_fade_out)).is_some() {
                debug!("Standstill: rail loop fading out");
            }
        }
    }

    /// Sound the horn unless the previous one is still in its cooldown.
    ///
    /// Returns the new voice, or `None` when the trigger was ignored.
    pub fn sound_horn(&mut self, sound: &mut SoundService) -> Option<VoiceId> {
        if self.clock < self.horn_ready_at {
            debug!("Horn ignored, ready at {:.3}s", self.horn_ready_at);
            return None;
        }
        self.horn_ready_at = self.clock + self.clips.horn.length;
        let options = PlayOptions::volume(1.0).with_fade_in(self.config.horn_fade_in);
        Some(sound.play_one_shot(&self.clips.horn, self.position, options))
    }

    /// Play the door one-shot; returns the voice and the clip length [s].
    pub fn play_door(&mut self, sound: &mut SoundService) -> (VoiceId, f64) {
        let voice = sound.play_one_shot(&self.clips.door, self.position, PlayOptions::default());
        (voice, self.clips.door.length)
    }

    /// Silence everything and forget all edge state (session restart).
    pub fn reset(&mut self, sound: &mut SoundService) {
        sound.stop_all();
        self.engine_on = false;
        self.braking_voice = None;
        self.clock = 0.0;
        self.horn_ready_at = 0.0;
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn apply_engine_edge(&mut self, state: &MotionState, sound: &mut SoundService) {
        if state.engine_on == self.engine_on {
            return;
        }
        self.engine_on = state.engine_on;

        if state.engine_on {
            let target = (self.config.engine_start_volume + state.speed / 100.0)
                .min(self.config.engine_volume_cap);
            let options = PlayOptions::volume(target).with_fade_in(self.config.engine_fade_in);
            match sound.start_loop(ENGINE_LOOP, &self.clips.engine, self.position, options) {
                Ok(voice) => info!("Engine on ({voice})"),
                Err(e) => warn!("Engine loop not started: {e}"),
            }
        } else {
            sound.stop_loop(ENGINE_LOOP, Some(self.config.engine_fade_out));
            info!("Engine off");
        }
    }

    fn start_braking_sound(&mut self, sound: &mut SoundService) {
        if let Some(voice) = self.braking_voice {
            if sound.restart(voice) {
                return;
            }
        }
        let voice = sound.play_one_shot(&self.clips.braking, self.position, PlayOptions::default());
        self.braking_voice = Some(voice);
    }

    fn stop_braking_sound(&mut self, sound: &mut SoundService) {
        if let Some(voice) = self.braking_voice {
            sound.stop(voice);
        }
    }

    fn adjust_loop(&self, sound: &mut SoundService, name: &str, f: impl Fn(f64) -> f64) {
        if let Some(voice) = sound.get_loop(name) {
            if let Some(volume) = sound.volume(voice) {
                sound.set_volume(voice, f(volume));
            }
        }
    }
}
