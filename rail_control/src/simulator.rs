//! Simulator session: one vehicle, its sounds, lights and path cursor.
//!
//! Per tick, in order:
//!
//! 1. Pressed actions (reset and exit short-circuit the tick)
//! 2. `MotionModel::tick` with held controls and mode flags
//! 3. `PathDriver::advance` with the resulting speed, then the emitter
//!    position is read back from the cursor
//! 4. `AudioStateController::on_tick`
//! 5. `StationStopSequencer::tick`
//! 6. `SoundService::tick` (fades, one-shot lifetimes)

use rail_common::config::SimConfig;
use rail_common::settings::TrainSettings;
use rail_common::state::StationStopPhase;
use tracing::{debug, info, warn};

use crate::audio::backend::{AudioBackend, VoiceId};
use crate::audio::controller::AudioStateController;
use crate::audio::service::SoundService;
use crate::input::{ControlAction, InputFrame};
use crate::lights::LightBank;
use crate::motion::{ModeFlags, MotionModel, MotionState, MotionTick};
use crate::path::{PathCursor, PathDriver};
use crate::station::{SequenceError, StationStep, StationStopSequencer};

/// Whether the session continues after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

/// Complete per-frame simulator.
pub struct Simulator {
    motion: MotionModel,
    flags: ModeFlags,
    path: Box<dyn PathCursor>,
    audio: AudioStateController,
    sound: SoundService,
    station: StationStopSequencer,
    lights: LightBank,
    dev_mode: bool,
    last_tick: MotionTick,
    ticks: u64,
}

impl Simulator {
    pub fn new(
        config: &SimConfig,
        settings: &TrainSettings,
        backend: Box<dyn AudioBackend>,
        path: Box<dyn PathCursor>,
    ) -> Self {
        let sound = SoundService::with_config(backend, &config.audio);
        let mut audio = AudioStateController::new(&config.audio, &config.clips);
        audio.set_position(path.position());
        info!(
            "Simulator: backend={}, lights={}, dev_mode={}",
            sound.backend_name(),
            config.controls.light_count,
            config.controls.dev_mode
        );
        Self {
            motion: MotionModel::new(settings, &config.motion),
            flags: ModeFlags::default(),
            path,
            audio,
            sound,
            station: StationStopSequencer::new(&config.station),
            lights: LightBank::new(config.controls.light_count),
            dev_mode: config.controls.dev_mode,
            last_tick: MotionTick::default(),
            ticks: 0,
        }
    }

    /// Run one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f64, frame: &InputFrame) -> TickOutcome {
        for action in &frame.pressed {
            match action {
                ControlAction::Reset => {
                    self.reset();
                    return TickOutcome::Continue;
                }
                ControlAction::Exit => {
                    info!("Exit requested after {} ticks", self.ticks);
                    return TickOutcome::Exit;
                }
                ControlAction::ToggleEngine => self.toggle_engine(),
                ControlAction::ToggleLights => self.toggle_lights(),
                ControlAction::Horn => {
                    self.sound_horn();
                }
                ControlAction::ToggleForcedBraking => {
                    if self.dev_mode {
                        self.toggle_forced_braking();
                    } else {
                        debug!("Forced-braking toggle ignored outside dev mode");
                    }
                }
                ControlAction::StationStop => {
                    if let Err(e) = self.do_station_stop() {
                        warn!("Station stop rejected: {e}");
                    }
                }
                ControlAction::CancelStationStop => {
                    if let Err(e) = self.cancel_station_stop() {
                        warn!("Station stop cancel rejected: {e}");
                    }
                }
            }
        }

        if dt == 0.0 {
            return TickOutcome::Continue;
        }

        let inputs = self.flags.inputs(frame.throttle_held(), frame.brake_held());
        self.last_tick = self.motion.tick(dt, &inputs);
        let speed = self.motion.speed();

        if PathDriver::advance(self.path.as_mut(), speed) {
            self.audio.set_position(self.path.position());
        }

        self.audio
            .on_tick(dt, self.motion.state(), &self.last_tick, &mut self.sound);

        if let StationStep::Completed = self.station.tick(
            dt,
            speed,
            &mut self.flags,
            &mut self.audio,
            &mut self.sound,
        ) {
            debug!("Station stop finished at tick {}", self.ticks);
        }

        self.sound.tick(dt);
        self.ticks += 1;
        TickOutcome::Continue
    }

    // ─── Operator Controls ──────────────────────────────────────────

    pub fn toggle_engine(&mut self) {
        self.flags.engine_on = !self.flags.engine_on;
        debug!("Engine flag -> {}", self.flags.engine_on);
    }

    pub fn toggle_lights(&mut self) {
        self.lights.toggle();
    }

    /// Returns the horn voice, or `None` during the cooldown.
    pub fn sound_horn(&mut self) -> Option<VoiceId> {
        self.audio.sound_horn(&mut self.sound)
    }

    /// Flip the forced-braking override. Not gated by dev mode here; the
    /// input mapping applies that gate.
    pub fn toggle_forced_braking(&mut self) {
        self.flags.forced_braking = !self.flags.forced_braking;
        info!("Forced braking -> {}", self.flags.forced_braking);
    }

    /// Begin a station stop.
    pub fn do_station_stop(&mut self) -> Result<(), SequenceError> {
        self.station.begin(&mut self.flags)
    }

    pub fn cancel_station_stop(&mut self) -> Result<(), SequenceError> {
        self.station.cancel(&mut self.flags)
    }

    /// Restart the session: motion at rest, path at its start, silence,
    /// lights off, no station stop.
    pub fn reset(&mut self) {
        self.motion.reset();
        self.flags = ModeFlags::default();
        self.path.set_progress(0.0);
        self.station.reset();
        self.audio.reset(&mut self.sound);
        self.lights.reset();
        self.last_tick = MotionTick::default();
        info!("Session reset after {} ticks", self.ticks);
        self.ticks = 0;
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn motion(&self) -> &MotionState {
        self.motion.state()
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.motion.speed()
    }

    #[inline]
    pub const fn flags(&self) -> &ModeFlags {
        &self.flags
    }

    #[inline]
    pub const fn last_tick(&self) -> &MotionTick {
        &self.last_tick
    }

    pub fn progress(&self) -> f64 {
        self.path.progress()
    }

    #[inline]
    pub const fn sound(&self) -> &SoundService {
        &self.sound
    }

    #[inline]
    pub const fn lights(&self) -> &LightBank {
        &self.lights
    }

    #[inline]
    pub fn station_phase(&self) -> Option<StationStopPhase> {
        self.station.phase()
    }

    #[inline]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub const fn dev_mode(&self) -> bool {
        self.dev_mode
    }
}
