//! Motion model: operator inputs → speed, acceleration and braking rate.
//!
//! Pure numeric state machine, evaluated once per tick in a fixed order:
//!
//! 1. Engine off → passive coasting decay by `gravity_braking_factor * dt`.
//! 2. Throttle held, engine on, not forced braking → braking rate resets,
//!    acceleration grows toward its ceiling, speed grows toward max speed.
//! 3. Brake held or forced braking → acceleration resets, braking rate grows
//!    toward its ceiling, speed drops toward the braking floor.
//! 4. Otherwise the braking flag clears; rates are left untouched.
//!
//! With [`ThrottleBrakePolicy::DualApply`] rules 2 and 3 both run when throttle
//! and brake are asserted together, braking last. With
//! [`ThrottleBrakePolicy::BrakePriority`] rule 2 is skipped while braking.
//!
//! The model never clamps `dt`. A zero-length tick is not a step and leaves
//! the state untouched.

use rail_common::config::MotionConfig;
use rail_common::settings::TrainSettings;
use rail_common::state::ThrottleBrakePolicy;

/// Per-tick inputs to the motion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionInputs {
    pub throttle_held: bool,
    pub brake_held: bool,
    pub engine_on: bool,
    pub forced_braking: bool,
    pub stopping_at_station: bool,
}

/// Session mode flags, owned by the simulator and toggled by controls or the
/// station-stop sequencer. Combined with held controls into [`MotionInputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    pub engine_on: bool,
    pub forced_braking: bool,
    pub stopping_at_station: bool,
}

impl ModeFlags {
    /// Build the tick inputs from these flags and the held controls.
    #[inline]
    pub const fn inputs(&self, throttle_held: bool, brake_held: bool) -> MotionInputs {
        MotionInputs {
            throttle_held,
            brake_held,
            engine_on: self.engine_on,
            forced_braking: self.forced_braking,
            stopping_at_station: self.stopping_at_station,
        }
    }
}

/// Current motion state. Mutated only by [`MotionModel::tick`] and
/// [`MotionModel::reset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub speed: f64,
    pub acceleration: f64,
    pub braking_speed: f64,

    pub maximum_speed: f64,
    pub maximum_acceleration: f64,
    pub maximum_braking_speed: f64,

    pub acceleration_factor: f64,
    pub braking_factor: f64,
    pub gravity_braking_factor: f64,

    pub engine_on: bool,
    pub forced_braking: bool,
    pub stopping_at_station: bool,
    /// Set while braking is being applied; cleared by throttling or release.
    pub braking: bool,
}

impl MotionState {
    fn from_settings(settings: &TrainSettings) -> Self {
        Self {
            speed: 0.0,
            acceleration: settings.acceleration,
            braking_speed: settings.braking_speed,
            maximum_speed: settings.maximum_speed,
            maximum_acceleration: settings.maximum_acceleration,
            maximum_braking_speed: settings.maximum_braking_speed,
            acceleration_factor: settings.acceleration_factor,
            braking_factor: settings.braking_factor,
            gravity_braking_factor: settings.gravity_braking_factor,
            engine_on: false,
            forced_braking: false,
            stopping_at_station: false,
            braking: false,
        }
    }
}

/// What happened during one tick, for the audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionTick {
    /// The throttle rule ran.
    pub throttling: bool,
    /// The braking rule ran.
    pub braking: bool,
    /// Braking flag went false → true.
    pub braking_started: bool,
    /// Braking flag went true → false.
    pub braking_released: bool,
}

/// Per-tick motion state machine.
#[derive(Debug, Clone)]
pub struct MotionModel {
    state: MotionState,
    starting_acceleration: f64,
    starting_braking_speed: f64,
    idle_crawl_speed: f64,
    policy: ThrottleBrakePolicy,
}

impl MotionModel {
    pub fn new(settings: &TrainSettings, config: &MotionConfig) -> Self {
        Self {
            state: MotionState::from_settings(settings),
            starting_acceleration: settings.acceleration,
            starting_braking_speed: settings.braking_speed,
            idle_crawl_speed: config.idle_crawl_speed,
            policy: config.throttle_brake_policy,
        }
    }

    #[inline]
    pub const fn state(&self) -> &MotionState {
        &self.state
    }

    #[inline]
    pub const fn speed(&self) -> f64 {
        self.state.speed
    }

    #[inline]
    pub const fn starting_acceleration(&self) -> f64 {
        self.starting_acceleration
    }

    #[inline]
    pub const fn starting_braking_speed(&self) -> f64 {
        self.starting_braking_speed
    }

    #[inline]
    pub const fn policy(&self) -> ThrottleBrakePolicy {
        self.policy
    }

    /// Advance the model by `dt` seconds.
    pub fn tick(&mut self, dt: f64, inputs: &MotionInputs) -> MotionTick {
        if dt == 0.0 {
            return MotionTick::default();
        }

        let s = &mut self.state;
        let was_braking = s.braking;

        s.engine_on = inputs.engine_on;
        s.forced_braking = inputs.forced_braking;
        s.stopping_at_station = inputs.stopping_at_station;

        // 1. Coasting decay.
        if !inputs.engine_on {
            s.speed = (s.speed - s.gravity_braking_factor * dt).max(0.0);
        }

        let braking = inputs.brake_held || inputs.forced_braking;
        let throttling = inputs.throttle_held
            && inputs.engine_on
            && !inputs.forced_braking
            && !(braking && self.policy == ThrottleBrakePolicy::BrakePriority);

        // 2. Throttle.
        if throttling {
            s.braking_speed = self.starting_braking_speed;
            s.braking = false;

            s.acceleration = (s.acceleration
                + self.starting_acceleration * s.acceleration_factor)
                .min(s.maximum_acceleration);
            s.speed = (s.speed + s.acceleration * dt).min(s.maximum_speed);
        }

        // 3. Brake.
        if braking {
            s.acceleration = self.starting_acceleration;

            s.braking_speed = (s.braking_speed + self.starting_braking_speed * s.braking_factor)
                .min(s.maximum_braking_speed);

            // Braking never raises speed, even when below the crawl floor.
            let floor = if inputs.forced_braking && !inputs.stopping_at_station {
                self.idle_crawl_speed.min(s.speed)
            } else {
                0.0
            };
            s.speed = (s.speed - s.braking_speed * dt).max(floor);
            s.braking = true;
        } else if !throttling {
            // 4. Neither.
            s.braking = false;
        }

        MotionTick {
            throttling,
            braking,
            braking_started: !was_braking && s.braking,
            braking_released: was_braking && !s.braking,
        }
    }

    /// Return to rest: zero speed, starting rates, all mode flags cleared.
    pub fn reset(&mut self) {
        let s = &mut self.state;
        s.speed = 0.0;
        s.acceleration = self.starting_acceleration;
        s.braking_speed = self.starting_braking_speed;
        s.engine_on = false;
        s.forced_braking = false;
        s.stopping_at_station = false;
        s.braking = false;
    }
}
