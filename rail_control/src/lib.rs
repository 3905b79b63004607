//! # Rail Control Library
//!
//! Per-frame core of the rail motion simulator. Converts discrete operator
//! inputs into continuous speed state, moves the vehicle along an external
//! path and keeps engine, rail, braking, horn and door sounds in step with
//! that state.
//!
//! ## Tick Order
//!
//! 1. **MotionModel**: speed, acceleration and braking rate
//! 2. **PathDriver**: path progress from the new speed
//! 3. **AudioStateController**: sound lifecycle from the motion delta
//! 4. **StationStopSequencer**: multi-tick station stop
//! 5. **SoundService**: fades and one-shot lifetimes
//!
//! ## Single-Threaded
//!
//! Everything is owned by one [`simulator::Simulator`] and advanced from one
//! thread. Fades and the station stop are explicit state stepped per tick;
//! nothing blocks or spawns.

pub mod audio;
pub mod cycle;
pub mod input;
pub mod lights;
pub mod motion;
pub mod path;
pub mod simulator;
pub mod station;
