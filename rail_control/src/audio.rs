//! Audio module root.
//!
//! Playback backend seam, the owned sound registry with fades and one-shot
//! lifetimes, and the controller that maps motion state to sound lifecycle
//! events.

pub mod backend;
pub mod controller;
pub mod service;
