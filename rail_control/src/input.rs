//! Logical input surface: keys, held controls and per-frame actions.
//!
//! Device handling lives outside the core. A frame is the set of controls
//! held during the tick plus the actions pressed since the previous one.
//!
//! Text form (one frame per line, used by the headless driver):
//!
//! ```text
//! w            throttle held
//! s l          brake held, lights toggled
//! e            engine toggled
//! esc          exit
//! station      begin a station stop
//! .            idle frame
//! ```

use std::str::FromStr;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Controls held for the whole tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeldControls: u8 {
        const THROTTLE = 0x01;
        const BRAKE    = 0x02;
    }
}

impl Default for HeldControls {
    fn default() -> Self {
        Self::empty()
    }
}

/// Edge-triggered operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    ToggleEngine,
    ToggleLights,
    Horn,
    /// Restart the whole session.
    Reset,
    /// End the session.
    Exit,
    /// Developer-only forced-braking toggle.
    ToggleForcedBraking,
    /// Begin a station stop (normally raised by track-side triggers).
    StationStop,
    CancelStationStop,
}

/// Physical key binding of the simulator controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Throttle,
    Brake,
    Engine,
    Lights,
    Horn,
    Reset,
    Exit,
    ForcedBrakingDev,
}

impl ControlKey {
    /// Held control for hold-type keys.
    pub const fn held(self) -> Option<HeldControls> {
        match self {
            Self::Throttle => Some(HeldControls::THROTTLE),
            Self::Brake => Some(HeldControls::BRAKE),
            _ => None,
        }
    }

    /// Action for press-type keys.
    pub const fn action(self) -> Option<ControlAction> {
        match self {
            Self::Engine => Some(ControlAction::ToggleEngine),
            Self::Lights => Some(ControlAction::ToggleLights),
            Self::Horn => Some(ControlAction::Horn),
            Self::Reset => Some(ControlAction::Reset),
            Self::Exit => Some(ControlAction::Exit),
            Self::ForcedBrakingDev => Some(ControlAction::ToggleForcedBraking),
            Self::Throttle | Self::Brake => None,
        }
    }
}

impl FromStr for ControlKey {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" => Ok(Self::Throttle),
            "s" => Ok(Self::Brake),
            "e" => Ok(Self::Engine),
            "l" => Ok(Self::Lights),
            "h" => Ok(Self::Horn),
            "r" => Ok(Self::Reset),
            "esc" | "escape" => Ok(Self::Exit),
            "b" => Ok(Self::ForcedBrakingDev),
            _ => Err(InputError::UnknownKey(s.to_string())),
        }
    }
}

/// Input parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown key: {0:?}")]
    UnknownKey(String),
}

/// Inputs for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputFrame {
    pub held: HeldControls,
    pub pressed: Vec<ControlAction>,
}

impl InputFrame {
    /// Nothing held, nothing pressed.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn holding(held: HeldControls) -> Self {
        Self {
            held,
            pressed: Vec::new(),
        }
    }

    pub fn pressing(action: ControlAction) -> Self {
        Self {
            held: HeldControls::empty(),
            pressed: vec![action],
        }
    }

    /// Add a pressed action.
    pub fn with(mut self, action: ControlAction) -> Self {
        self.pressed.push(action);
        self
    }

    #[inline]
    pub fn throttle_held(&self) -> bool {
        self.held.contains(HeldControls::THROTTLE)
    }

    #[inline]
    pub fn brake_held(&self) -> bool {
        self.held.contains(HeldControls::BRAKE)
    }

    /// Apply a key event: hold keys set held flags, others queue an action.
    pub fn press_key(&mut self, key: ControlKey) {
        if let Some(held) = key.held() {
            self.held |= held;
        } else if let Some(action) = key.action() {
            self.pressed.push(action);
        }
    }

    /// Parse one line of the text form.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let mut frame = Self::idle();
        for token in line.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "." => {}
                "station" => frame.pressed.push(ControlAction::StationStop),
                "cancel" => frame.pressed.push(ControlAction::CancelStationStop),
                _ => frame.press_key(token.parse()?),
            }
        }
        Ok(frame)
    }
}
