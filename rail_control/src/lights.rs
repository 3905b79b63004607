//! Vehicle light bank. Toggle only; no brightness model.

use tracing::debug;

/// One light's enabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Light {
    pub enabled: bool,
}

/// Ordered set of lights toggled together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LightBank {
    lights: Vec<Light>,
    lights_on: bool,
}

impl LightBank {
    /// Bank of `count` lights, all disabled.
    pub fn new(count: usize) -> Self {
        Self {
            lights: vec![Light::default(); count],
            lights_on: false,
        }
    }

    /// Invert every light's enabled flag and the bank state.
    pub fn toggle(&mut self) {
        self.lights_on = !self.lights_on;
        for light in &mut self.lights {
            light.enabled = !light.enabled;
        }
        debug!("Lights {}", if self.lights_on { "on" } else { "off" });
    }

    /// All lights off.
    pub fn reset(&mut self) {
        self.lights_on = false;
        self.lights.iter_mut().for_each(|l| l.enabled = false);
    }

    #[inline]
    pub const fn lights_on(&self) -> bool {
        self.lights_on
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}
