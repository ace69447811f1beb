//! Parameter groups shared by several operations.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Locator ──────────────────────────────────────────────────────

/// Addresses a whole channel (`1`) or one layer of it (`1-10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub channel: u32,
    pub layer: Option<u32>,
}

impl Locator {
    /// A whole channel.
    pub fn channel(channel: u32) -> Self {
        Self {
            channel,
            layer: None,
        }
    }

    /// A single layer within a channel.
    pub fn layer(channel: u32, layer: u32) -> Self {
        Self {
            channel,
            layer: Some(layer),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layer {
            Some(layer) => write!(f, "{}-{}", self.channel, layer),
            None => write!(f, "{}", self.channel),
        }
    }
}

// ── Transition ───────────────────────────────────────────────────

/// Visual effect applied when a resource is played or loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transition {
    /// `CUT`, `MIX`, `PUSH`, `WIPE`, `SLIDE`.
    pub kind: String,
    /// Length of the effect in frames.
    pub duration: u32,
    /// Tween name, e.g. `Linear` or `EaseInSine`.
    pub easing: String,
    /// `LEFT` or `RIGHT`.
    pub direction: String,
}

impl Transition {
    pub fn new(kind: impl Into<String>, duration: u32) -> Self {
        Self {
            kind: kind.into(),
            duration,
            ..Self::default()
        }
    }

    /// A hard cut.
    pub fn cut() -> Self {
        Self::default()
    }

    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = easing.into();
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = direction.into();
        self
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            kind: "CUT".into(),
            duration: 0,
            easing: "Linear".into(),
            direction: "RIGHT".into(),
        }
    }
}

// ── Tween ────────────────────────────────────────────────────────

/// Optional animation attached to a mixer change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tween {
    /// Animation length in frames.
    pub duration: u32,
    pub easing: String,
}

impl Tween {
    pub fn new(duration: u32, easing: impl Into<String>) -> Self {
        Self {
            duration,
            easing: easing.into(),
        }
    }
}

// ── Mixer groups ─────────────────────────────────────────────────

/// A single scalar mixer property (volume, opacity, brightness, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerValue {
    pub at: Locator,
    pub value: f32,
    pub tween: Option<Tween>,
    /// Stage the change until the next `MIXER COMMIT`.
    pub defer: bool,
}

impl MixerValue {
    pub fn new(at: Locator, value: f32) -> Self {
        Self {
            at,
            value,
            tween: None,
            defer: false,
        }
    }

    pub fn with_tween(mut self, tween: Tween) -> Self {
        self.tween = Some(tween);
        self
    }

    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }
}

/// Position and scale of a layer, in normalised coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, scale_x: f32, scale_y: f32) -> Self {
        Self {
            x,
            y,
            scale_x,
            scale_y,
        }
    }

    /// The identity rectangle covering the full frame.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub(crate) fn values(&self) -> [f32; 4] {
        [self.x, self.y, self.scale_x, self.scale_y]
    }
}

/// A point in normalised coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four corners for the perspective transform, clockwise from upper left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub upper_left: Point,
    pub upper_right: Point,
    pub lower_right: Point,
    pub lower_left: Point,
}

impl Quad {
    /// The untransformed frame.
    pub fn identity() -> Self {
        Self {
            upper_left: Point::new(0.0, 0.0),
            upper_right: Point::new(1.0, 0.0),
            lower_right: Point::new(1.0, 1.0),
            lower_left: Point::new(0.0, 1.0),
        }
    }

    pub(crate) fn values(&self) -> [f32; 8] {
        [
            self.upper_left.x,
            self.upper_left.y,
            self.upper_right.x,
            self.upper_right.y,
            self.lower_right.x,
            self.lower_right.y,
            self.lower_left.x,
            self.lower_left.y,
        ]
    }
}

/// Input/output levels and gamma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub min_input: f32,
    pub max_input: f32,
    pub gamma: f32,
    pub min_output: f32,
    pub max_output: f32,
}

impl Levels {
    pub(crate) fn values(&self) -> [f32; 5] {
        [
            self.min_input,
            self.max_input,
            self.gamma,
            self.min_output,
            self.max_output,
        ]
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            min_input: 0.0,
            max_input: 1.0,
            gamma: 1.0,
            min_output: 0.0,
            max_output: 1.0,
        }
    }
}

/// Chroma key settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chroma {
    /// `none`, `green` or `blue`.
    pub key: String,
    pub threshold: f32,
    pub spread: f32,
    pub spill: f32,
    pub blur: f32,
    /// Show the key mask instead of the keyed image.
    pub mask: bool,
}

impl Chroma {
    pub(crate) fn values(&self) -> [f32; 4] {
        [self.threshold, self.spread, self.spill, self.blur]
    }
}
