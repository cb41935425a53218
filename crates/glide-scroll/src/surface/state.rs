//! Value types describing a scroll position and its limits

use glide_core::math::{clamp, lerp};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollPosition {
    pub left: f64,
    pub top: f64,
}

impl ScrollPosition {
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Per-axis [`lerp`] toward `target`
    pub fn lerp_to(self, target: ScrollPosition, ease: f64, epsilon: f64) -> Self {
        Self {
            left: lerp(self.left, target.left, ease, epsilon),
            top: lerp(self.top, target.top, ease, epsilon),
        }
    }
}

/// Content and viewport extents of a scroll container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollBounds {
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl ScrollBounds {
    pub fn max_left(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }

    pub fn max_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    pub fn clamp_left(&self, left: f64) -> f64 {
        clamp(left, 0.0, self.max_left())
    }

    pub fn clamp_top(&self, top: f64) -> f64 {
        clamp(top, 0.0, self.max_top())
    }

    pub fn clamp(&self, position: ScrollPosition) -> ScrollPosition {
        ScrollPosition {
            left: self.clamp_left(position.left),
            top: self.clamp_top(position.top),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScrollBehavior {
    /// Jump, no interpolation
    #[default]
    Instant,
    Smooth,
}

/// Arguments of `scrollTo`; a missing axis keeps its value
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollToOptions {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub behavior: ScrollBehavior,
}

impl ScrollToOptions {
    pub fn top(top: f64) -> Self {
        Self {
            top: Some(top),
            ..Self::default()
        }
    }

    pub fn left(left: f64) -> Self {
        Self {
            left: Some(left),
            ..Self::default()
        }
    }

    pub fn with_behavior(mut self, behavior: ScrollBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn smooth(self) -> Self {
        self.with_behavior(ScrollBehavior::Smooth)
    }
}

/// State of a surface right after a render, shared with every observer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollSnapshot {
    pub current: ScrollPosition,
    pub target: ScrollPosition,
    pub bounds: ScrollBounds,
    /// Clock frame that produced this render, `None` for instant jumps
    pub frame: Option<u64>,
}
