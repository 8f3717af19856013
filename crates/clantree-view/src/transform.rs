use clantree_graph::Vec2;
use serde::{Deserialize, Serialize};

/// Size of the drawing surface in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Translate + uniform scale mapping layout space to screen space:
/// `screen = layout * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn new(translate_x: f32, translate_y: f32, scale: f32) -> Self {
        Self {
            translate_x,
            translate_y,
            scale,
        }
    }

    /// Transform that puts `point` at the center of `viewport` at `scale`.
    pub fn centered_on(point: Vec2, scale: f32, viewport: ViewportSize) -> Self {
        Self {
            translate_x: -point.x * scale + viewport.width / 2.0,
            translate_y: -point.y * scale + viewport.height / 2.0,
            scale,
        }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    pub fn with_translation(self, translation: Vec2) -> Self {
        Self {
            translate_x: translation.x,
            translate_y: translation.y,
            ..self
        }
    }

    /// Layout space to screen space.
    pub fn apply(&self, layout: Vec2) -> Vec2 {
        layout * self.scale + self.translation()
    }

    /// Screen space to layout space.
    pub fn invert(&self, screen: Vec2) -> Vec2 {
        let offset = screen - self.translation();
        Vec2::new(offset.x / self.scale, offset.y / self.scale)
    }

    /// Component-wise interpolation, `t` in `[0, 1]`.
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: mix(self.scale, to.scale),
        }
    }
}
