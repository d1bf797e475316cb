//! Display colors for highlight boxes.

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Default fill for every freshly built box: orange at 50% opacity.
    pub const HIGHLIGHT: Color = Color::rgba(1.0, 0.5, 0.0, 0.5);

    /// Applied to elements hit by a tap: blue at 50% opacity.
    pub const TAP: Color = Color::rgba(0.0, 0.0, 1.0, 0.5);

    /// Applied to elements swept by a drag: red at 50% opacity.
    pub const DRAG: Color = Color::rgba(1.0, 0.0, 0.0, 0.5);

    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    /// Packs the color as `0xAARRGGBB`, the layout Android and most
    /// canvas APIs expect.
    pub fn to_argb(&self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::HIGHLIGHT
    }
}
