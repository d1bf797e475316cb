//! Viewer parameters.
//!
//! Contains ViewerParams for controlling zoom limits and highlight colors.

use crate::error::{HighlightError, Result};
use crate::highlight::color::Color;

/// Parameters for the interactive highlight viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerParams {
    /// Lower bound applied to the accumulated zoom factor.
    pub min_zoom: f64,

    /// Upper bound applied to the accumulated zoom factor.
    pub max_zoom: f64,

    /// Fill assigned to every box when a tree is built.
    pub highlight_color: Color,

    /// Fill applied to elements under a tap.
    pub tap_color: Color,

    /// Fill applied to elements under a drag.
    pub drag_color: Color,
}

impl Default for ViewerParams {
    fn default() -> Self {
        Self {
            min_zoom: 0.3,
            max_zoom: 5.0,
            highlight_color: Color::HIGHLIGHT,
            tap_color: Color::TAP,
            drag_color: Color::DRAG,
        }
    }
}

impl ViewerParams {
    /// Checks zoom limits and colors.
    pub fn validate(&self) -> Result<()> {
        if !self.min_zoom.is_finite() || self.min_zoom <= 0.0 {
            return Err(HighlightError::InvalidParams(format!(
                "min_zoom must be finite and > 0, got {}",
                self.min_zoom
            )));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return Err(HighlightError::InvalidParams(format!(
                "max_zoom must be finite and >= min_zoom ({}), got {}",
                self.min_zoom, self.max_zoom
            )));
        }
        for (name, color) in [
            ("highlight_color", self.highlight_color),
            ("tap_color", self.tap_color),
            ("drag_color", self.drag_color),
        ] {
            if !color.is_valid() {
                return Err(HighlightError::InvalidParams(format!(
                    "{name} components must lie in [0, 1], got {color:?}"
                )));
            }
        }
        Ok(())
    }

    /// Clamps an accumulated zoom factor into `[min_zoom, max_zoom]`.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
