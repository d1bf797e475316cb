//! Mapping between image pixel space and on-screen view space.
//!
//! The image is fitted into the view preserving its aspect ratio ("fit",
//! never "fill"), centered along each axis, then scaled by the user's zoom
//! and shifted by the accumulated pan delta:
//!
//! ```text
//! scale    = min(view_w / image_w * zoom, view_h / image_h * zoom)
//! offset_x = (view_w - image_w * scale) / 2 + pan_x     (pan_x alone if centering is 0)
//! offset_y = (view_h - image_h * scale) / 2 + pan_y     (pan_y alone if centering is 0)
//! view     = image * scale + offset
//! ```

use crate::error::{HighlightError, Result};
use crate::utils::{Point, Rect};

/// Pixel dimensions of the decoded, orientation-corrected source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    width: f64,
    height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !is_positive_dimension(width) || !is_positive_dimension(height) {
            return Err(HighlightError::InvalidImageSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Convenience constructor for integer bitmap dimensions.
    pub fn from_pixels(width: u32, height: u32) -> Result<Self> {
        Self::new(f64::from(width), f64::from(height))
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Measured on-screen dimensions of the display area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSize {
    width: f64,
    height: f64,
}

impl ViewSize {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !is_positive_dimension(width) || !is_positive_dimension(height) {
            return Err(HighlightError::InvalidViewSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Interprets a layout measurement; zero means "not laid out yet".
    ///
    /// Returns `Ok(None)` when either side is exactly zero so callers can
    /// defer work until the first real measurement arrives.
    pub fn measured(width: f64, height: f64) -> Result<Option<Self>> {
        if width == 0.0 || height == 0.0 {
            return Ok(None);
        }
        Self::new(width, height).map(Some)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Accumulated pan delta in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pan {
    pub dx: f64,
    pub dy: f64,
}

impl Pan {
    pub const ZERO: Pan = Pan { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Result<Self> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(HighlightError::InvalidPan { dx, dy });
        }
        Ok(Self { dx, dy })
    }
}

#[inline]
fn is_positive_dimension(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_zoom(zoom: f64) -> Result<()> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(HighlightError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Computes the uniform scale that fits the image inside the view, times zoom.
///
/// Zoom is applied as given; clamping it into a sane range is the caller's job.
pub fn fit_scale(image: ImageSize, view: ViewSize, zoom: f64) -> Result<f64> {
    check_zoom(zoom)?;
    let scale_x = view.width / image.width * zoom;
    let scale_y = view.height / image.height * zoom;
    Ok(scale_x.min(scale_y))
}

/// Computes the offsets that center the scaled image in the view, plus pan.
///
/// When the image exactly fills an axis the centering term is zero and the
/// offset on that axis is the pan delta itself.
pub fn fit_offsets(scale: f64, image: ImageSize, view: ViewSize, pan: Pan) -> (f64, f64) {
    let centering_x = view.width - image.width * scale;
    let centering_y = view.height - image.height * scale;
    let offset_x = if centering_x == 0.0 {
        pan.dx
    } else {
        centering_x / 2.0 + pan.dx
    };
    let offset_y = if centering_y == 0.0 {
        pan.dy
    } else {
        centering_y / 2.0 + pan.dy
    };
    (offset_x, offset_y)
}

/// A uniform scale followed by a translation, image space to view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewTransform {
    /// The initial fit: zoom 1, no pan.
    pub fn fit(image: ImageSize, view: ViewSize) -> Result<Self> {
        Self::new(image, view, 1.0, Pan::ZERO)
    }

    pub fn new(image: ImageSize, view: ViewSize, zoom: f64, pan: Pan) -> Result<Self> {
        if !pan.dx.is_finite() || !pan.dy.is_finite() {
            return Err(HighlightError::InvalidPan {
                dx: pan.dx,
                dy: pan.dy,
            });
        }
        let scale = fit_scale(image, view, zoom)?;
        let (offset_x, offset_y) = fit_offsets(scale, image, view, pan);
        Ok(Self {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Projects an image-space point into view space.
    #[inline]
    pub fn apply_pt(&self, point: Point) -> Point {
        let (x, y) = point;
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    /// Projects an image-space rectangle into view space, corner by corner.
    #[inline]
    pub fn apply_rect(&self, rect: Rect) -> Rect {
        let (left, top) = self.apply_pt((rect.0, rect.1));
        let (right, bottom) = self.apply_pt((rect.2, rect.3));
        (left, top, right, bottom)
    }

    /// Maps a view-space point back into image space.
    pub fn invert_pt(&self, point: Point) -> Point {
        let (x, y) = point;
        (
            (x - self.offset_x) / self.scale,
            (y - self.offset_y) / self.scale,
        )
    }
}
