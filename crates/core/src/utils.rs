//! Shared geometric types and helpers.
//!
//! Rectangles are `(left, top, right, bottom)` tuples with the origin at the
//! top-left corner and y growing downwards, in either image or view space
//! depending on context.

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (left, top, right, bottom).
pub type Rect = (f64, f64, f64, f64);

/// The all-zero rectangle used before any geometry has been computed.
pub const EMPTY_RECT: Rect = (0.0, 0.0, 0.0, 0.0);

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Compares two rectangles component-wise for approximate equality.
pub fn rect_approx_eq(a: Rect, b: Rect, epsilon: f64) -> bool {
    approx_eq(a.0, b.0, epsilon)
        && approx_eq(a.1, b.1, epsilon)
        && approx_eq(a.2, b.2, epsilon)
        && approx_eq(a.3, b.3, epsilon)
}

/// Returns true if the point lies inside the rectangle, bounds included.
///
/// A rectangle whose left edge is right of its right edge (or top below
/// bottom) contains nothing.
#[inline]
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    let (left, top, right, bottom) = rect;
    let (x, y) = point;
    left <= x && x <= right && top <= y && y <= bottom
}

/// Trait for objects that carry a view-space rectangle.
pub trait HasRect {
    fn rect(&self) -> Rect;

    fn left(&self) -> f64 {
        self.rect().0
    }

    fn top(&self) -> f64 {
        self.rect().1
    }

    fn right(&self) -> f64 {
        self.rect().2
    }

    fn bottom(&self) -> f64 {
        self.rect().3
    }

    fn width(&self) -> f64 {
        self.right() - self.left()
    }

    fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    fn contains_point(&self, point: Point) -> bool {
        rect_contains(self.rect(), point)
    }
}

/// Formats a rectangle as a comma-separated string.
pub fn rect2str(rect: Rect) -> String {
    let (left, top, right, bottom) = rect;
    format!("{:.3},{:.3},{:.3},{:.3}", left, top, right, bottom)
}
