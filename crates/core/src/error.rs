//! Error types for the textlens highlight engine.

use thiserror::Error;

/// Primary error type for geometry and highlight operations.
///
/// Missing OCR geometry never surfaces here; the last computed rectangle
/// is reused instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HighlightError {
    #[error("invalid image size {width}x{height}: both dimensions must be finite and > 0")]
    InvalidImageSize { width: f64, height: f64 },

    #[error("invalid view size {width}x{height}: both dimensions must be finite and > 0")]
    InvalidViewSize { width: f64, height: f64 },

    #[error("invalid zoom factor: {0}")]
    InvalidZoom(f64),

    #[error("invalid pan delta ({dx}, {dy})")]
    InvalidPan { dx: f64, dy: f64 },

    #[error("invalid pointer position ({x}, {y})")]
    InvalidPoint { x: f64, y: f64 },

    #[error("invalid viewer params: {0}")]
    InvalidParams(String),

    #[error("no highlight tree has been built for the current image")]
    NoTree,
}

/// Convenience Result type alias for HighlightError.
pub type Result<T> = std::result::Result<T, HighlightError>;
