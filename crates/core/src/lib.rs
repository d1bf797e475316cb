//! textlens - geometry transform and hit-testing engine for OCR highlight overlays.
//!
//! Maps OCR bounding boxes from image pixel space into view space under a
//! fit-to-view scale plus user zoom and pan, keeps a block → line → element
//! box tree in sync with that transform, and resolves pointer positions to
//! the elements underneath.

pub mod error;
pub mod geometry;
pub mod highlight;
pub mod ocr;
pub mod params;
pub mod session;
pub mod utils;

pub use error::{HighlightError, Result};
pub use geometry::{ImageSize, Pan, ViewSize, ViewTransform, fit_offsets, fit_scale};
pub use highlight::{
    Color, ElementIndex, ElementPath, HighlightBlock, HighlightElement, HighlightLine,
    HighlightTree, Interaction, build_tree, build_tree_with, hit_elements, resolve, update_tree,
};
pub use ocr::{ImageRect, TextBlock, TextElement, TextLine, TextRecognition};
pub use params::ViewerParams;
pub use session::{BuildJob, BuiltTree, HighlightSession, RevisionObserver, SubscriptionId};
