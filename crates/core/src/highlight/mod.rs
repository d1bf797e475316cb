//! Highlight tree module.
//!
//! This module contains:
//! - The view-space tree types (HighlightTree, HighlightBlock, HighlightLine, HighlightElement)
//! - Building a tree from a recognition result
//! - Re-projecting a tree after zoom/pan
//! - Hit testing and recoloring

pub mod build;
pub mod color;
pub mod hit;
pub mod tree;
pub mod update;

pub use build::{build_tree, build_tree_with};
pub use color::Color;
pub use hit::{ElementIndex, Interaction, hit_elements, recolor, resolve};
pub use tree::{ElementPath, HighlightBlock, HighlightElement, HighlightLine, HighlightTree};
pub use update::update_tree;
