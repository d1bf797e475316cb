//! Recognized-text hierarchy as delivered by the OCR engine.
//!
//! The engine reports blocks, each holding lines, each holding elements
//! (usually words). Every node may carry an axis-aligned bounding box in
//! image pixel coordinates. Text, confidence and language are passed through
//! for the host's benefit; the highlight engine only ever reads the boxes.
//!
//! Nodes are stored behind `Arc` so highlight trees can hold cheap handles
//! back to their source without copying or borrowing the recognition result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utils::Rect;

/// Axis-aligned box in image pixel space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ImageRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn as_rect(&self) -> Rect {
        (self.left, self.top, self.right, self.bottom)
    }
}

impl From<Rect> for ImageRect {
    fn from(rect: Rect) -> Self {
        Self::new(rect.0, rect.1, rect.2, rect.3)
    }
}

/// Anything in the recognition hierarchy that may report a bounding box.
pub trait SourceGeometry {
    fn bounding_box(&self) -> Option<ImageRect>;
}

/// Leaf of the hierarchy, typically a single word.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounding_box: Option<ImageRect>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounding_box: Option<ImageRect>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub elements: Vec<Arc<TextElement>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounding_box: Option<ImageRect>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub lines: Vec<Arc<TextLine>>,
}

/// Full recognition result for one image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRecognition {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<Arc<TextBlock>>,
}

impl SourceGeometry for TextElement {
    fn bounding_box(&self) -> Option<ImageRect> {
        self.bounding_box
    }
}

impl SourceGeometry for TextLine {
    fn bounding_box(&self) -> Option<ImageRect> {
        self.bounding_box
    }
}

impl SourceGeometry for TextBlock {
    fn bounding_box(&self) -> Option<ImageRect> {
        self.bounding_box
    }
}

impl TextElement {
    pub fn new(text: impl Into<String>, bounding_box: Option<ImageRect>) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            ..Self::default()
        }
    }
}

impl TextLine {
    pub fn new(
        text: impl Into<String>,
        bounding_box: Option<ImageRect>,
        elements: Vec<TextElement>,
    ) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            elements: elements.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }
}

impl TextBlock {
    pub fn new(
        text: impl Into<String>,
        bounding_box: Option<ImageRect>,
        lines: Vec<TextLine>,
    ) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            lines: lines.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }
}

impl TextRecognition {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        let text = blocks
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            text,
            blocks: blocks.into_iter().map(Arc::new).collect(),
        }
    }

    /// Total number of elements across all blocks and lines.
    pub fn element_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .map(|line| line.elements.len())
            .sum()
    }

    /// Total number of lines across all blocks.
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let recognition = TextRecognition::new(vec![
            TextBlock::new(
                "a b",
                None,
                vec![TextLine::new(
                    "a b",
                    None,
                    vec![TextElement::new("a", None), TextElement::new("b", None)],
                )],
            ),
            TextBlock::new("c", None, vec![TextLine::new("c", None, vec![])]),
        ]);
        assert_eq!(recognition.blocks.len(), 2);
        assert_eq!(recognition.line_count(), 2);
        assert_eq!(recognition.element_count(), 2);
        assert_eq!(recognition.text, "a b\nc");
    }

    #[test]
    fn test_image_rect_from_tuple() {
        let rect = ImageRect::from((1.0, 2.0, 3.0, 4.0));
        assert_eq!(rect.as_rect(), (1.0, 2.0, 3.0, 4.0));
    }
}
