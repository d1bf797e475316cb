//! Highlight tree: a view-space mirror of the OCR hierarchy.
//!
//! Shape (block, line and element counts and their order) is fixed when the
//! tree is built. Afterwards only rectangles and colors change, so the
//! child vectors are private and only exposed as slices.

use std::sync::Arc;

use crate::ocr::{TextBlock, TextElement, TextLine};
use crate::utils::{HasRect, Rect};

use super::color::Color;

/// Position of a leaf element inside a tree, in walk order.
///
/// Ordering follows the depth-first block → line → element walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementPath {
    pub block: usize,
    pub line: usize,
    pub element: usize,
}

impl ElementPath {
    pub fn new(block: usize, line: usize, element: usize) -> Self {
        Self {
            block,
            line,
            element,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightElement {
    source: Arc<TextElement>,
    pub(crate) rect: Rect,
    pub(crate) color: Color,
}

impl HighlightElement {
    pub(crate) fn new(source: Arc<TextElement>, rect: Rect, color: Color) -> Self {
        Self {
            source,
            rect,
            color,
        }
    }

    /// The OCR element this box was built from.
    pub fn source(&self) -> &Arc<TextElement> {
        &self.source
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightLine {
    source: Arc<TextLine>,
    pub(crate) rect: Rect,
    pub(crate) color: Color,
    pub(crate) elements: Vec<HighlightElement>,
}

impl HighlightLine {
    pub(crate) fn new(source: Arc<TextLine>, rect: Rect, color: Color) -> Self {
        Self {
            source,
            rect,
            color,
            elements: Vec::new(),
        }
    }

    pub fn source(&self) -> &Arc<TextLine> {
        &self.source
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn elements(&self) -> &[HighlightElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [HighlightElement] {
        &mut self.elements
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightBlock {
    source: Arc<TextBlock>,
    pub(crate) rect: Rect,
    pub(crate) color: Color,
    pub(crate) lines: Vec<HighlightLine>,
}

impl HighlightBlock {
    pub(crate) fn new(source: Arc<TextBlock>, rect: Rect, color: Color) -> Self {
        Self {
            source,
            rect,
            color,
            lines: Vec::new(),
        }
    }

    pub fn source(&self) -> &Arc<TextBlock> {
        &self.source
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn lines(&self) -> &[HighlightLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [HighlightLine] {
        &mut self.lines
    }
}

impl HasRect for HighlightElement {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl HasRect for HighlightLine {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl HasRect for HighlightBlock {
    fn rect(&self) -> Rect {
        self.rect
    }
}

/// Every block of one recognized image, in OCR order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightTree {
    pub(crate) blocks: Vec<HighlightBlock>,
}

impl HighlightTree {
    pub fn blocks(&self) -> &[HighlightBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [HighlightBlock] {
        &mut self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }

    pub fn element_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .map(|line| line.elements.len())
            .sum()
    }

    pub fn element(&self, path: ElementPath) -> Option<&HighlightElement> {
        self.blocks
            .get(path.block)?
            .lines
            .get(path.line)?
            .elements
            .get(path.element)
    }

    pub fn element_mut(&mut self, path: ElementPath) -> Option<&mut HighlightElement> {
        self.blocks
            .get_mut(path.block)?
            .lines
            .get_mut(path.line)?
            .elements
            .get_mut(path.element)
    }

    /// Iterates over every leaf element together with its path, in walk order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementPath, &HighlightElement)> {
        self.blocks.iter().enumerate().flat_map(|(bi, block)| {
            block.lines.iter().enumerate().flat_map(move |(li, line)| {
                line.elements
                    .iter()
                    .enumerate()
                    .map(move |(ei, element)| (ElementPath::new(bi, li, ei), element))
            })
        })
    }

    /// Mutable counterpart of [`HighlightTree::elements`].
    pub fn elements_mut(&mut self) -> impl Iterator<Item = (ElementPath, &mut HighlightElement)> {
        self.blocks.iter_mut().enumerate().flat_map(|(bi, block)| {
            block.lines.iter_mut().enumerate().flat_map(move |(li, line)| {
                line.elements
                    .iter_mut()
                    .enumerate()
                    .map(move |(ei, element)| (ElementPath::new(bi, li, ei), element))
            })
        })
    }

    /// Sets every element's color. Lines and blocks keep theirs.
    pub fn fill_elements(&mut self, color: Color) {
        for (_, element) in self.elements_mut() {
            element.color = color;
        }
    }
}
