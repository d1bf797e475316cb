//! Building a highlight tree from a recognition result.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::geometry::{ImageSize, ViewSize, ViewTransform};
use crate::ocr::{ImageRect, TextRecognition};
use crate::params::ViewerParams;
use crate::utils::{EMPTY_RECT, Rect};

use super::color::Color;
use super::tree::{HighlightBlock, HighlightElement, HighlightLine, HighlightTree};

/// Projects source boxes through one transform during a depth-first walk.
///
/// Nodes without a source box take the rectangle most recently produced by
/// the walk (all-zero before the first one). Builder and updater share this
/// so an update with the initial transform reproduces the built tree.
pub(crate) struct RectProjector {
    transform: ViewTransform,
    last: Rect,
}

impl RectProjector {
    pub(crate) fn new(transform: ViewTransform) -> Self {
        Self {
            transform,
            last: EMPTY_RECT,
        }
    }

    #[inline]
    pub(crate) fn project(&mut self, source: Option<ImageRect>) -> Rect {
        if let Some(rect) = source {
            self.last = self.transform.apply_rect(rect.as_rect());
        }
        self.last
    }
}

/// Builds the initial tree (zoom 1, no pan) with the default highlight color.
pub fn build_tree(
    recognition: &TextRecognition,
    image: ImageSize,
    view: ViewSize,
) -> Result<HighlightTree> {
    build_tree_with(recognition, image, view, &ViewerParams::default())
}

/// Builds the initial tree using the highlight color from `params`.
pub fn build_tree_with(
    recognition: &TextRecognition,
    image: ImageSize,
    view: ViewSize,
    params: &ViewerParams,
) -> Result<HighlightTree> {
    let transform = ViewTransform::fit(image, view)?;
    Ok(build_with_transform(
        recognition,
        transform,
        params.highlight_color,
    ))
}

pub(crate) fn build_with_transform(
    recognition: &TextRecognition,
    transform: ViewTransform,
    color: Color,
) -> HighlightTree {
    let mut projector = RectProjector::new(transform);
    let mut blocks = Vec::with_capacity(recognition.blocks.len());

    for block in &recognition.blocks {
        let rect = projector.project(block.bounding_box);
        let mut highlight_block = HighlightBlock::new(Arc::clone(block), rect, color);
        highlight_block.lines.reserve(block.lines.len());

        for line in &block.lines {
            let rect = projector.project(line.bounding_box);
            let mut highlight_line = HighlightLine::new(Arc::clone(line), rect, color);
            highlight_line.elements.reserve(line.elements.len());

            for element in &line.elements {
                let rect = projector.project(element.bounding_box);
                highlight_line
                    .elements
                    .push(HighlightElement::new(Arc::clone(element), rect, color));
            }
            highlight_block.lines.push(highlight_line);
        }
        blocks.push(highlight_block);
    }

    let tree = HighlightTree { blocks };
    debug!(
        blocks = tree.blocks.len(),
        lines = tree.line_count(),
        elements = tree.element_count(),
        scale = transform.scale,
        offset_x = transform.offset_x,
        offset_y = transform.offset_y,
        "built highlight tree"
    );
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{TextBlock, TextElement, TextLine};
    use crate::utils::{EPSILON, HasRect, rect_approx_eq};

    fn fixture() -> TextRecognition {
        TextRecognition::new(vec![TextBlock::new(
            "hello world",
            Some(ImageRect::new(0.0, 0.0, 200.0, 50.0)),
            vec![TextLine::new(
                "hello world",
                Some(ImageRect::new(0.0, 0.0, 200.0, 50.0)),
                vec![
                    TextElement::new("hello", Some(ImageRect::new(0.0, 0.0, 100.0, 50.0))),
                    TextElement::new("world", Some(ImageRect::new(110.0, 0.0, 200.0, 50.0))),
                ],
            )],
        )])
    }

    fn sizes() -> (ImageSize, ViewSize) {
        (
            ImageSize::new(1000.0, 500.0).unwrap(),
            ViewSize::new(400.0, 400.0).unwrap(),
        )
    }

    #[test]
    fn test_build_projects_every_level() {
        let (image, view) = sizes();
        let tree = build_tree(&fixture(), image, view).unwrap();
        let block = &tree.blocks()[0];
        assert!(rect_approx_eq(block.rect(), (0.0, 100.0, 80.0, 120.0), EPSILON));
        let line = &block.lines()[0];
        assert!(rect_approx_eq(line.rect(), (0.0, 100.0, 80.0, 120.0), EPSILON));
        let hello = &line.elements()[0];
        assert!(rect_approx_eq(hello.rect(), (0.0, 100.0, 40.0, 120.0), EPSILON));
        let world = &line.elements()[1];
        assert!(rect_approx_eq(world.rect(), (44.0, 100.0, 80.0, 120.0), EPSILON));
    }

    #[test]
    fn test_build_assigns_highlight_color_everywhere() {
        let (image, view) = sizes();
        let tree = build_tree(&fixture(), image, view).unwrap();
        assert_eq!(tree.blocks()[0].color(), Color::HIGHLIGHT);
        assert_eq!(tree.blocks()[0].lines()[0].color(), Color::HIGHLIGHT);
        assert!(tree.elements().all(|(_, e)| e.color() == Color::HIGHLIGHT));
    }

    #[test]
    fn test_build_uses_params_color() {
        let (image, view) = sizes();
        let params = ViewerParams {
            highlight_color: Color::rgba(0.0, 1.0, 0.0, 0.25),
            ..ViewerParams::default()
        };
        let tree = build_tree_with(&fixture(), image, view, &params).unwrap();
        assert!(
            tree.elements()
                .all(|(_, e)| e.color() == Color::rgba(0.0, 1.0, 0.0, 0.25))
        );
    }

    #[test]
    fn test_missing_box_reuses_previous_rect() {
        let recognition = TextRecognition::new(vec![TextBlock::new(
            "",
            Some(ImageRect::new(0.0, 0.0, 500.0, 250.0)),
            vec![TextLine::new(
                "",
                None,
                vec![
                    TextElement::new("a", Some(ImageRect::new(10.0, 10.0, 20.0, 20.0))),
                    TextElement::new("b", None),
                ],
            )],
        )]);
        let (image, view) = sizes();
        let tree = build_tree(&recognition, image, view).unwrap();
        let block_rect = tree.blocks()[0].rect();
        let line = &tree.blocks()[0].lines()[0];
        assert_eq!(line.rect(), block_rect);
        assert_eq!(line.elements()[1].rect(), line.elements()[0].rect());
    }

    #[test]
    fn test_missing_box_before_any_geometry_is_zero() {
        let recognition = TextRecognition::new(vec![TextBlock::new(
            "",
            None,
            vec![TextLine::new("", None, vec![TextElement::new("x", None)])],
        )]);
        let (image, view) = sizes();
        let tree = build_tree(&recognition, image, view).unwrap();
        assert!(tree.elements().all(|(_, e)| e.rect() == EMPTY_RECT));
    }

    #[test]
    fn test_build_keeps_source_handles() {
        let recognition = fixture();
        let (image, view) = sizes();
        let tree = build_tree(&recognition, image, view).unwrap();
        let source = &recognition.blocks[0].lines[0].elements[1];
        assert!(Arc::ptr_eq(tree.blocks()[0].lines()[0].elements()[1].source(), source));
    }
}
