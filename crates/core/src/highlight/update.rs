//! Re-projecting an existing highlight tree after zoom or pan.

use tracing::trace;

use crate::error::Result;
use crate::geometry::{ImageSize, Pan, ViewSize, ViewTransform};
use crate::ocr::SourceGeometry;

use super::build::RectProjector;
use super::tree::HighlightTree;

/// Re-projects every rectangle of `tree` for a new zoom and pan.
///
/// Rectangles are always recomputed from the source boxes held by the OCR
/// nodes, never from the current view rectangles, so any sequence of
/// updates ending with the same parameters yields the same rectangles.
/// Colors are left untouched.
pub fn update_tree(
    tree: &mut HighlightTree,
    image: ImageSize,
    view: ViewSize,
    zoom: f64,
    pan: Pan,
) -> Result<ViewTransform> {
    let transform = ViewTransform::new(image, view, zoom, pan)?;
    apply_transform(tree, transform);
    Ok(transform)
}

pub(crate) fn apply_transform(tree: &mut HighlightTree, transform: ViewTransform) {
    let mut projector = RectProjector::new(transform);
    for block in &mut tree.blocks {
        block.rect = projector.project(block.source().bounding_box());
        for line in &mut block.lines {
            line.rect = projector.project(line.source().bounding_box());
            for element in &mut line.elements {
                element.rect = projector.project(element.source().bounding_box());
            }
        }
    }
    trace!(
        scale = transform.scale,
        offset_x = transform.offset_x,
        offset_y = transform.offset_y,
        "re-projected highlight tree"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::build::build_tree;
    use crate::highlight::color::Color;
    use crate::ocr::{ImageRect, TextBlock, TextElement, TextLine, TextRecognition};
    use crate::utils::{EPSILON, HasRect, rect_approx_eq};

    fn fixture() -> TextRecognition {
        TextRecognition::new(vec![TextBlock::new(
            "a",
            Some(ImageRect::new(0.0, 0.0, 100.0, 50.0)),
            vec![TextLine::new(
                "a",
                Some(ImageRect::new(0.0, 0.0, 100.0, 50.0)),
                vec![TextElement::new(
                    "a",
                    Some(ImageRect::new(0.0, 0.0, 100.0, 50.0)),
                )],
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
    fn test_zoom_two_reprojects_from_source() {
        let (image, view) = sizes();
        let mut tree = build_tree(&fixture(), image, view).unwrap();
        let transform = update_tree(&mut tree, image, view, 2.0, Pan::ZERO).unwrap();
        assert!((transform.scale - 0.8).abs() < EPSILON);
        let (_, element) = tree.elements().next().unwrap();
        assert!(rect_approx_eq(
            element.rect(),
            (-200.0, 0.0, -120.0, 40.0),
            EPSILON
        ));
    }

    #[test]
    fn test_update_with_initial_fit_matches_build() {
        let (image, view) = sizes();
        let built = build_tree(&fixture(), image, view).unwrap();
        let mut updated = built.clone();
        update_tree(&mut updated, image, view, 3.0, Pan::new(5.0, 9.0).unwrap()).unwrap();
        update_tree(&mut updated, image, view, 1.0, Pan::ZERO).unwrap();
        assert_eq!(updated, built);
    }

    #[test]
    fn test_update_preserves_colors() {
        let (image, view) = sizes();
        let mut tree = build_tree(&fixture(), image, view).unwrap();
        tree.fill_elements(Color::DRAG);
        update_tree(&mut tree, image, view, 1.5, Pan::new(10.0, 10.0).unwrap()).unwrap();
        assert!(tree.elements().all(|(_, e)| e.color() == Color::DRAG));
        assert_eq!(tree.blocks()[0].color(), Color::HIGHLIGHT);
    }

    #[test]
    fn test_invalid_zoom_leaves_tree_untouched() {
        let (image, view) = sizes();
        let mut tree = build_tree(&fixture(), image, view).unwrap();
        let before = tree.clone();
        assert!(update_tree(&mut tree, image, view, 0.0, Pan::ZERO).is_err());
        assert_eq!(tree, before);
    }
}
