//! Resolving pointer positions to highlight elements.
//!
//! Every element whose rectangle contains the point matches, bounds
//! included. There is no topmost-wins rule: overlapping elements are all
//! reported and all recolored together.

use rstar::{AABB, RTree, RTreeObject};
use tracing::debug;

use crate::params::ViewerParams;
use crate::utils::{HasRect, Point, Rect, rect_contains};

use super::color::Color;
use super::tree::{ElementPath, HighlightTree};

/// Kind of pointer interaction, as classified by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Tap,
    Drag,
}

impl Interaction {
    /// The color this interaction paints with.
    pub fn color(self, params: &ViewerParams) -> Color {
        match self {
            Interaction::Tap => params.tap_color,
            Interaction::Drag => params.drag_color,
        }
    }
}

/// Returns the paths of all elements containing `point`, in walk order.
pub fn hit_elements(tree: &HighlightTree, point: Point) -> Vec<ElementPath> {
    tree.elements()
        .filter(|(_, element)| element.contains_point(point))
        .map(|(path, _)| path)
        .collect()
}

/// Recolors every element containing `point` and returns how many matched.
pub fn resolve(tree: &mut HighlightTree, point: Point, color: Color) -> usize {
    let mut matched = 0;
    for (_, element) in tree.elements_mut() {
        if element.contains_point(point) {
            element.color = color;
            matched += 1;
        }
    }
    debug!(x = point.0, y = point.1, matched, "resolved pointer");
    matched
}

/// Applies `color` to the given paths, skipping any that do not exist.
pub fn recolor(tree: &mut HighlightTree, paths: &[ElementPath], color: Color) -> usize {
    let mut applied = 0;
    for &path in paths {
        if let Some(element) = tree.element_mut(path) {
            element.color = color;
            applied += 1;
        }
    }
    applied
}

#[derive(Clone)]
struct IndexNode {
    path: ElementPath,
    rect: Rect,
}

impl RTreeObject for IndexNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        // Infinite bounds are clamped for the envelope only; `locate`
        // re-checks against the stored rect.
        let finite = |v: f64| v.clamp(f64::MIN, f64::MAX);
        let (l, t, r, b) = self.rect;
        AABB::from_corners([finite(l), finite(t)], [finite(r), finite(b)])
    }
}

/// R-tree snapshot of leaf rectangles under one view transform.
///
/// Answers the same question as [`hit_elements`] without walking every
/// leaf. The snapshot goes stale as soon as the tree is re-projected;
/// owners must rebuild it after each update.
pub struct ElementIndex {
    tree: RTree<IndexNode>,
    len: usize,
}

impl ElementIndex {
    pub fn new(tree: &HighlightTree) -> Self {
        let nodes: Vec<IndexNode> = tree
            .elements()
            .filter(|(_, element)| {
                let (l, t, r, b) = element.rect();
                ![l, t, r, b].iter().any(|v| v.is_nan())
            })
            .map(|(path, element)| IndexNode {
                path,
                rect: element.rect(),
            })
            .collect();
        let len = nodes.len();
        Self {
            tree: RTree::bulk_load(nodes),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Paths of all indexed elements containing `point`, in walk order.
    pub fn locate(&self, point: Point) -> Vec<ElementPath> {
        if !point.0.is_finite() || !point.1.is_finite() {
            return Vec::new();
        }
        let query = AABB::from_point([point.0, point.1]);
        // The envelope of an inverted rect is normalized, so re-check
        // containment against the stored rect.
        let mut paths: Vec<ElementPath> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter(|node| rect_contains(node.rect, point))
            .map(|node| node.path)
            .collect();
        paths.sort_unstable();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageSize, ViewSize};
    use crate::highlight::build::build_tree;
    use crate::ocr::{ImageRect, TextBlock, TextElement, TextLine, TextRecognition};

    // Image and view share a size so view rects equal image rects.
    fn tree_with(rects: &[Rect]) -> HighlightTree {
        let elements = rects
            .iter()
            .map(|&rect| TextElement::new("w", Some(ImageRect::from(rect))))
            .collect();
        let recognition = TextRecognition::new(vec![TextBlock::new(
            "",
            None,
            vec![TextLine::new("", None, elements)],
        )]);
        build_tree(
            &recognition,
            ImageSize::new(100.0, 100.0).unwrap(),
            ViewSize::new(100.0, 100.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_containment_bounds_are_inclusive() {
        let tree = tree_with(&[(10.0, 10.0, 50.0, 50.0)]);
        for point in [(10.0, 10.0), (50.0, 50.0), (30.0, 30.0)] {
            assert_eq!(hit_elements(&tree, point).len(), 1, "{point:?}");
        }
        for point in [(9.0, 30.0), (51.0, 30.0)] {
            assert!(hit_elements(&tree, point).is_empty(), "{point:?}");
        }
    }

    #[test]
    fn test_resolve_recolors_all_overlapping() {
        let mut tree = tree_with(&[(0.0, 0.0, 40.0, 40.0), (20.0, 20.0, 60.0, 60.0)]);
        let matched = resolve(&mut tree, (30.0, 30.0), Color::TAP);
        assert_eq!(matched, 2);
        assert!(tree.elements().all(|(_, e)| e.color() == Color::TAP));
    }

    #[test]
    fn test_resolve_miss_changes_nothing() {
        let mut tree = tree_with(&[(0.0, 0.0, 10.0, 10.0)]);
        let before = tree.clone();
        assert_eq!(resolve(&mut tree, (90.0, 90.0), Color::DRAG), 0);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_resolve_only_touches_elements() {
        let mut tree = tree_with(&[(0.0, 0.0, 10.0, 10.0)]);
        resolve(&mut tree, (5.0, 5.0), Color::DRAG);
        assert_eq!(tree.blocks()[0].color(), Color::HIGHLIGHT);
        assert_eq!(tree.blocks()[0].lines()[0].color(), Color::HIGHLIGHT);
    }

    #[test]
    fn test_interaction_colors() {
        let params = ViewerParams::default();
        assert_eq!(Interaction::Tap.color(&params), Color::TAP);
        assert_eq!(Interaction::Drag.color(&params), Color::DRAG);
    }

    #[test]
    fn test_index_matches_linear_walk() {
        let tree = tree_with(&[
            (0.0, 0.0, 40.0, 40.0),
            (20.0, 20.0, 60.0, 60.0),
            (60.0, 60.0, 80.0, 80.0),
            (70.0, 10.0, 50.0, 30.0),
        ]);
        let index = ElementIndex::new(&tree);
        assert_eq!(index.len(), 4);
        for x in (0..=100).step_by(5) {
            for y in (0..=100).step_by(5) {
                let point = (x as f64, y as f64);
                assert_eq!(index.locate(point), hit_elements(&tree, point), "{point:?}");
            }
        }
    }

    #[test]
    fn test_index_keeps_unbounded_rects() {
        // Scale 10 pushes the horizontal bounds past f64::MAX.
        let recognition = TextRecognition::new(vec![TextBlock::new(
            "",
            None,
            vec![TextLine::new(
                "",
                None,
                vec![TextElement::new(
                    "wide",
                    Some(ImageRect::new(-1e308, 0.0, 1e308, 10.0)),
                )],
            )],
        )]);
        let tree = build_tree(
            &recognition,
            ImageSize::new(10.0, 10.0).unwrap(),
            ViewSize::new(100.0, 100.0).unwrap(),
        )
        .unwrap();
        let (left, _, right, _) = tree.element(ElementPath::new(0, 0, 0)).unwrap().rect();
        assert!(left.is_infinite() && right.is_infinite());

        let index = ElementIndex::new(&tree);
        assert_eq!(index.len(), 1);
        for point in [(50.0, 50.0), (-1e300, 0.0), (1e300, 100.0)] {
            assert_eq!(index.locate(point), vec![ElementPath::new(0, 0, 0)], "{point:?}");
            assert_eq!(index.locate(point), hit_elements(&tree, point), "{point:?}");
        }
        assert!(index.locate((50.0, 101.0)).is_empty());
    }

    #[test]
    fn test_recolor_skips_unknown_paths() {
        let mut tree = tree_with(&[(0.0, 0.0, 10.0, 10.0)]);
        let applied = recolor(
            &mut tree,
            &[ElementPath::new(0, 0, 0), ElementPath::new(3, 0, 0)],
            Color::TAP,
        );
        assert_eq!(applied, 1);
    }
}
