//! Highlight session: the single owner of one image's highlight state.
//!
//! A session holds the recognition result, the measured view, the user's
//! zoom and pan, the highlight tree and a revision counter. Every mutation
//! goes through `&mut self`, so sharing a session across threads means
//! wrapping it in one lock and all builds, updates and hit tests are
//! serialized by construction.
//!
//! Tree construction can be moved off the interaction thread:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use textlens_core::geometry::ImageSize;
//! # use textlens_core::ocr::TextRecognition;
//! # use textlens_core::session::HighlightSession;
//! # fn main() -> textlens_core::Result<()> {
//! let mut session = HighlightSession::default();
//! session.load_image(Arc::new(TextRecognition::default()), ImageSize::new(640.0, 480.0)?);
//! session.set_view_size(360.0, 640.0)?;
//! if let Some(job) = session.begin_build() {
//!     let built = std::thread::spawn(move || job.run()).join().unwrap()?;
//!     session.install_tree(built);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{HighlightError, Result};
use crate::geometry::{ImageSize, Pan, ViewSize, ViewTransform};
use crate::highlight::build::build_with_transform;
use crate::highlight::color::Color;
use crate::highlight::hit::{ElementIndex, Interaction, recolor};
use crate::highlight::tree::HighlightTree;
use crate::highlight::update::apply_transform;
use crate::ocr::TextRecognition;
use crate::params::ViewerParams;
use crate::utils::Point;

/// Receives the new revision after every change visible to the renderer.
pub trait RevisionObserver: Send + Sync {
    fn on_revision(&self, revision: u64);
}

/// Handle returned by [`HighlightSession::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriptionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Inputs for building a tree away from the session.
#[derive(Debug, Clone)]
pub struct BuildJob {
    generation: u64,
    recognition: Arc<TextRecognition>,
    image: ImageSize,
    view: ViewSize,
    color: Color,
}

impl BuildJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Builds the initial-fit tree. Safe to call on any thread.
    pub fn run(self) -> Result<BuiltTree> {
        let transform = ViewTransform::fit(self.image, self.view)?;
        let tree = build_with_transform(&self.recognition, transform, self.color);
        Ok(BuiltTree {
            generation: self.generation,
            tree,
            transform,
        })
    }
}

/// A finished tree waiting to be installed into its session.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    generation: u64,
    tree: HighlightTree,
    transform: ViewTransform,
}

impl BuiltTree {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &HighlightTree {
        &self.tree
    }
}

struct LoadedImage {
    recognition: Arc<TextRecognition>,
    size: ImageSize,
}

pub struct HighlightSession {
    params: ViewerParams,
    generation: u64,
    image: Option<LoadedImage>,
    view: Option<ViewSize>,
    zoom: f64,
    pan: Pan,
    applied: Option<ViewTransform>,
    tree: Option<HighlightTree>,
    index: Option<ElementIndex>,
    revision: u64,
    observers: Vec<(SubscriptionId, Arc<dyn RevisionObserver>)>,
    next_subscription: u64,
}

impl Default for HighlightSession {
    fn default() -> Self {
        Self::from_valid_params(ViewerParams::default())
    }
}

impl fmt::Debug for HighlightSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightSession")
            .field("generation", &self.generation)
            .field("view", &self.view)
            .field("zoom", &self.zoom)
            .field("pan", &self.pan)
            .field("has_tree", &self.tree.is_some())
            .field("revision", &self.revision)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl HighlightSession {
    pub fn new(params: ViewerParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_valid_params(params))
    }

    fn from_valid_params(params: ViewerParams) -> Self {
        Self {
            params,
            generation: 0,
            image: None,
            view: None,
            zoom: 1.0,
            pan: Pan::ZERO,
            applied: None,
            tree: None,
            index: None,
            revision: 0,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn params(&self) -> &ViewerParams {
        &self.params
    }

    /// Bumped on every `load_image`; tags background builds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped after every change the renderer should pick up.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tree(&self) -> Option<&HighlightTree> {
        self.tree.as_ref()
    }

    pub fn view_size(&self) -> Option<ViewSize> {
        self.view
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.image.as_ref().map(|image| image.size)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Pan {
        self.pan
    }

    /// Transform the current tree rectangles were computed with.
    pub fn transform(&self) -> Option<ViewTransform> {
        self.applied
    }

    /// Registers an observer. Observers survive `load_image`; drop them
    /// with [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&mut self, observer: Arc<dyn RevisionObserver>) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    /// Starts a new image: drops the old tree and resets zoom and pan.
    pub fn load_image(&mut self, recognition: Arc<TextRecognition>, size: ImageSize) -> u64 {
        self.generation += 1;
        debug!(
            generation = self.generation,
            width = size.width(),
            height = size.height(),
            elements = recognition.element_count(),
            "loaded image"
        );
        self.image = Some(LoadedImage { recognition, size });
        self.tree = None;
        self.index = None;
        self.applied = None;
        self.zoom = 1.0;
        self.pan = Pan::ZERO;
        self.bump();
        self.generation
    }

    /// Records a layout measurement. Zero on either side means "not measured".
    ///
    /// An existing tree is re-projected into the new view so its rectangles
    /// stay in current view space.
    pub fn set_view_size(&mut self, width: f64, height: f64) -> Result<()> {
        let view = ViewSize::measured(width, height)?;
        if view == self.view {
            return Ok(());
        }
        self.view = view;
        if self.tree.is_some() && self.view.is_some() {
            self.reproject()?;
        }
        Ok(())
    }

    /// True when an image is loaded, the view is measured and no tree exists.
    pub fn needs_build(&self) -> bool {
        self.tree.is_none() && self.image.is_some() && self.view.is_some()
    }

    /// Captures everything needed to build the tree elsewhere.
    pub fn begin_build(&self) -> Option<BuildJob> {
        if !self.needs_build() {
            return None;
        }
        let image = self.image.as_ref()?;
        Some(BuildJob {
            generation: self.generation,
            recognition: Arc::clone(&image.recognition),
            image: image.size,
            view: self.view?,
            color: self.params.highlight_color,
        })
    }

    /// Installs a finished tree in one step.
    ///
    /// Returns false and drops the tree when it belongs to an older image
    /// or a tree is already installed. If the view or zoom changed while
    /// the tree was being built it is re-projected before installation.
    pub fn install_tree(&mut self, built: BuiltTree) -> bool {
        if built.generation != self.generation || self.image.is_none() {
            warn!(
                built = built.generation,
                current = self.generation,
                "discarding highlight tree built for a previous image"
            );
            return false;
        }
        if self.tree.is_some() {
            debug!(generation = built.generation, "highlight tree already installed");
            return false;
        }

        let BuiltTree {
            mut tree,
            transform,
            ..
        } = built;
        let current = self.current_transform().ok().flatten().unwrap_or(transform);
        if current != transform {
            apply_transform(&mut tree, current);
        }
        self.tree = Some(tree);
        self.applied = Some(current);
        self.index = None;
        self.bump();
        true
    }

    /// Builds and installs the tree on the calling thread if one is needed.
    pub fn ensure_tree(&mut self) -> Result<bool> {
        match self.begin_build() {
            Some(job) => {
                let built = job.run()?;
                Ok(self.install_tree(built))
            }
            None => Ok(false),
        }
    }

    /// Applies one pinch/pan step from the gesture layer.
    ///
    /// The zoom is multiplied by `zoom_change` and clamped to the configured
    /// limits. Only when the clamped zoom actually changes is the pan delta
    /// accumulated and the tree re-projected; otherwise the step is ignored.
    pub fn apply_gesture(&mut self, zoom_change: f64, pan_dx: f64, pan_dy: f64) -> Result<bool> {
        if !zoom_change.is_finite() || zoom_change <= 0.0 {
            return Err(HighlightError::InvalidZoom(zoom_change));
        }
        let delta = Pan::new(pan_dx, pan_dy)?;
        let zoom = self.params.clamp_zoom(self.zoom * zoom_change);
        if zoom == self.zoom {
            return Ok(false);
        }
        let pan = Pan::new(self.pan.dx + delta.dx, self.pan.dy + delta.dy)?;
        self.set_zoom_pan(zoom, pan)
    }

    /// Sets absolute zoom (clamped) and pan.
    ///
    /// Re-projects the tree only when the resulting transform differs from
    /// the one its rectangles were computed with.
    pub fn set_zoom_pan(&mut self, zoom: f64, pan: Pan) -> Result<bool> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(HighlightError::InvalidZoom(zoom));
        }
        let pan = Pan::new(pan.dx, pan.dy)?;
        self.zoom = self.params.clamp_zoom(zoom);
        self.pan = pan;
        if self.tree.is_none() {
            return Ok(false);
        }
        self.reproject()
    }

    pub fn tap(&mut self, point: Point) -> Result<usize> {
        self.interact(Interaction::Tap, point)
    }

    pub fn drag(&mut self, point: Point) -> Result<usize> {
        self.interact(Interaction::Drag, point)
    }

    /// Recolors every element under `point` with the interaction's color.
    ///
    /// The revision is bumped even when nothing matched.
    pub fn interact(&mut self, interaction: Interaction, point: Point) -> Result<usize> {
        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(HighlightError::InvalidPoint {
                x: point.0,
                y: point.1,
            });
        }
        let color = interaction.color(&self.params);
        let tree = self.tree.as_mut().ok_or(HighlightError::NoTree)?;
        let index = self.index.get_or_insert_with(|| ElementIndex::new(tree));
        let paths = index.locate(point);
        let matched = recolor(tree, &paths, color);
        debug!(?interaction, x = point.0, y = point.1, matched, "pointer interaction");
        self.bump();
        Ok(matched)
    }

    /// Restores the build-time highlight color on every element.
    pub fn reset_colors(&mut self) -> Result<()> {
        let tree = self.tree.as_mut().ok_or(HighlightError::NoTree)?;
        tree.fill_elements(self.params.highlight_color);
        self.bump();
        Ok(())
    }

    fn current_transform(&self) -> Result<Option<ViewTransform>> {
        let (Some(image), Some(view)) = (self.image.as_ref(), self.view) else {
            return Ok(None);
        };
        ViewTransform::new(image.size, view, self.zoom, self.pan).map(Some)
    }

    fn reproject(&mut self) -> Result<bool> {
        let Some(transform) = self.current_transform()? else {
            return Ok(false);
        };
        if self.applied == Some(transform) {
            return Ok(false);
        }
        let Some(tree) = self.tree.as_mut() else {
            return Ok(false);
        };
        apply_transform(tree, transform);
        self.applied = Some(transform);
        self.index = None;
        self.bump();
        Ok(true)
    }

    fn bump(&mut self) {
        self.revision += 1;
        for (_, observer) in &self.observers {
            observer.on_revision(self.revision);
        }
    }
}
