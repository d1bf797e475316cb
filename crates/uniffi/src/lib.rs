use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use textlens_core::utils::{HasRect, Rect};
use textlens_core::{
    Color, HighlightError, HighlightSession, HighlightTree, ImageRect, ImageSize, Pan, TextBlock,
    TextElement, TextLine, TextRecognition, ViewSize, ViewTransform, ViewerParams,
    build_tree_with,
};

#[derive(Debug, thiserror::Error)]
pub enum TextlensError {
    #[error("invalid image size")]
    InvalidImageSize,
    #[error("invalid view size")]
    InvalidViewSize,
    #[error("invalid zoom")]
    InvalidZoom,
    #[error("invalid pan")]
    InvalidPan,
    #[error("invalid point")]
    InvalidPoint,
    #[error("invalid viewer options")]
    InvalidParams,
    #[error("no highlight tree")]
    NoTree,
    #[error("runtime error")]
    RuntimeError,
}

#[cfg(test)]
static OFFLOAD_CALLS: AtomicUsize = AtomicUsize::new(0);

#[cfg(test)]
static OFFLOAD_THREADS: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
#[cfg(test)]
static OFFLOAD_TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

#[cfg(test)]
fn mark_offload_call() {
    OFFLOAD_CALLS.fetch_add(1, Ordering::SeqCst);
    let ids = OFFLOAD_THREADS.get_or_init(|| Mutex::new(Vec::new()));
    if let Ok(mut guard) = ids.lock() {
        guard.push(format!("{:?}", std::thread::current().id()));
    }
}

#[cfg(not(test))]
fn mark_offload_call() {}

#[cfg(test)]
fn reset_offload_calls() {
    OFFLOAD_CALLS.store(0, Ordering::SeqCst);
    let ids = OFFLOAD_THREADS.get_or_init(|| Mutex::new(Vec::new()));
    if let Ok(mut guard) = ids.lock() {
        guard.clear();
    }
}

#[cfg(test)]
fn offload_call_count() -> usize {
    OFFLOAD_CALLS.load(Ordering::SeqCst)
}

#[cfg(test)]
fn offload_thread_ids() -> Vec<String> {
    let ids = OFFLOAD_THREADS.get_or_init(|| Mutex::new(Vec::new()));
    if let Ok(guard) = ids.lock() {
        return guard.clone();
    }
    Vec::new()
}

#[cfg(test)]
fn offload_test_guard() -> MutexGuard<'static, ()> {
    OFFLOAD_TEST_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl From<HighlightError> for TextlensError {
    fn from(value: HighlightError) -> Self {
        match value {
            HighlightError::InvalidImageSize { .. } => Self::InvalidImageSize,
            HighlightError::InvalidViewSize { .. } => Self::InvalidViewSize,
            HighlightError::InvalidZoom(_) => Self::InvalidZoom,
            HighlightError::InvalidPan { .. } => Self::InvalidPan,
            HighlightError::InvalidPoint { .. } => Self::InvalidPoint,
            HighlightError::InvalidParams(_) => Self::InvalidParams,
            HighlightError::NoTree => Self::NoTree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbaColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub highlight_color: RgbaColor,
    pub tap_color: RgbaColor,
    pub drag_color: RgbaColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransformRecord {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrElement {
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
    pub confidence: Option<f32>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
    pub confidence: Option<f32>,
    pub language: Option<String>,
    pub elements: Vec<OcrElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrBlock {
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
    pub language: Option<String>,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub blocks: Vec<OcrBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightElementRecord {
    pub text: String,
    pub rect: BoundingBox,
    pub color: RgbaColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightLineRecord {
    pub rect: BoundingBox,
    pub color: RgbaColor,
    pub elements: Vec<HighlightElementRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightBlockRecord {
    pub rect: BoundingBox,
    pub color: RgbaColor,
    pub lines: Vec<HighlightLineRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightTreeRecord {
    pub blocks: Vec<HighlightBlockRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub revision: u64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub transform: Option<ViewTransformRecord>,
    pub tree: Option<HighlightTreeRecord>,
}

/// Host-side callback invoked after a viewer call changed the state.
///
/// Called once per call with the latest revision, after the viewer has been
/// unlocked, so the listener may read `state()` directly.
pub trait RevisionListener: Send + Sync {
    fn on_revision(&self, revision: u64);
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn RevisionListener>)>,
}

fn usize_to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn bbox_from_rect(rect: Rect) -> BoundingBox {
    BoundingBox {
        left: rect.0,
        top: rect.1,
        right: rect.2,
        bottom: rect.3,
    }
}

fn image_rect_from_bbox(bbox: BoundingBox) -> ImageRect {
    ImageRect::new(bbox.left, bbox.top, bbox.right, bbox.bottom)
}

impl From<Color> for RgbaColor {
    fn from(color: Color) -> Self {
        Self {
            red: color.r,
            green: color.g,
            blue: color.b,
            alpha: color.a,
        }
    }
}

impl From<RgbaColor> for Color {
    fn from(color: RgbaColor) -> Self {
        Color::rgba(color.red, color.green, color.blue, color.alpha)
    }
}

impl From<ViewerParams> for ViewerOptions {
    fn from(params: ViewerParams) -> Self {
        Self {
            min_zoom: params.min_zoom,
            max_zoom: params.max_zoom,
            highlight_color: params.highlight_color.into(),
            tap_color: params.tap_color.into(),
            drag_color: params.drag_color.into(),
        }
    }
}

impl From<ViewerOptions> for ViewerParams {
    fn from(options: ViewerOptions) -> Self {
        Self {
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
            highlight_color: options.highlight_color.into(),
            tap_color: options.tap_color.into(),
            drag_color: options.drag_color.into(),
        }
    }
}

impl From<ViewTransform> for ViewTransformRecord {
    fn from(t: ViewTransform) -> Self {
        Self {
            scale: t.scale,
            offset_x: t.offset_x,
            offset_y: t.offset_y,
        }
    }
}

fn recognition_from_ocr(result: OcrResult) -> TextRecognition {
    let blocks = result
        .blocks
        .into_iter()
        .map(|block| TextBlock {
            text: block.text,
            bounding_box: block.bounding_box.map(image_rect_from_bbox),
            language: block.language,
            lines: block
                .lines
                .into_iter()
                .map(|line| {
                    Arc::new(TextLine {
                        text: line.text,
                        bounding_box: line.bounding_box.map(image_rect_from_bbox),
                        confidence: line.confidence,
                        language: line.language,
                        elements: line
                            .elements
                            .into_iter()
                            .map(|element| {
                                Arc::new(TextElement {
                                    text: element.text,
                                    bounding_box: element.bounding_box.map(image_rect_from_bbox),
                                    confidence: element.confidence,
                                    language: element.language,
                                })
                            })
                            .collect(),
                    })
                })
                .collect(),
        })
        .map(Arc::new)
        .collect();
    TextRecognition {
        text: result.text,
        blocks,
    }
}

fn tree_record(tree: &HighlightTree) -> HighlightTreeRecord {
    let blocks = tree
        .blocks()
        .iter()
        .map(|block| HighlightBlockRecord {
            rect: bbox_from_rect(block.rect()),
            color: block.color().into(),
            lines: block
                .lines()
                .iter()
                .map(|line| HighlightLineRecord {
                    rect: bbox_from_rect(line.rect()),
                    color: line.color().into(),
                    elements: line
                        .elements()
                        .iter()
                        .map(|element| HighlightElementRecord {
                            text: element.source().text.clone(),
                            rect: bbox_from_rect(element.rect()),
                            color: element.color().into(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    HighlightTreeRecord { blocks }
}

fn get_or_try_init_no_error_cache<T, E>(
    cell: &OnceLock<T>,
    init: impl FnOnce() -> Result<T, E>,
) -> Result<&T, E> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }

    let value = init()?;
    Ok(cell.get_or_init(|| value))
}

static ASYNC_RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn build_async_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn get_async_runtime() -> Result<&'static tokio::runtime::Runtime, TextlensError> {
    get_or_try_init_no_error_cache(&ASYNC_RUNTIME, build_async_runtime)
        .map_err(|_| TextlensError::RuntimeError)
}

async fn offload_blocking<T, F>(job: F) -> Result<T, TextlensError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TextlensError> + Send + 'static,
{
    let runtime = get_async_runtime()?;
    let join = runtime.spawn_blocking(move || {
        mark_offload_call();
        job()
    });
    join.await.map_err(|_| TextlensError::RuntimeError)?
}

pub fn default_viewer_options() -> ViewerOptions {
    ViewerParams::default().into()
}

pub fn fit_transform(
    image_width: f64,
    image_height: f64,
    view_width: f64,
    view_height: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Result<ViewTransformRecord, TextlensError> {
    let transform = ViewTransform::new(
        ImageSize::new(image_width, image_height)?,
        ViewSize::new(view_width, view_height)?,
        zoom,
        Pan::new(pan_x, pan_y)?,
    )?;
    Ok(transform.into())
}

pub fn build_highlight_tree(
    recognition: OcrResult,
    image_width: f64,
    image_height: f64,
    view_width: f64,
    view_height: f64,
) -> Result<HighlightTreeRecord, TextlensError> {
    let image = ImageSize::new(image_width, image_height)?;
    let view = ViewSize::new(view_width, view_height)?;
    let recognition = recognition_from_ocr(recognition);
    let tree = build_tree_with(&recognition, image, view, &ViewerParams::default())?;
    Ok(tree_record(&tree))
}

pub async fn build_highlight_tree_async(
    recognition: OcrResult,
    image_width: f64,
    image_height: f64,
    view_width: f64,
    view_height: f64,
) -> Result<HighlightTreeRecord, TextlensError> {
    offload_blocking(move || {
        build_highlight_tree(
            recognition,
            image_width,
            image_height,
            view_width,
            view_height,
        )
    })
    .await
}

/// A highlight session shared with the host UI.
///
/// Every call locks the same session, so builds, gesture updates and
/// taps from different host threads are applied one at a time.
pub struct HighlightViewer {
    session: Mutex<HighlightSession>,
    listeners: Mutex<Listeners>,
}

impl HighlightViewer {
    pub fn new(options: Option<ViewerOptions>) -> Result<Self, TextlensError> {
        let params = options.map(ViewerParams::from).unwrap_or_default();
        Ok(Self {
            session: Mutex::new(HighlightSession::new(params)?),
            listeners: Mutex::new(Listeners::default()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, HighlightSession>, TextlensError> {
        self.session.lock().map_err(|_| TextlensError::RuntimeError)
    }

    fn lock_listeners(&self) -> Result<MutexGuard<'_, Listeners>, TextlensError> {
        self.listeners.lock().map_err(|_| TextlensError::RuntimeError)
    }

    /// Runs `op` on the locked session, then notifies listeners with the
    /// session unlocked if the revision moved.
    fn update<T>(
        &self,
        op: impl FnOnce(&mut HighlightSession) -> Result<T, HighlightError>,
    ) -> Result<T, TextlensError> {
        let (result, changed) = {
            let mut session = self.lock()?;
            let before = session.revision();
            let result = op(&mut *session);
            let after = session.revision();
            (result, (after != before).then_some(after))
        };
        if let Some(revision) = changed {
            self.notify(revision)?;
        }
        Ok(result?)
    }

    fn notify(&self, revision: u64) -> Result<(), TextlensError> {
        let listeners: Vec<Arc<dyn RevisionListener>> = self
            .lock_listeners()?
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener.on_revision(revision);
        }
        Ok(())
    }

    pub fn load_image(
        &self,
        recognition: OcrResult,
        width: f64,
        height: f64,
    ) -> Result<u64, TextlensError> {
        let size = ImageSize::new(width, height)?;
        let recognition = Arc::new(recognition_from_ocr(recognition));
        self.update(|session| Ok(session.load_image(recognition, size)))
    }

    pub fn set_view_size(&self, width: f64, height: f64) -> Result<(), TextlensError> {
        self.update(|session| session.set_view_size(width, height))
    }

    pub fn ensure_tree(&self) -> Result<bool, TextlensError> {
        self.update(HighlightSession::ensure_tree)
    }

    /// Builds the tree on the blocking pool and installs it when done.
    ///
    /// Returns false when no build was needed or when a newer image was
    /// loaded before the build finished.
    pub async fn build_tree_async(self: Arc<Self>) -> Result<bool, TextlensError> {
        let job = {
            let session = self.lock()?;
            session.begin_build()
        };
        let Some(job) = job else {
            return Ok(false);
        };
        let built = offload_blocking(move || job.run().map_err(TextlensError::from)).await?;
        self.update(|session| Ok(session.install_tree(built)))
    }

    pub fn apply_gesture(
        &self,
        zoom_change: f64,
        pan_dx: f64,
        pan_dy: f64,
    ) -> Result<bool, TextlensError> {
        self.update(|session| session.apply_gesture(zoom_change, pan_dx, pan_dy))
    }

    pub fn tap(&self, x: f64, y: f64) -> Result<u32, TextlensError> {
        self.update(|session| session.tap((x, y))).map(usize_to_u32)
    }

    pub fn drag(&self, x: f64, y: f64) -> Result<u32, TextlensError> {
        self.update(|session| session.drag((x, y))).map(usize_to_u32)
    }

    pub fn reset_colors(&self) -> Result<(), TextlensError> {
        self.update(HighlightSession::reset_colors)
    }

    pub fn state(&self) -> Result<ViewerState, TextlensError> {
        let session = self.lock()?;
        let pan = session.pan();
        Ok(ViewerState {
            revision: session.revision(),
            zoom: session.zoom(),
            pan_x: pan.dx,
            pan_y: pan.dy,
            transform: session.transform().map(ViewTransformRecord::from),
            tree: session.tree().map(tree_record),
        })
    }

    /// Registers a listener and returns the id to unsubscribe it with.
    pub fn subscribe(&self, listener: Box<dyn RevisionListener>) -> Result<u64, TextlensError> {
        let mut listeners = self.lock_listeners()?;
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, Arc::from(listener)));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: u64) -> Result<bool, TextlensError> {
        let mut listeners = self.lock_listeners()?;
        let before = listeners.entries.len();
        listeners.entries.retain(|(other, _)| *other != id);
        Ok(listeners.entries.len() != before)
    }
}

uniffi::include_scaffolding!("textlens");
