//! Per-document viewer state and render orchestration.
//!
//! A [`ViewerController`] owns everything about one open document: the
//! current page and zoom, the latest rendered page, an in-progress pointer
//! gesture, highlights, and a cache of decoded display lists. Rendering runs
//! on tokio's blocking pool. Each new request cancels the one before it, and
//! a result is only installed if it belongs to the latest request.

use std::collections::BTreeSet;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde::Serialize;

use crate::cancel::{CancelToken, CancellationFlag, Outcome};
use crate::error::{Error, Result};
use crate::model::{DisplayList, Document, Point, Rect, TextRange};
use crate::render::{RenderEngine, RenderedPage};
use crate::select::{self, Selection};

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Zoom change per `zoom_in`/`zoom_out`, in percent
    pub zoom_step: u32,
    /// Zoom level of a freshly opened document, in percent
    pub initial_zoom: u32,
    /// Number of decoded display lists kept; 0 disables the cache
    pub cache_capacity: usize,
}

impl ViewerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom_step(mut self, step: u32) -> Self {
        self.zoom_step = step.max(1);
        self
    }

    pub fn with_initial_zoom(mut self, percent: u32) -> Self {
        self.initial_zoom = percent;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            zoom_step: 10,
            initial_zoom: 100,
            cache_capacity: 8,
        }
    }
}

/// What to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: usize,
    pub scale: f32,
    pub viewport_offset: Point,
}

impl RenderRequest {
    pub fn new(page_index: usize, scale: f32) -> Self {
        Self {
            page_index,
            scale,
            viewport_offset: Point::default(),
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.viewport_offset = offset;
        self
    }
}

/// Identifier of a highlight within one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HighlightId(u64);

/// An in-memory annotation over a text range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub id: HighlightId,
    pub range: TextRange,
    pub text: String,
    pub note: Option<String>,
}

/// Cheaply cloneable handle to one document's viewer.
#[derive(Clone)]
pub struct ViewerController {
    inner: Arc<Inner>,
}

struct Inner {
    document: Arc<Document>,
    engine: RenderEngine,
    options: ViewerOptions,
    state: Mutex<ViewerState>,
}

struct ViewerState {
    page_index: usize,
    zoom_percent: u32,
    offset: Point,
    generation: u64,
    in_flight: Option<CancellationFlag>,
    current: Option<Arc<RenderedPage>>,
    pending_gesture: Option<Point>,
    failed_pages: BTreeSet<usize>,
    highlights: Vec<Highlight>,
    next_highlight: u64,
    cache: Option<LruCache<usize, Arc<DisplayList>>>,
}

impl ViewerState {
    /// Drop everything tied to the current view and cancel in-flight work.
    fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.current = None;
        self.pending_gesture = None;
    }
}

/// Work handed to the blocking pool.
struct Submission {
    generation: u64,
    token: CancellationFlag,
    request: RenderRequest,
    cached: Option<Arc<DisplayList>>,
}

impl ViewerController {
    /// Open a viewer on `document`.
    pub fn new(document: Arc<Document>, engine: RenderEngine, options: ViewerOptions) -> Self {
        let bounds = engine.scale_bounds();
        let initial_zoom = clamp_percent(options.initial_zoom, percent_bounds(bounds.min, bounds.max));
        let cache = NonZeroUsize::new(options.cache_capacity).map(LruCache::new);

        let state = ViewerState {
            page_index: 0,
            zoom_percent: initial_zoom,
            offset: Point::default(),
            generation: 0,
            in_flight: None,
            current: None,
            pending_gesture: None,
            failed_pages: BTreeSet::new(),
            highlights: Vec::new(),
            next_highlight: 1,
            cache,
        };
        Self {
            inner: Arc::new(Inner {
                document,
                engine,
                options,
                state: Mutex::new(state),
            }),
        }
    }

    /// Open a viewer with the default engine and options.
    pub fn open(document: Arc<Document>) -> Self {
        Self::new(document, RenderEngine::default(), ViewerOptions::default())
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.inner.document
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.inner.engine
    }

    fn state(&self) -> MutexGuard<'_, ViewerState> {
        self.inner.lock_state()
    }

    // Navigation

    pub fn current_page(&self) -> usize {
        self.state().page_index
    }

    pub fn page_count(&self) -> usize {
        self.inner.document.page_count()
    }

    /// Move to `page_index`, failing with `PageIndexOutOfRange` when invalid.
    pub fn go_to_page(&self, page_index: usize) -> Result<()> {
        self.inner.document.try_page(page_index)?;
        self.move_to_page(page_index);
        Ok(())
    }

    /// Advance one page, staying on the last page.
    pub fn next_page(&self) -> usize {
        let last = self.page_count().saturating_sub(1);
        let target = (self.current_page() + 1).min(last);
        self.move_to_page(target);
        target
    }

    /// Go back one page, staying on the first page.
    pub fn previous_page(&self) -> usize {
        let target = self.current_page().saturating_sub(1);
        self.move_to_page(target);
        target
    }

    /// `page_index` must already be valid.
    fn move_to_page(&self, page_index: usize) {
        let mut state = self.state();
        if state.page_index != page_index {
            state.page_index = page_index;
            state.invalidate();
        }
    }

    // Zoom and viewport

    pub fn zoom_percent(&self) -> u32 {
        self.state().zoom_percent
    }

    /// Current scale, 100% being 1.0.
    pub fn scale(&self) -> f32 {
        self.zoom_percent() as f32 / 100.0
    }

    pub fn zoom_in(&self) -> u32 {
        let step = self.inner.options.zoom_step;
        self.set_zoom(self.zoom_percent().saturating_add(step))
    }

    pub fn zoom_out(&self) -> u32 {
        let step = self.inner.options.zoom_step;
        self.set_zoom(self.zoom_percent().saturating_sub(step))
    }

    /// Set the zoom level, clamped to the engine's scale bounds.
    pub fn set_zoom(&self, percent: u32) -> u32 {
        let clamped = clamp_percent(percent, self.zoom_bounds());
        let mut state = self.state();
        if state.zoom_percent != clamped {
            state.zoom_percent = clamped;
            state.invalidate();
        }
        clamped
    }

    /// Smallest and largest zoom, in percent.
    pub fn zoom_bounds(&self) -> (u32, u32) {
        let bounds = self.inner.engine.scale_bounds();
        percent_bounds(bounds.min, bounds.max)
    }

    pub fn viewport_offset(&self) -> Point {
        self.state().offset
    }

    pub fn set_viewport_offset(&self, offset: Point) {
        let mut state = self.state();
        if state.offset != offset {
            state.offset = offset;
            state.invalidate();
        }
    }

    // Rendering

    /// Latest installed render, if any.
    pub fn current_render(&self) -> Option<Arc<RenderedPage>> {
        self.state().current.clone()
    }

    /// Pages whose last render failed.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.state().failed_pages.iter().copied().collect()
    }

    /// Whether a decoded display list for `page_index` is cached.
    pub fn is_display_list_cached(&self, page_index: usize) -> bool {
        self.state()
            .cache
            .as_ref()
            .is_some_and(|cache| cache.contains(&page_index))
    }

    /// Render the current page at the current zoom and offset.
    pub fn render_current(
        &self,
    ) -> impl Future<Output = Result<Outcome<Arc<RenderedPage>>>> + Send + 'static {
        let request = {
            let state = self.state();
            RenderRequest::new(state.page_index, state.zoom_percent as f32 / 100.0)
                .with_offset(state.offset)
        };
        self.request_render(request)
    }

    /// Submit a render request.
    ///
    /// Submission happens before this returns: the page is validated, the
    /// previous request is cancelled, and the request becomes the latest one.
    /// The returned future performs the work on the blocking pool and resolves
    /// to `Outcome::Cancelled` if a newer request or a view change superseded
    /// it in the meantime.
    pub fn request_render(
        &self,
        request: RenderRequest,
    ) -> impl Future<Output = Result<Outcome<Arc<RenderedPage>>>> + Send + 'static {
        let submission = self.submit(request);
        let inner = self.inner.clone();

        async move {
            let submission = submission?;
            let worker = inner.clone();
            let token = submission.token.clone();
            let request = submission.request;
            let cached = submission.cached.clone();

            let joined = tokio::task::spawn_blocking(move || worker.render_blocking(request, &token, cached))
                .await
                .map_err(|e| Error::RenderFailure(format!("render task failed: {}", e)))?;

            inner.install(&submission, joined)
        }
    }

    fn submit(&self, request: RenderRequest) -> Result<Submission> {
        self.inner.document.try_page(request.page_index)?;

        let zoom_percent = scale_to_percent(self.inner.engine.scale_bounds().clamp(request.scale));

        let mut state = self.state();
        // A different view makes the installed render and any gesture made on it stale
        if state.page_index != request.page_index
            || state.zoom_percent != zoom_percent
            || state.offset != request.viewport_offset
        {
            state.page_index = request.page_index;
            state.zoom_percent = zoom_percent;
            state.offset = request.viewport_offset;
            state.current = None;
            state.pending_gesture = None;
        }
        state.generation += 1;
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }

        let token = CancellationFlag::new();
        state.in_flight = Some(token.clone());
        let cached = state
            .cache
            .as_mut()
            .and_then(|cache| cache.get(&request.page_index).cloned());

        log::debug!(
            "Render request #{} for page {} at scale {}",
            state.generation,
            request.page_index + 1,
            request.scale
        );
        Ok(Submission {
            generation: state.generation,
            token,
            request,
            cached,
        })
    }

    // Selection

    pub fn pointer_down(&self, point: Point) {
        self.state().pending_gesture = Some(point);
    }

    /// Finish a gesture started with [`pointer_down`](Self::pointer_down).
    ///
    /// Resolves against the most recently installed render; returns `None`
    /// without a pending gesture or a rendered page.
    pub fn pointer_up(&self, point: Point) -> Option<Selection> {
        let (start, rendered) = {
            let mut state = self.state();
            let start = state.pending_gesture.take()?;
            (start, state.current.clone()?)
        };
        select::resolve_selection(&rendered, start, point)
    }

    /// Resolve a selection between two device points on the current render.
    pub fn select(&self, start: Point, end: Point) -> Option<Selection> {
        let rendered = self.current_render()?;
        select::resolve_selection(&rendered, start, end)
    }

    // Highlights

    pub fn add_highlight(&self, selection: Selection, note: Option<String>) -> HighlightId {
        let mut state = self.state();
        let id = HighlightId(state.next_highlight);
        state.next_highlight += 1;
        state.highlights.push(Highlight {
            id,
            range: selection.range,
            text: selection.text,
            note,
        });
        id
    }

    /// Remove a highlight. Returns whether it existed.
    pub fn remove_highlight(&self, id: HighlightId) -> bool {
        let mut state = self.state();
        let before = state.highlights.len();
        state.highlights.retain(|h| h.id != id);
        state.highlights.len() != before
    }

    pub fn highlights_on_page(&self, page_index: usize) -> Vec<Highlight> {
        self.state()
            .highlights
            .iter()
            .filter(|h| h.range.page_index == page_index)
            .cloned()
            .collect()
    }

    /// Device rectangles of every highlight on the current render.
    pub fn highlight_rects(&self) -> Vec<(HighlightId, Vec<Rect>)> {
        let Some(rendered) = self.current_render() else {
            return Vec::new();
        };
        self.highlights_on_page(rendered.page_index)
            .into_iter()
            .map(|h| (h.id, select::highlight_rects(&rendered, &h.range)))
            .collect()
    }
}

type BlockingResult = Result<(Outcome<RenderedPage>, Option<Arc<DisplayList>>)>;

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs on the blocking pool. Returns the outcome and a freshly decoded
    /// display list, if one was decoded.
    fn render_blocking(
        &self,
        request: RenderRequest,
        token: &CancellationFlag,
        cached: Option<Arc<DisplayList>>,
    ) -> BlockingResult {
        if token.is_cancelled() {
            return Ok((Outcome::Cancelled, None));
        }

        let doc = self.document.as_ref();
        let (list, fresh) = match cached {
            Some(list) => (Some(list), None),
            None => {
                let resolved = self
                    .engine
                    .resolve_display_list(doc, request.page_index)?
                    .map(Arc::new);
                (resolved.clone(), resolved)
            }
        };

        let outcome = self.engine.render_cancellable(
            doc,
            request.page_index,
            request.scale,
            request.viewport_offset,
            token,
            list.as_deref(),
        )?;
        Ok((outcome, fresh))
    }

    fn install(
        &self,
        submission: &Submission,
        result: BlockingResult,
    ) -> Result<Outcome<Arc<RenderedPage>>> {
        let page_index = submission.request.page_index;
        let mut state = self.lock_state();

        let superseded =
            submission.token.is_cancelled() || state.generation != submission.generation;

        let (outcome, fresh) = match result {
            Ok(ok) => ok,
            Err(e) if superseded => {
                log::debug!("Dropping failure of superseded render of page {}: {}", page_index + 1, e);
                return Ok(Outcome::Cancelled);
            }
            Err(e) => {
                if matches!(e, Error::RenderFailure(_)) {
                    log::warn!("Render of page {} failed: {}", page_index + 1, e);
                    state.failed_pages.insert(page_index);
                }
                state.in_flight = None;
                return Err(e);
            }
        };

        let rendered = match outcome {
            Outcome::Completed(rendered) if !submission.token.is_cancelled() => rendered,
            _ => return Ok(Outcome::Cancelled),
        };

        if let (Some(cache), Some(list)) = (state.cache.as_mut(), fresh) {
            cache.put(page_index, list);
        }
        state.failed_pages.remove(&page_index);

        if state.generation != submission.generation {
            return Ok(Outcome::Cancelled);
        }
        let rendered = Arc::new(rendered);
        state.current = Some(rendered.clone());
        state.in_flight = None;
        Ok(Outcome::Completed(rendered))
    }
}

fn percent_bounds(min_scale: f32, max_scale: f32) -> (u32, u32) {
    let min = (min_scale * 100.0).round().max(1.0) as u32;
    let max = (max_scale * 100.0).round().max(min as f32) as u32;
    (min, max)
}

fn scale_to_percent(scale: f32) -> u32 {
    (scale * 100.0).round().max(1.0) as u32
}

fn clamp_percent(percent: u32, (min, max): (u32, u32)) -> u32 {
    percent.clamp(min, max)
}
