//! Page rendering: rasterized visuals plus a selectable text overlay.
//!
//! Paginated pages are rasterized from their display list and every text run
//! is mapped into device space through the same [`ViewTransform`]. Flowed and
//! plain-text pages have no raster; their runs are laid out as lines and the
//! laid-out boxes go through the transform instead.

mod flow;
mod json;
mod options;
mod raster;
mod transform;

pub use flow::{layout_runs, measure, FlowLayout};
pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, RenderOptions, ScaleBounds};
pub use raster::{rasterize, Raster};
pub use transform::ViewTransform;

use serde::Serialize;

use crate::cancel::{CancelToken, NeverCancel, Outcome};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{DisplayList, Document, Page, Point, Rect, SourceFormat};

/// How a page was turned into pixels and overlay boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// Raster from the page's display list plus transformed run boxes
    RasterOverlay,
    /// No raster; runs laid out as lines
    FlowLayout,
}

/// One selectable text box in device space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySpan {
    /// Index of the source run on the page
    pub text_run_index: usize,
    /// The run's text
    pub text: String,
    /// Box in device pixels
    pub box_in_device_space: Rect,
}

impl OverlaySpan {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A page rendered at one scale and viewport offset.
///
/// `overlay_spans` has exactly one entry per text run of the source page,
/// in run order, including zero-area runs.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub page_index: usize,
    pub scale: f32,
    pub viewport_offset: Point,
    pub transform: ViewTransform,
    pub strategy: RenderStrategy,
    #[serde(skip)]
    pub raster: Option<Raster>,
    /// Page bounds in device space
    pub page_box: Rect,
    pub overlay_spans: Vec<OverlaySpan>,
}

impl RenderedPage {
    /// Concatenated overlay text, equal to the page's linear text.
    pub fn text(&self) -> String {
        self.overlay_spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Stateless page renderer.
#[derive(Debug, Clone, Default)]
pub struct RenderEngine {
    options: RenderOptions,
}

impl RenderEngine {
    /// Create a renderer with custom options.
    ///
    /// Invalid scale bounds are replaced by the defaults; use
    /// [`try_new`](Self::try_new) to reject them instead.
    pub fn new(mut options: RenderOptions) -> Self {
        if !options.scale_bounds.is_valid() {
            log::warn!(
                "Ignoring invalid scale bounds {}..{}",
                options.scale_bounds.min,
                options.scale_bounds.max
            );
            options.scale_bounds = ScaleBounds::default();
        }
        Self { options }
    }

    /// Create a renderer, failing with `InvalidConfig` on invalid scale bounds.
    pub fn try_new(options: RenderOptions) -> Result<Self> {
        let bounds = options.scale_bounds;
        if !bounds.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "scale bounds must satisfy 0 < min <= max, got {}..{}",
                bounds.min, bounds.max
            )));
        }
        Ok(Self { options })
    }

    /// Create a renderer from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::try_new(RenderOptions::from_config(config))
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn scale_bounds(&self) -> ScaleBounds {
        self.options.scale_bounds
    }

    /// Render a page of `doc`.
    ///
    /// `scale` is clamped to the configured bounds. Fails with
    /// `PageIndexOutOfRange` for an invalid index and `RenderFailure` when the
    /// page cannot be rasterized.
    pub fn render(
        &self,
        doc: &Document,
        page_index: usize,
        scale: f32,
        viewport_offset: Point,
    ) -> Result<RenderedPage> {
        match self.render_cancellable(doc, page_index, scale, viewport_offset, &NeverCancel, None)? {
            Outcome::Completed(page) => Ok(page),
            Outcome::Cancelled => Err(Error::RenderFailure(
                "render cancelled without a cancel request".to_string(),
            )),
        }
    }

    /// Render a page, polling `cancel` between stages.
    ///
    /// A pre-resolved `display_list` skips decoding the page's content.
    pub fn render_cancellable(
        &self,
        doc: &Document,
        page_index: usize,
        scale: f32,
        viewport_offset: Point,
        cancel: &dyn CancelToken,
        display_list: Option<&DisplayList>,
    ) -> Result<Outcome<RenderedPage>> {
        let page = doc.try_page(page_index)?;
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let scale = self.options.scale_bounds.clamp(scale);
        let transform = ViewTransform::new(scale, viewport_offset);

        let rendered = match doc.source_format() {
            SourceFormat::Paginated => {
                self.render_raster_overlay(page, transform, cancel, display_list)?
            }
            SourceFormat::Flowed | SourceFormat::PlainText => {
                self.render_flow_layout(page, transform, cancel)
            }
        };

        if rendered.is_cancelled() {
            log::debug!("Render of page {} cancelled", page_index + 1);
        }
        Ok(rendered)
    }

    /// Decode the display list of a paginated page.
    ///
    /// Returns `None` for pages without a raster source.
    pub fn resolve_display_list(&self, doc: &Document, page_index: usize) -> Result<Option<DisplayList>> {
        let page = doc.try_page(page_index)?;
        page.raster_source
            .as_ref()
            .map(|source| source.resolve())
            .transpose()
    }

    fn render_raster_overlay(
        &self,
        page: &Page,
        transform: ViewTransform,
        cancel: &dyn CancelToken,
        display_list: Option<&DisplayList>,
    ) -> Result<Outcome<RenderedPage>> {
        let resolved;
        let list = match display_list {
            Some(list) => list,
            None => {
                let source = page.raster_source.as_ref().ok_or_else(|| {
                    Error::RenderFailure(format!("page {} has no raster source", page.index + 1))
                })?;
                resolved = source.resolve()?;
                &resolved
            }
        };
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let (width, height) = self.pixmap_size(page, &transform)?;
        let raster = rasterize(list, &transform, width, height)?;
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let overlay_spans = page
            .text_runs
            .iter()
            .enumerate()
            .map(|(i, run)| OverlaySpan {
                text_run_index: i,
                text: run.text.clone(),
                box_in_device_space: transform.apply_rect(run.bbox),
            })
            .collect();

        Ok(Outcome::Completed(RenderedPage {
            page_index: page.index,
            scale: transform.scale,
            viewport_offset: transform.offset,
            transform,
            strategy: RenderStrategy::RasterOverlay,
            raster: Some(raster),
            page_box: transform.apply_rect(Rect::new(0.0, 0.0, page.width, page.height)),
            overlay_spans,
        }))
    }

    fn render_flow_layout(
        &self,
        page: &Page,
        transform: ViewTransform,
        cancel: &dyn CancelToken,
    ) -> Outcome<RenderedPage> {
        let layout = layout_runs(&page.text_runs, &self.options);
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let overlay_spans = page
            .text_runs
            .iter()
            .zip(&layout.boxes)
            .enumerate()
            .map(|(i, (run, bbox))| OverlaySpan {
                text_run_index: i,
                text: run.text.clone(),
                box_in_device_space: transform.apply_rect(*bbox),
            })
            .collect();

        Outcome::Completed(RenderedPage {
            page_index: page.index,
            scale: transform.scale,
            viewport_offset: transform.offset,
            transform,
            strategy: RenderStrategy::FlowLayout,
            raster: None,
            page_box: transform.apply_rect(layout.page),
            overlay_spans,
        })
    }

    /// Pixmap size covering the transformed page, at least 1x1.
    fn pixmap_size(&self, page: &Page, transform: &ViewTransform) -> Result<(u32, u32)> {
        let width = (page.width * transform.scale + transform.offset.x).ceil();
        let height = (page.height * transform.scale + transform.offset.y).ceil();
        let max = self.options.max_raster_dimension as f32;

        if !width.is_finite() || !height.is_finite() || width > max || height > max {
            return Err(Error::RenderFailure(format!(
                "raster of {}x{} exceeds the {} pixel limit",
                width, height, self.options.max_raster_dimension
            )));
        }
        Ok((width.max(1.0) as u32, height.max(1.0) as u32))
    }
}
