use std::collections::VecDeque;

use crate::{
    assets::store::{AssetSource, DecodeCache, UiAssets, decode_source},
    foundation::core::{Canvas, Rect, Vec2},
    foundation::error::{TalkgenError, TalkgenResult},
    render::{
        composite,
        cpu::{CpuRenderer, FrameRGBA, RenderLayer, ViewOptions},
    },
    scene::{
        content::{self, ComposedUi},
        model::{ContentInputs, DrawItem, Layer, LayerKind, LayerState, OverlayId, SceneEvent},
        overlay::{OverlayKind, OverlayTransform, ReorderDirection, TransformableOverlay},
        scale::{DESIGN_HEIGHT, DESIGN_WIDTH, ScaleTransform, fit_background},
    },
    text::{
        layout::TextRun,
        measure::{FontSet, ParleyText, TextMeasure},
    },
};

/// A decode that has been requested but not yet applied.
#[derive(Debug)]
enum PendingLoad {
    Background {
        generation: u64,
        source: AssetSource,
    },
    Ui {
        generation: u64,
        inputs: ContentInputs,
    },
    Overlay {
        id: OverlayId,
        generation: u64,
        source: AssetSource,
    },
}

/// Owns the layered scene and sequences decodes into it.
///
/// Mutating calls only record intent and queue decodes; [`SceneCompositor::pump`] performs the
/// decodes in request order. Every redraw request clears its layer immediately and bumps that
/// layer's generation, so a completion from an older request is dropped instead of inserted.
///
/// Z-order, bottom to top: background, content, overlays in their list order, chrome.
pub struct SceneCompositor {
    ui: UiAssets,
    measure: Box<dyn TextMeasure>,
    renderer: CpuRenderer,
    cache: DecodeCache,
    canvas: Option<Canvas>,
    inputs: ContentInputs,
    background: Layer,
    content: Layer,
    chrome: Layer,
    overlays: Vec<TransformableOverlay>,
    pending: VecDeque<PendingLoad>,
    view_zoom: f64,
    handles_visible: bool,
}

impl std::fmt::Debug for SceneCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCompositor")
            .field("canvas", &self.canvas)
            .field("inputs", &self.inputs)
            .field("overlays", &self.overlays)
            .field("pending", &self.pending.len())
            .field("view_zoom", &self.view_zoom)
            .finish_non_exhaustive()
    }
}

impl SceneCompositor {
    /// Compositor that measures and draws text with `fonts`.
    pub fn new(ui: UiAssets, fonts: FontSet) -> TalkgenResult<Self> {
        let measure = ParleyText::new(&fonts)?;
        let renderer = CpuRenderer::new(Some(&fonts))?;
        Ok(Self::with_parts(ui, Box::new(measure), renderer))
    }

    /// Compositor with a caller-supplied measurement. Text is laid out but not drawn.
    pub fn with_text_measure(ui: UiAssets, measure: Box<dyn TextMeasure>) -> TalkgenResult<Self> {
        Ok(Self::with_parts(ui, measure, CpuRenderer::new(None)?))
    }

    fn with_parts(ui: UiAssets, measure: Box<dyn TextMeasure>, renderer: CpuRenderer) -> Self {
        Self {
            ui,
            measure,
            renderer,
            cache: DecodeCache::default(),
            canvas: None,
            inputs: ContentInputs::default(),
            background: Layer::default(),
            content: Layer::default(),
            chrome: Layer::default(),
            overlays: Vec::new(),
            pending: VecDeque::new(),
            view_zoom: 1.0,
            handles_visible: true,
        }
    }

    /// Replace the background. `None` clears the whole scene surface.
    pub fn set_background(&mut self, source: Option<AssetSource>) {
        match source {
            Some(source) => {
                let generation = self.background.begin_redraw();
                self.pending
                    .push_back(PendingLoad::Background { generation, source });
            }
            None => {
                self.background.clear();
                self.canvas = None;
                self.request_ui_redraw();
            }
        }
    }

    /// Replace every content input and redraw the content and chrome layers.
    pub fn set_content(&mut self, inputs: ContentInputs) {
        self.inputs = inputs;
        self.request_ui_redraw();
    }

    /// Current content inputs.
    pub fn content(&self) -> &ContentInputs {
        &self.inputs
    }

    fn request_ui_redraw(&mut self) {
        if self.canvas.is_none() {
            // Nothing to draw over until a background exists.
            self.content.clear();
            self.chrome.clear();
            return;
        }
        let generation = self.content.begin_redraw();
        self.chrome.begin_redraw();
        self.pending.push_back(PendingLoad::Ui {
            generation,
            inputs: self.inputs.clone(),
        });
    }

    /// Add an overlay slot on top of the existing overlays. Ids must be unique.
    pub fn add_overlay(
        &mut self,
        kind: OverlayKind,
        id: OverlayId,
        source: Option<AssetSource>,
    ) -> TalkgenResult<()> {
        if self.overlay(id).is_some() {
            return Err(TalkgenError::validation(format!(
                "overlay id {} is already in use",
                id.0
            )));
        }
        self.overlays.push(TransformableOverlay::new(id, kind));
        if let Some(source) = source {
            self.set_overlay_source(id, Some(source));
        }
        Ok(())
    }

    /// Remove an overlay and its layer. Unknown ids are ignored.
    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        let Some(index) = self.overlay_index(id) else {
            return false;
        };
        self.overlays.remove(index);
        self.pending
            .retain(|job| !matches!(job, PendingLoad::Overlay { id: queued, .. } if *queued == id));
        true
    }

    /// Move an overlay one step among the overlays. Returns `false` for unknown ids or when it
    /// is already at that end.
    pub fn reorder_overlay(&mut self, id: OverlayId, direction: ReorderDirection) -> bool {
        let Some(index) = self.overlay_index(id) else {
            return false;
        };
        let target = match direction {
            ReorderDirection::Up if index + 1 < self.overlays.len() => index + 1,
            ReorderDirection::Down if index > 0 => index - 1,
            _ => return false,
        };
        self.overlays.swap(index, target);
        true
    }

    /// One past the largest overlay id in use, or 0.
    pub fn next_overlay_id(&self) -> OverlayId {
        OverlayId(
            self.overlays
                .iter()
                .map(|o| o.id().0 + 1)
                .max()
                .unwrap_or(0),
        )
    }

    /// Overlay ids bottom to top.
    pub fn overlay_order(&self) -> Vec<OverlayId> {
        self.overlays.iter().map(TransformableOverlay::id).collect()
    }

    /// Read access to an overlay.
    pub fn overlay(&self, id: OverlayId) -> Option<&TransformableOverlay> {
        self.overlays.iter().find(|o| o.id() == id)
    }

    /// Command access to an overlay (transform, darken, opacity, subscriptions).
    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut TransformableOverlay> {
        self.overlays.iter_mut().find(|o| o.id() == id)
    }

    fn overlay_index(&self, id: OverlayId) -> Option<usize> {
        self.overlays.iter().position(|o| o.id() == id)
    }

    /// Swap an overlay's source. The transform held by the outgoing asset carries over to the
    /// new one once it decodes. `None` empties the layer.
    pub fn set_overlay_source(&mut self, id: OverlayId, source: Option<AssetSource>) -> bool {
        let Some(overlay) = self.overlay_mut(id) else {
            return false;
        };
        match source {
            Some(source) => {
                let generation = overlay.begin_source();
                self.pending.push_back(PendingLoad::Overlay {
                    id,
                    generation,
                    source,
                });
            }
            None => overlay.clear_source(),
        }
        true
    }

    /// Set an overlay's transform. Unknown ids are ignored.
    pub fn set_overlay_transform(&mut self, id: OverlayId, transform: OverlayTransform) -> bool {
        let Some(overlay) = self.overlay_mut(id) else {
            return false;
        };
        overlay.set_transform(transform);
        true
    }

    /// Reset an overlay to the identity transform. Unknown ids are ignored.
    pub fn reset_overlay_transform(&mut self, id: OverlayId) -> bool {
        let Some(overlay) = self.overlay_mut(id) else {
            return false;
        };
        overlay.reset_transform();
        true
    }

    /// Toggle an overlay's darken curve. Unknown ids are ignored.
    pub fn set_overlay_darken(&mut self, id: OverlayId, darken: bool) -> bool {
        let Some(overlay) = self.overlay_mut(id) else {
            return false;
        };
        overlay.set_darken(darken);
        true
    }

    /// Set an image overlay's opacity in percent. Unknown ids and sprites are ignored.
    pub fn set_overlay_opacity(&mut self, id: OverlayId, percent: u8) -> bool {
        self.overlay_mut(id)
            .is_some_and(|o| o.set_opacity_percent(percent))
    }

    /// Redraw progress of a layer; `None` for an unknown overlay.
    pub fn layer_state(&self, layer: LayerKind) -> Option<LayerState> {
        match layer {
            LayerKind::Background => Some(self.background.state),
            LayerKind::Content => Some(self.content.state),
            LayerKind::Chrome => Some(self.chrome.state),
            LayerKind::Overlay(id) => self.overlay(id).map(TransformableOverlay::state),
        }
    }

    /// Whether decodes are waiting for [`SceneCompositor::pump`].
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Render surface size, known once a background has decoded.
    pub fn canvas(&self) -> Option<Canvas> {
        self.canvas
    }

    /// Text runs currently placed on the content layer, in surface pixels.
    pub fn placed_text(&self) -> Vec<&TextRun> {
        self.content
            .items
            .iter()
            .filter_map(|item| match item {
                DrawItem::Text(run) => Some(run),
                DrawItem::Image { .. } => None,
            })
            .collect()
    }

    /// Surface rectangles of the images on a layer, in draw order.
    pub fn placed_images(&self, layer: LayerKind) -> Vec<Rect> {
        let items = match layer {
            LayerKind::Background => &self.background.items[..],
            LayerKind::Content => &self.content.items[..],
            LayerKind::Chrome => &self.chrome.items[..],
            LayerKind::Overlay(id) => self.overlay(id).map(|o| o.items()).unwrap_or(&[]),
        };
        items
            .iter()
            .filter_map(|item| match item {
                DrawItem::Image { rect, .. } => Some(*rect),
                DrawItem::Text(_) => None,
            })
            .collect()
    }

    /// Apply every decode queued before this call, in request order.
    ///
    /// Completions may queue follow-up work (a new background redraws the content layer); that
    /// work waits for the next call.
    #[tracing::instrument(skip(self), fields(queued = self.pending.len()))]
    pub fn pump(&mut self) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        for _ in 0..self.pending.len() {
            let Some(job) = self.pending.pop_front() else {
                break;
            };
            match job {
                PendingLoad::Background { generation, source } => {
                    self.finish_background(generation, &source, &mut events);
                }
                PendingLoad::Ui { generation, inputs } => {
                    self.finish_ui(generation, &inputs, &mut events);
                }
                PendingLoad::Overlay {
                    id,
                    generation,
                    source,
                } => self.finish_overlay(id, generation, &source, &mut events),
            }
        }
        events
    }

    /// Pump until nothing is queued.
    pub fn run_until_idle(&mut self) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        while self.has_pending() {
            events.extend(self.pump());
        }
        events
    }

    fn finish_background(
        &mut self,
        generation: u64,
        source: &AssetSource,
        events: &mut Vec<SceneEvent>,
    ) {
        if !self.background.is_current(generation) {
            tracing::debug!(generation, "dropping superseded background load");
            return;
        }
        self.background.state = LayerState::Composing;

        let placed = decode_source(source).and_then(|decoded| {
            let (w, h) = decoded.intrinsic_size();
            let canvas = fit_background(w.round() as u32, h.round() as u32);
            let rect = Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
            let image = decoded.to_image(rect.width(), rect.height())?;
            Ok((canvas, DrawItem::Image {
                image,
                rect,
                opacity: 1.0,
            }))
        });

        self.background.state = LayerState::Idle;
        match placed {
            Ok((canvas, item)) => {
                tracing::debug!(width = canvas.width, height = canvas.height, "background placed");
                self.background.items = vec![item];
                self.canvas = Some(canvas);
                events.push(SceneEvent::Composed {
                    layer: LayerKind::Background,
                });
            }
            Err(err) => {
                tracing::warn!(%err, "background decode failed");
                self.canvas = None;
                events.push(SceneEvent::DecodeFailed {
                    layer: LayerKind::Background,
                    message: err.to_string(),
                });
            }
        }
        self.request_ui_redraw();
    }

    fn finish_ui(&mut self, generation: u64, inputs: &ContentInputs, events: &mut Vec<SceneEvent>) {
        if !self.content.is_current(generation) {
            tracing::debug!(generation, "dropping superseded content redraw");
            return;
        }
        let Some(canvas) = self.canvas else {
            self.content.clear();
            self.chrome.clear();
            return;
        };

        let composed = content::load_ui(&mut self.cache, &self.ui, inputs).and_then(|loaded| {
            self.content.state = LayerState::Composing;
            self.chrome.state = LayerState::Composing;
            content::compose_ui(
                ScaleTransform::for_canvas(canvas),
                self.measure.as_mut(),
                &loaded,
                inputs,
            )
        });

        self.content.state = LayerState::Idle;
        self.chrome.state = LayerState::Idle;
        match composed {
            Ok(ComposedUi {
                content: content_items,
                chrome,
            }) => {
                self.content.items = content_items;
                self.chrome.items = chrome;
                events.push(SceneEvent::Composed {
                    layer: LayerKind::Content,
                });
                events.push(SceneEvent::Composed {
                    layer: LayerKind::Chrome,
                });
            }
            Err(err) => {
                tracing::warn!(%err, "content redraw failed");
                let message = err.to_string();
                events.push(SceneEvent::DecodeFailed {
                    layer: LayerKind::Content,
                    message: message.clone(),
                });
                events.push(SceneEvent::DecodeFailed {
                    layer: LayerKind::Chrome,
                    message,
                });
            }
        }
    }

    fn finish_overlay(
        &mut self,
        id: OverlayId,
        generation: u64,
        source: &AssetSource,
        events: &mut Vec<SceneEvent>,
    ) {
        let scale = self.scale();
        let Some(overlay) = self.overlay_mut(id) else {
            tracing::debug!(id = id.0, "dropping load for removed overlay");
            return;
        };
        if !overlay.is_current(generation) {
            tracing::debug!(id = id.0, generation, "dropping superseded overlay load");
            return;
        }
        overlay.mark_composing();

        let placed = decode_source(source).and_then(|decoded| {
            let (w, h) = decoded.intrinsic_size();
            let size = Vec2::new(scale.x(w), scale.x(h));
            Ok((decoded.to_transformable_image(size.x, size.y)?, size))
        });

        let layer = LayerKind::Overlay(id);
        match placed {
            Ok((image, size)) => {
                overlay.complete_source(image, size);
                events.push(SceneEvent::Composed { layer });
            }
            Err(err) => {
                tracing::warn!(id = id.0, %err, "overlay decode failed");
                overlay.fail_source();
                events.push(SceneEvent::DecodeFailed {
                    layer,
                    message: err.to_string(),
                });
            }
        }
    }

    /// Overlays placed before any background are sized against the design canvas.
    fn scale(&self) -> ScaleTransform {
        self.canvas
            .map(ScaleTransform::for_canvas)
            .unwrap_or(ScaleTransform::new(DESIGN_WIDTH, DESIGN_HEIGHT))
    }

    /// Set the live-view zoom (fit-to-window). Export always renders at 1:1.
    pub fn set_view_zoom(&mut self, zoom: f64) -> TalkgenResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(TalkgenError::validation("view zoom must be finite and > 0"));
        }
        self.view_zoom = zoom;
        Ok(())
    }

    /// Current live-view zoom.
    pub fn view_zoom(&self) -> f64 {
        self.view_zoom
    }

    /// Show or hide overlay transform handles in the live view.
    pub fn set_handles_visible(&mut self, visible: bool) {
        self.handles_visible = visible;
    }

    /// Whether handles are drawn in the live view.
    pub fn handles_visible(&self) -> bool {
        self.handles_visible
    }

    /// Render what the live view shows: current zoom, handles as configured.
    pub fn render_view(&mut self) -> TalkgenResult<FrameRGBA> {
        let canvas = self
            .canvas
            .ok_or_else(|| TalkgenError::validation("scene has no background"))?;
        let view = ViewOptions {
            zoom: self.view_zoom,
            show_handles: self.handles_visible,
        };
        self.render_frame(canvas, view)
    }

    /// Rasterize the composed artwork at 1:1 without handles and encode it as PNG. The live
    /// view's zoom and handle visibility are restored afterwards.
    #[tracing::instrument(skip(self))]
    pub fn export(&mut self) -> TalkgenResult<Vec<u8>> {
        let canvas = self
            .canvas
            .ok_or_else(|| TalkgenError::validation("cannot export a scene without a background"))?;

        let saved_zoom = std::mem::replace(&mut self.view_zoom, 1.0);
        let saved_handles = std::mem::replace(&mut self.handles_visible, false);
        let frame = self.render_frame(
            canvas,
            ViewOptions {
                zoom: self.view_zoom,
                show_handles: self.handles_visible,
            },
        );
        self.view_zoom = saved_zoom;
        self.handles_visible = saved_handles;

        let frame = frame?;
        tracing::debug!(width = frame.width, height = frame.height, "exporting png");
        composite::encode_png(frame.width, frame.height, &frame.data)
    }

    fn render_frame(&mut self, canvas: Canvas, view: ViewOptions) -> TalkgenResult<FrameRGBA> {
        let mut layers = Vec::with_capacity(self.overlays.len() + 3);
        layers.push(RenderLayer::Items(&self.background.items));
        layers.push(RenderLayer::Items(&self.content.items));
        layers.extend(self.overlays.iter().map(RenderLayer::Overlay));
        layers.push(RenderLayer::Items(&self.chrome.items));
        self.renderer.render(canvas, view, &layers)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compositor.rs"]
mod tests;
