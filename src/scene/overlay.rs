use serde::{Deserialize, Serialize};

use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Rect, Rgba8, Vec2},
    foundation::math::{round_position, round_rotation, round_scale},
    scene::model::{DrawItem, Layer, LayerState, OverlayId},
};

/// What an overlay slot holds. Determines the outline palette and the available adjustments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// A user-picked image file. Supports the opacity control.
    Image,
    /// A character sprite resolved from the sprite catalog.
    Sprite,
}

const IMAGE_PALETTE: [Rgba8; 3] = [
    Rgba8::rgb(0xFF, 0x4B, 0x00),
    Rgba8::rgb(0x03, 0xAF, 0x7A),
    Rgba8::rgb(0x00, 0x5A, 0xFF),
];

const SPRITE_PALETTE: [Rgba8; 4] = [
    Rgba8::rgb(0x4D, 0xC4, 0xFF),
    Rgba8::rgb(0xFF, 0xF1, 0x00),
    Rgba8::rgb(0x99, 0x00, 0x99),
    Rgba8::rgb(0x80, 0x40, 0x00),
];

impl OverlayKind {
    /// Outline colors cycled through by slot id.
    pub fn palette(self) -> &'static [Rgba8] {
        match self {
            Self::Image => &IMAGE_PALETTE,
            Self::Sprite => &SPRITE_PALETTE,
        }
    }
}

/// Outline color of the slot `id` of `kind`.
pub fn color_for_slot(kind: OverlayKind, id: OverlayId) -> Rgba8 {
    let palette = kind.palette();
    palette[id.0 as usize % palette.len()]
}

/// Position, rotation (degrees) and uniform scale of an overlay, in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayTransform {
    /// Horizontal position of the overlay's top-left corner.
    pub x: f64,
    /// Vertical position of the overlay's top-left corner.
    pub y: f64,
    /// Clockwise rotation about the top-left corner, in degrees.
    pub rotation: f64,
    /// Uniform scale.
    pub scale: f64,
}

impl OverlayTransform {
    /// Origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        scale: 1.0,
    };

    /// Local-to-surface transform.
    pub fn affine(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale(self.scale)
    }

    /// Read-back form: whole-pixel position, rotation to 0.1 degree, scale to 0.001.
    pub fn rounded(&self) -> Self {
        Self {
            x: round_position(self.x),
            y: round_position(self.y),
            rotation: round_rotation(self.rotation),
            scale: round_scale(self.scale),
        }
    }
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A committed user manipulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// The overlay was dragged. Drags carry no scale, so the current one is kept.
    Drag {
        /// New x.
        x: f64,
        /// New y.
        y: f64,
    },
    /// The overlay was rotated or scaled through its handles.
    Transform(OverlayTransform),
}

/// Direction of a z-order change among overlays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderDirection {
    /// Toward the chrome layer.
    Up,
    /// Toward the content layer.
    Down,
}

type TransformListener = Box<dyn FnMut(OverlayId, OverlayTransform)>;

/// A user-added image or sprite with its own layer, transform and adjustments.
///
/// The transform outlives the asset: replacing the source reapplies whatever transform the
/// previous asset had once the new one is decoded.
pub struct TransformableOverlay {
    id: OverlayId,
    kind: OverlayKind,
    layer: Layer,
    /// Unscaled size of the placed asset, in surface pixels.
    size: Option<Vec2>,
    transform: OverlayTransform,
    /// Transform captured from the last asset that was replaced.
    prior_transform: Option<OverlayTransform>,
    darken: bool,
    opacity_percent: u8,
    listeners: Vec<TransformListener>,
}

impl std::fmt::Debug for TransformableOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformableOverlay")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.layer.state)
            .field("size", &self.size)
            .field("transform", &self.transform)
            .field("darken", &self.darken)
            .field("opacity_percent", &self.opacity_percent)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TransformableOverlay {
    pub(crate) fn new(id: OverlayId, kind: OverlayKind) -> Self {
        Self {
            id,
            kind,
            layer: Layer::default(),
            size: None,
            transform: OverlayTransform::IDENTITY,
            prior_transform: None,
            darken: false,
            opacity_percent: 100,
            listeners: Vec::new(),
        }
    }

    /// Slot id.
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// Slot kind.
    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    /// Outline color of this slot's handles.
    pub fn color(&self) -> Rgba8 {
        color_for_slot(self.kind, self.id)
    }

    /// Current transform, unrounded.
    pub fn transform(&self) -> OverlayTransform {
        self.transform
    }

    /// Current transform as reported to listeners.
    pub fn snapshot(&self) -> OverlayTransform {
        self.transform.rounded()
    }

    /// Whether an asset is currently placed.
    pub fn has_asset(&self) -> bool {
        self.size.is_some()
    }

    /// Redraw progress of this overlay's layer.
    pub fn state(&self) -> LayerState {
        self.layer.state
    }

    /// Whether the value-curve darken is on.
    pub fn darken(&self) -> bool {
        self.darken
    }

    /// Opacity in percent.
    pub fn opacity_percent(&self) -> u8 {
        self.opacity_percent
    }

    /// Register a callback fired with the rounded transform whenever it changes.
    pub fn subscribe(&mut self, listener: impl FnMut(OverlayId, OverlayTransform) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Set position, rotation and scale.
    pub fn set_transform(&mut self, transform: OverlayTransform) {
        self.transform = transform;
        self.notify();
    }

    /// Back to the identity transform. Repeating it changes nothing further.
    pub fn reset_transform(&mut self) {
        self.set_transform(OverlayTransform::IDENTITY);
    }

    /// Apply a committed drag or handle manipulation.
    pub fn commit_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Drag { x, y } => {
                self.transform.x = x;
                self.transform.y = y;
            }
            Gesture::Transform(t) => self.transform = t,
        }
        self.notify();
    }

    /// Toggle the darken curve.
    pub fn set_darken(&mut self, darken: bool) {
        self.darken = darken;
    }

    /// Set opacity (clamped to 0..=100). Only image overlays have an opacity control; returns
    /// whether the value was applied.
    pub fn set_opacity_percent(&mut self, percent: u8) -> bool {
        if self.kind != OverlayKind::Image {
            tracing::debug!(id = self.id.0, "opacity ignored for sprite overlay");
            return false;
        }
        self.opacity_percent = percent.min(100);
        true
    }

    /// Drop the current asset, remembering its transform, and open a load generation.
    pub(crate) fn begin_source(&mut self) -> u64 {
        self.retire_asset();
        self.layer.begin_redraw()
    }

    /// Drop the current asset, remembering its transform, with nothing to load.
    pub(crate) fn clear_source(&mut self) {
        self.retire_asset();
        self.layer.clear();
    }

    fn retire_asset(&mut self) {
        if self.size.take().is_some() {
            self.prior_transform = Some(self.transform);
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.layer.is_current(generation)
    }

    pub(crate) fn mark_composing(&mut self) {
        self.layer.state = LayerState::Composing;
    }

    /// Place a decoded asset of unscaled `size`. Adjustments reset; the remembered transform (or
    /// identity) is applied.
    pub(crate) fn complete_source(&mut self, image: PreparedImage, size: Vec2) {
        self.layer.items = vec![DrawItem::Image {
            image,
            rect: Rect::from_origin_size((0.0, 0.0), (size.x, size.y)),
            opacity: 1.0,
        }];
        self.size = Some(size);
        self.transform = self.prior_transform.unwrap_or(OverlayTransform::IDENTITY);
        self.darken = false;
        self.opacity_percent = 100;
        self.layer.state = LayerState::Idle;
        self.notify();
    }

    /// A load failed; the layer stays empty.
    pub(crate) fn fail_source(&mut self) {
        self.layer.items.clear();
        self.layer.state = LayerState::Idle;
    }

    pub(crate) fn items(&self) -> &[DrawItem] {
        &self.layer.items
    }

    /// Opacity actually painted with.
    pub(crate) fn effective_opacity(&self) -> f32 {
        match self.kind {
            OverlayKind::Image => f32::from(self.opacity_percent) / 100.0,
            OverlayKind::Sprite => 1.0,
        }
    }

    /// Local bounds of the placed asset.
    pub(crate) fn local_bounds(&self) -> Option<Rect> {
        self.size
            .map(|size| Rect::from_origin_size((0.0, 0.0), (size.x, size.y)))
    }

    fn notify(&mut self) {
        let snapshot = self.transform.rounded();
        let id = self.id;
        for listener in &mut self.listeners {
            listener(id, snapshot);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/overlay.rs"]
mod tests;
