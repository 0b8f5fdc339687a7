use serde::{Deserialize, Serialize};

use crate::{
    assets::store::PreparedImage,
    foundation::core::Rect,
    text::layout::TextRun,
};

/// Dialogue presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Speech window at the bottom of the screen.
    #[default]
    Normal,
    /// Full-width backdrop for event stills.
    Still,
}

/// Where (and whether) the area name appears.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaDisplay {
    /// Banner in the top-left corner.
    #[default]
    Show,
    /// No banner.
    Hide,
    /// No banner; the navigation icons move to the left where the game UI shows the area.
    UiEmbedded,
}

/// Everything that feeds the content and chrome layers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentInputs {
    /// Presentation mode.
    pub mode: PresentationMode,
    /// Speaker name.
    pub char_name: String,
    /// Body text with `\n` line breaks and `[#base,ruby]` annotations.
    pub text: String,
    /// Use the large font tier.
    pub big_text: bool,
    /// Area-name display.
    pub area_display: AreaDisplay,
    /// Area name shown on the banner.
    pub area_name: String,
}

/// Caller-assigned overlay identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverlayId(pub u32);

/// A compositing layer of the scene, bottom to top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// User background image.
    Background,
    /// Dialogue window, watermark, name, body text, arrow and area banner.
    Content,
    /// One user overlay.
    Overlay(OverlayId),
    /// Navigation icons. Never interactive.
    Chrome,
}

/// Per-layer redraw progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerState {
    /// Showing its latest requested content (or intentionally empty).
    #[default]
    Idle,
    /// Cleared, waiting for sources to decode.
    Loading,
    /// Sources decoded; children being built.
    Composing,
}

/// Something placed on a layer, in surface pixels.
#[derive(Clone, Debug)]
pub(crate) enum DrawItem {
    Image {
        image: PreparedImage,
        rect: Rect,
        opacity: f32,
    },
    Text(TextRun),
}

/// A layer's children plus its redraw bookkeeping.
#[derive(Clone, Debug, Default)]
pub(crate) struct Layer {
    pub(crate) items: Vec<DrawItem>,
    pub(crate) state: LayerState,
    /// Bumped by every redraw request; completions carrying an older value are stale.
    pub(crate) generation: u64,
}

impl Layer {
    /// Drop all children and open a new redraw generation.
    pub(crate) fn begin_redraw(&mut self) -> u64 {
        self.items.clear();
        self.generation += 1;
        self.state = LayerState::Loading;
        self.generation
    }

    /// Drop all children without scheduling anything.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.generation += 1;
        self.state = LayerState::Idle;
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Non-fatal outcomes reported by [`crate::SceneCompositor::pump`].
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    /// A layer finished a redraw.
    Composed {
        /// The layer.
        layer: LayerKind,
    },
    /// A source failed to decode; the layer was left empty.
    DecodeFailed {
        /// The layer.
        layer: LayerKind,
        /// Decoder message.
        message: String,
    },
}
