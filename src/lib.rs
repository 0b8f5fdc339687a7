//! talkgen composes visual-novel style dialogue screenshots.
//!
//! A scene is a stack of layers over a user background: the dialogue window with speaker name,
//! ruby-annotated body text and continue arrow, an optional area-name banner, user overlays that
//! can be moved, rotated, scaled and darkened, and the navigation chrome on top. Layout is
//! authored against a 1920x1080 design canvas and scaled onto whatever size the background
//! gives the render surface.
//!
//! - Build a [`SceneCompositor`] from [`UiAssets`] and a [`FontSet`]
//! - Feed it a background, [`ContentInputs`] and overlays, then [`SceneCompositor::pump`]
//! - [`SceneCompositor::export`] a PNG
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod render;
mod scene;
mod text;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{TalkgenError, TalkgenResult};

pub use crate::assets::catalog::{SkinInfo, SpriteCatalog, SpriteInfo, SpriteSelection};
pub use crate::assets::store::{AssetSource, PreparedImage, UiAssetKind, UiAssets};
pub use crate::render::cpu::FrameRGBA;
pub use crate::scene::compositor::SceneCompositor;
pub use crate::scene::content::layout_dialogue;
pub use crate::scene::document::{FontPaths, OverlayDoc, OverlaySourceDoc, SceneDocument};
pub use crate::scene::model::{
    AreaDisplay, ContentInputs, LayerKind, LayerState, OverlayId, PresentationMode, SceneEvent,
};
pub use crate::scene::overlay::{
    Gesture, OverlayKind, OverlayTransform, ReorderDirection, TransformableOverlay,
    color_for_slot,
};
pub use crate::scene::scale::{DESIGN_HEIGHT, DESIGN_WIDTH, ScaleTransform, fit_background};
pub use crate::text::layout::{
    DialogueLayout, RunKind, TextLayoutEngine, TextRun, TextStroke, TextStyle, split_lines,
};
pub use crate::text::measure::{FixedAdvanceMeasure, FontSet, FontWeight, TextMeasure};
pub use crate::text::ruby::{RubySegment, insert_ruby, parse_ruby_line, strip_ruby};
