use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    assets::{
        catalog::{SpriteCatalog, SpriteSelection},
        store::{AssetSource, UiAssets},
    },
    foundation::error::{TalkgenError, TalkgenResult},
    scene::{
        compositor::SceneCompositor,
        model::{ContentInputs, OverlayId, SceneEvent},
        overlay::{OverlayKind, OverlayTransform},
    },
    text::measure::{FixedAdvanceMeasure, FontSet},
};

/// Font files used for measuring and drawing text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontPaths {
    /// Weight 500 face.
    pub medium: PathBuf,
    /// Weight 700 face. Falls back to `medium`.
    #[serde(default)]
    pub bold: Option<PathBuf>,
}

/// Where an overlay's pixels come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlaySourceDoc {
    /// An image file.
    Image {
        /// Image path.
        path: PathBuf,
    },
    /// A sprite face looked up in the sprite catalog.
    Sprite(SpriteSelection),
}

/// One overlay slot of a [`SceneDocument`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayDoc {
    /// Slot id. Defaults to the next free id.
    #[serde(default)]
    pub id: Option<u32>,
    /// Source of the overlay.
    #[serde(flatten)]
    pub source: OverlaySourceDoc,
    /// Transform applied after the source loads.
    #[serde(default)]
    pub transform: Option<OverlayTransform>,
    /// Darken curve.
    #[serde(default)]
    pub darken: bool,
    /// Opacity in percent, image overlays only.
    #[serde(default)]
    pub opacity: Option<u8>,
}

/// A whole scene described as JSON. Relative paths resolve against the document's directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneDocument {
    /// Directory holding the UI chrome images.
    pub ui_dir: PathBuf,
    /// Fonts. Without them text is laid out with a fixed advance and not drawn.
    pub fonts: Option<FontPaths>,
    /// Background image.
    pub background: Option<PathBuf>,
    /// Dialogue content.
    pub content: ContentInputs,
    /// Sprite catalog JSON.
    pub sprite_catalog: Option<PathBuf>,
    /// Directory the catalog's `{id}/{file}` paths are relative to.
    pub sprite_root: Option<PathBuf>,
    /// Overlays, bottom to top.
    pub overlays: Vec<OverlayDoc>,
    /// Live-view zoom.
    pub view_zoom: Option<f64>,
}

impl SceneDocument {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> TalkgenResult<Self> {
        serde_json::from_str(json).map_err(|e| TalkgenError::serde(e.to_string()))
    }

    /// Read and parse a JSON document.
    pub fn from_path(path: impl AsRef<Path>) -> TalkgenResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read scene document '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Build a compositor with this document's UI assets and fonts.
    pub fn build_compositor(&self, base_dir: &Path) -> TalkgenResult<SceneCompositor> {
        let ui = UiAssets::from_dir(base_dir.join(&self.ui_dir))?;
        match &self.fonts {
            Some(fonts) => {
                let bold = fonts.bold.as_ref().map(|p| base_dir.join(p));
                let set = FontSet::from_paths(&base_dir.join(&fonts.medium), bold.as_deref())?;
                SceneCompositor::new(ui, set)
            }
            None => {
                tracing::warn!("scene document has no fonts; text will not be drawn");
                SceneCompositor::with_text_measure(ui, Box::new(FixedAdvanceMeasure::default()))
            }
        }
    }

    /// Load everything into `compositor` and run it to idle. Overlay transforms and adjustments
    /// are applied once their sources have loaded, since a first load starts from identity.
    #[tracing::instrument(skip_all, fields(overlays = self.overlays.len()))]
    pub fn apply_to(
        &self,
        compositor: &mut SceneCompositor,
        base_dir: &Path,
    ) -> TalkgenResult<Vec<SceneEvent>> {
        if let Some(zoom) = self.view_zoom {
            compositor.set_view_zoom(zoom)?;
        }
        let background = self
            .background
            .as_ref()
            .map(|p| AssetSource::from_path(base_dir.join(p)))
            .transpose()?;
        compositor.set_background(background);
        compositor.set_content(self.content.clone());

        let catalog = self
            .sprite_catalog
            .as_ref()
            .map(|p| SpriteCatalog::from_path(base_dir.join(p)))
            .transpose()?;
        let sprite_root = base_dir.join(self.sprite_root.as_deref().unwrap_or(Path::new("")));

        let mut placed = Vec::with_capacity(self.overlays.len());
        for doc in &self.overlays {
            let id = doc.id.map_or_else(|| compositor.next_overlay_id(), OverlayId);
            let (kind, source) = match &doc.source {
                OverlaySourceDoc::Image { path } => (
                    OverlayKind::Image,
                    Some(AssetSource::from_path(base_dir.join(path))?),
                ),
                OverlaySourceDoc::Sprite(selection) => {
                    let catalog = catalog.as_ref().ok_or_else(|| {
                        TalkgenError::validation("sprite overlay needs a sprite_catalog")
                    })?;
                    let source = match selection.resolve(catalog) {
                        Some(rel) => Some(AssetSource::from_path(sprite_root.join(rel))?),
                        None => {
                            tracing::warn!(
                                sprite = %selection.sprite_id,
                                skin = selection.skin_index,
                                file = selection.file_index,
                                "sprite selection does not resolve; overlay left empty"
                            );
                            None
                        }
                    };
                    (OverlayKind::Sprite, source)
                }
            };
            compositor.add_overlay(kind, id, source)?;
            placed.push((id, doc));
        }

        let events = compositor.run_until_idle();

        for (id, doc) in placed {
            if let Some(transform) = doc.transform {
                compositor.set_overlay_transform(id, transform);
            }
            compositor.set_overlay_darken(id, doc.darken);
            if let Some(opacity) = doc.opacity {
                compositor.set_overlay_opacity(id, opacity);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
