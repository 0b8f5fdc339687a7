use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{TalkgenError, TalkgenResult};

/// One skin (costume) of a sprite: an ordered list of face files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinInfo {
    /// Position of the skin within its sprite.
    pub index: usize,
    /// Files relative to the sprite directory, in display order.
    pub files: Vec<String>,
}

/// A sprite entry of the static catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteInfo {
    /// Directory name of the sprite.
    pub id: String,
    /// Japanese display name.
    #[serde(default)]
    pub name_ja: String,
    /// English display name.
    #[serde(default)]
    pub name_en: String,
    /// Skins in display order.
    pub skins: Vec<SkinInfo>,
}

/// Read-only sprite catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteCatalog {
    sprites: Vec<SpriteInfo>,
}

impl SpriteCatalog {
    /// Wrap already-loaded catalog entries.
    pub fn new(sprites: Vec<SpriteInfo>) -> Self {
        Self { sprites }
    }

    /// Parse a JSON array of [`SpriteInfo`].
    pub fn from_json(json: &str) -> TalkgenResult<Self> {
        serde_json::from_str(json).map_err(|e| TalkgenError::serde(e.to_string()))
    }

    /// Read and parse a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> TalkgenResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read sprite catalog '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// All sprites in catalog order.
    pub fn sprites(&self) -> &[SpriteInfo] {
        &self.sprites
    }

    /// Look up a sprite by id.
    pub fn sprite(&self, sprite_id: &str) -> Option<&SpriteInfo> {
        self.sprites.iter().find(|s| s.id == sprite_id)
    }

    /// Resolve a file path (relative to the sprite root) for a selection.
    ///
    /// Returns `None` when any index is out of range.
    pub fn resolve(&self, sprite_id: &str, skin_index: usize, file_index: usize) -> Option<String> {
        let file = self
            .sprite(sprite_id)?
            .skins
            .get(skin_index)?
            .files
            .get(file_index)?;
        Some(format!("{sprite_id}/{file}"))
    }
}

/// A user's current sprite/skin/face choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSelection {
    /// Selected sprite id.
    pub sprite_id: String,
    /// Selected skin.
    #[serde(default)]
    pub skin_index: usize,
    /// Selected face file within the skin.
    #[serde(default)]
    pub file_index: usize,
}

impl SpriteSelection {
    /// First skin and file of the first catalog sprite.
    pub fn first(catalog: &SpriteCatalog) -> Option<Self> {
        catalog.sprites().first().map(|s| Self {
            sprite_id: s.id.clone(),
            skin_index: 0,
            file_index: 0,
        })
    }

    /// Switch sprite; skin and file restart at the beginning.
    pub fn select_sprite(&mut self, sprite_id: impl Into<String>) {
        self.sprite_id = sprite_id.into();
        self.skin_index = 0;
        self.file_index = 0;
    }

    /// Switch skin, keeping the face while the new skin still has a file at that index.
    pub fn select_skin(&mut self, catalog: &SpriteCatalog, skin_index: usize) {
        self.skin_index = skin_index;
        let file_count = catalog
            .sprite(&self.sprite_id)
            .and_then(|s| s.skins.get(skin_index))
            .map_or(0, |skin| skin.files.len());
        if self.file_index >= file_count {
            self.file_index = 0;
        }
    }

    /// Switch face file.
    pub fn select_file(&mut self, file_index: usize) {
        self.file_index = file_index;
    }

    /// Resolve against `catalog`.
    pub fn resolve(&self, catalog: &SpriteCatalog) -> Option<String> {
        catalog.resolve(&self.sprite_id, self.skin_index, self.file_index)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/catalog.rs"]
mod tests;
