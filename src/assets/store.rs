use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    assets::decode,
    foundation::error::{TalkgenError, TalkgenResult},
    foundation::math::Fnv1a64,
};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug)]
/// Prepared SVG asset represented as a parsed `usvg` tree.
pub(crate) struct PreparedSvg {
    /// Parsed SVG tree.
    pub(crate) tree: Arc<usvg::Tree>,
}

/// An undecoded image source: the raw bytes of a PNG/JPEG/WebP/... file or an SVG document.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSource {
    bytes: Arc<Vec<u8>>,
}

impl AssetSource {
    /// Wrap in-memory file bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::new(bytes.into()),
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> TalkgenResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read asset '{}'", path.display()))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Sniff whether the bytes look like an SVG document rather than a raster file.
    pub fn is_svg(&self) -> bool {
        let head = &self.bytes[..self.bytes.len().min(512)];
        let text = String::from_utf8_lossy(head);
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && text.contains("<svg"))
    }

    fn cache_key(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u8(u8::from(self.is_svg()));
        h.write_bytes(self.bytes());
        h.finish()
    }
}

/// A decoded source, before it has been placed at a concrete size.
#[derive(Clone, Debug)]
pub(crate) enum DecodedAsset {
    Raster(PreparedImage),
    Vector(PreparedSvg),
}

impl DecodedAsset {
    /// Natural size in source pixels (SVG user units for vectors).
    pub(crate) fn intrinsic_size(&self) -> (f64, f64) {
        match self {
            Self::Raster(img) => (f64::from(img.width), f64::from(img.height)),
            Self::Vector(svg) => {
                let size = svg.tree.size();
                (f64::from(size.width()), f64::from(size.height()))
            }
        }
    }

    /// Produce pixels for drawing at a fixed `width` x `height` device pixels.
    ///
    /// Rasters larger than the target are resampled down to it; smaller ones are returned as-is
    /// and scaled by the renderer. Vectors are rasterized at the target size so they stay sharp.
    pub(crate) fn to_image(&self, width: f64, height: f64) -> TalkgenResult<PreparedImage> {
        let (tw, th) = target_px(width, height);
        match self {
            Self::Raster(img) if img.width > tw || img.height > th => {
                decode::resample_premul(img, img.width.min(tw), img.height.min(th))
            }
            Self::Raster(img) => Ok(img.clone()),
            Self::Vector(svg) => decode::rasterize_svg(svg, tw, th),
        }
    }

    /// Produce pixels for an asset the user may scale up after placement.
    ///
    /// Rasters keep their source resolution unless an edge exceeds what the renderer accepts,
    /// in which case they are shrunk to fit, preserving aspect.
    pub(crate) fn to_transformable_image(
        &self,
        width: f64,
        height: f64,
    ) -> TalkgenResult<PreparedImage> {
        match self {
            Self::Raster(img) => {
                let long_side = img.width.max(img.height);
                if long_side <= decode::MAX_RASTER_DIM {
                    return Ok(img.clone());
                }
                let ratio = f64::from(decode::MAX_RASTER_DIM) / f64::from(long_side);
                let w = ((f64::from(img.width) * ratio).floor() as u32).max(1);
                let h = ((f64::from(img.height) * ratio).floor() as u32).max(1);
                decode::resample_premul(img, w, h)
            }
            Self::Vector(_) => self.to_image(width, height),
        }
    }
}

fn target_px(width: f64, height: f64) -> (u32, u32) {
    (width.ceil().max(1.0) as u32, height.ceil().max(1.0) as u32)
}

/// Decode any source, dispatching on its sniffed format.
pub(crate) fn decode_source(source: &AssetSource) -> TalkgenResult<DecodedAsset> {
    if source.is_svg() {
        Ok(DecodedAsset::Vector(decode::parse_svg(source.bytes())?))
    } else {
        Ok(DecodedAsset::Raster(decode::decode_image(source.bytes())?))
    }
}

/// Content-addressed cache of decoded UI chrome, so unchanged chrome is not re-decoded on every
/// redraw.
#[derive(Debug, Default)]
pub(crate) struct DecodeCache {
    entries: HashMap<u64, DecodedAsset>,
}

impl DecodeCache {
    const MAX_ENTRIES: usize = 32;

    pub(crate) fn decode(&mut self, source: &AssetSource) -> TalkgenResult<DecodedAsset> {
        let key = source.cache_key();
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.clone());
        }
        let decoded = decode_source(source)?;
        if self.entries.len() >= Self::MAX_ENTRIES {
            self.entries.clear();
        }
        self.entries.insert(key, decoded.clone());
        Ok(decoded)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The fixed UI chrome images a scene is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UiAssetKind {
    /// Dialogue window for the windowed presentation.
    TalkWindow,
    /// Full-width backdrop for the still presentation.
    StillBackdrop,
    /// "Continue" arrow placed after the last glyph.
    Arrow,
    /// Area-name banner background.
    AreaName,
    /// Navigation icons for the windowed presentation.
    Nav,
    /// Navigation icons (with face button) for the still presentation.
    NavFace,
    /// Credit watermark, usually an SVG.
    Credit,
}

impl UiAssetKind {
    /// Every kind, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::TalkWindow,
        Self::StillBackdrop,
        Self::Arrow,
        Self::AreaName,
        Self::Nav,
        Self::NavFace,
        Self::Credit,
    ];

    /// Conventional file name inside a UI asset directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::TalkWindow => "anados-talk-window.png",
            Self::StillBackdrop => "anados-still-backdrop.png",
            Self::Arrow => "anados-arrow.png",
            Self::AreaName => "anados-area-name.png",
            Self::Nav => "anados-icon-nav.png",
            Self::NavFace => "anados-icon-nav-face.png",
            Self::Credit => "anados-gen-credit.svg",
        }
    }
}

/// Bundle of UI chrome sources, supplied once per compositor.
#[derive(Clone, Debug)]
pub struct UiAssets {
    sources: HashMap<UiAssetKind, AssetSource>,
}

impl UiAssets {
    /// Build a bundle from explicit sources. Every [`UiAssetKind`] must be present.
    pub fn new(sources: impl IntoIterator<Item = (UiAssetKind, AssetSource)>) -> TalkgenResult<Self> {
        let sources: HashMap<_, _> = sources.into_iter().collect();
        if let Some(missing) = UiAssetKind::ALL.iter().find(|k| !sources.contains_key(k)) {
            return Err(TalkgenError::validation(format!(
                "ui asset bundle is missing {missing:?}"
            )));
        }
        Ok(Self { sources })
    }

    /// Load every kind from `dir` using [`UiAssetKind::file_name`].
    pub fn from_dir(dir: impl AsRef<Path>) -> TalkgenResult<Self> {
        let dir = dir.as_ref();
        let mut sources = Vec::with_capacity(UiAssetKind::ALL.len());
        for kind in UiAssetKind::ALL {
            sources.push((kind, AssetSource::from_path(dir.join(kind.file_name()))?));
        }
        Self::new(sources)
    }

    pub(crate) fn get(&self, kind: UiAssetKind) -> &AssetSource {
        // `new` guarantees every kind is present.
        &self.sources[&kind]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
