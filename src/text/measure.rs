use std::{borrow::Cow, path::Path, sync::Arc};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{TalkgenError, TalkgenResult};

/// The two weights the dialogue chrome uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    /// CSS weight 500.
    Medium,
    /// CSS weight 700.
    Bold,
}

impl FontWeight {
    /// Numeric CSS weight.
    pub fn css_value(self) -> f32 {
        match self {
            Self::Medium => 500.0,
            Self::Bold => 700.0,
        }
    }
}

/// Text-measurement capability supplied by the rendering backend.
///
/// Layout only needs horizontal advances; no shaping beyond what the implementation does for a
/// single run is assumed.
pub trait TextMeasure {
    /// Advance width of `text` set at `font_size` in the same units as `font_size`.
    fn advance(&mut self, text: &str, font_size: f64, weight: FontWeight) -> f64;
}

/// Measures every character as a fixed fraction of the font size.
///
/// Useful without font files (headless layout) and in tests. Full-width CJK text is close to
/// `advance_em = 1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMeasure {
    /// Advance of one character in ems.
    pub advance_em: f64,
}

impl Default for FixedAdvanceMeasure {
    fn default() -> Self {
        Self { advance_em: 1.0 }
    }
}

impl TextMeasure for FixedAdvanceMeasure {
    fn advance(&mut self, text: &str, font_size: f64, _weight: FontWeight) -> f64 {
        text.chars().count() as f64 * font_size * self.advance_em
    }
}

/// Font files for the two weights. Both may point at the same variable font.
#[derive(Clone)]
pub struct FontSet {
    medium: Arc<Vec<u8>>,
    bold: Arc<Vec<u8>>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("medium_len", &self.medium.len())
            .field("bold_len", &self.bold.len())
            .finish()
    }
}

impl FontSet {
    /// Separate files per weight.
    pub fn new(medium: Vec<u8>, bold: Vec<u8>) -> Self {
        Self {
            medium: Arc::new(medium),
            bold: Arc::new(bold),
        }
    }

    /// One (variable) font used for both weights.
    pub fn single(bytes: Vec<u8>) -> Self {
        let bytes = Arc::new(bytes);
        Self {
            medium: bytes.clone(),
            bold: bytes,
        }
    }

    /// Read font files from disk. `bold` defaults to `medium`.
    pub fn from_paths(medium: &Path, bold: Option<&Path>) -> TalkgenResult<Self> {
        let read = |p: &Path| {
            std::fs::read(p).with_context(|| format!("read font '{}'", p.display()))
        };
        let medium_bytes = read(medium)?;
        match bold {
            Some(b) => Ok(Self::new(medium_bytes, read(b)?)),
            None => Ok(Self::single(medium_bytes)),
        }
    }

    /// Font bytes for `weight`.
    pub fn bytes(&self, weight: FontWeight) -> &Arc<Vec<u8>> {
        match weight {
            FontWeight::Medium => &self.medium,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Parley-backed shaping used both for measuring and for producing glyph runs to draw.
pub(crate) struct ParleyText {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    medium_family: String,
    bold_family: String,
}

impl ParleyText {
    pub(crate) fn new(fonts: &FontSet) -> TalkgenResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let medium_family = register_family(&mut font_ctx, fonts.bytes(FontWeight::Medium))?;
        let bold_family = register_family(&mut font_ctx, fonts.bytes(FontWeight::Bold))?;
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            medium_family,
            bold_family,
        })
    }

    /// Lay out a single unbroken line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        weight: FontWeight,
    ) -> TalkgenResult<parley::Layout<()>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TalkgenError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let family = match weight {
            FontWeight::Medium => self.medium_family.clone(),
            FontWeight::Bold => self.bold_family.clone(),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight.css_value()),
        ));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextMeasure for ParleyText {
    fn advance(&mut self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        match self.layout_line(text, font_size as f32, weight) {
            Ok(layout) => f64::from(layout.full_width()),
            Err(err) => {
                tracing::warn!(%err, "text measurement failed; treating run as zero width");
                0.0
            }
        }
    }
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> TalkgenResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| TalkgenError::validation("no font families registered from font bytes"))?;
    let name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| TalkgenError::validation("registered font family has no name"))?;
    Ok(name.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/text/measure.rs"]
mod tests;
