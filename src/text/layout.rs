use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::{Point, Rgba8},
    text::{
        measure::{FontWeight, TextMeasure},
        ruby::parse_ruby_line,
    },
};

/// What a [`TextRun`] is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Plain text on the baseline.
    Base,
    /// Baseline text that carries an annotation.
    RubyBase,
    /// The annotation itself, half size, above its base.
    RubyAnnotation,
}

/// Outline drawn under the fill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStroke {
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width in design units.
    pub width: f64,
}

/// Paint and weight shared by every run of a block of text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font weight.
    pub weight: FontWeight,
    /// Fill color.
    pub fill: Rgba8,
    /// Optional outline, painted before the fill.
    pub stroke: Option<TextStroke>,
}

/// One positioned, drawable piece of text in design space.
///
/// `origin` is the top-left of the run's line box.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextRun {
    /// Role of this run.
    pub kind: RunKind,
    /// Text to draw.
    pub text: String,
    /// Top-left corner.
    pub origin: Point,
    /// Font size.
    pub font_size: f64,
    /// Measured advance width.
    pub width: f64,
    /// Paint and weight.
    pub style: TextStyle,
}

/// Result of laying out a block of dialogue.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DialogueLayout {
    /// Runs in draw order.
    pub runs: Vec<TextRun>,
    /// Horizontal cursor reached on the last line, relative to the left margin.
    pub last_line_advance: f64,
    /// Number of lines laid out.
    pub line_count: usize,
}

/// Lays out caller-broken lines of ruby-annotated text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextLayoutEngine {
    line_gap: f64,
}

impl TextLayoutEngine {
    /// Extra spacing between lines of the windowed presentation.
    pub const WINDOW_LINE_GAP: f64 = 24.0;
    /// Extra spacing between lines of the full-screen still presentation.
    pub const STILL_LINE_GAP: f64 = 20.0;

    /// Engine with the given extra line spacing.
    pub fn new(line_gap: f64) -> Self {
        Self { line_gap }
    }

    /// Vertical distance between consecutive line origins.
    pub fn line_pitch(&self, font_size: f64) -> f64 {
        font_size + self.line_gap
    }

    /// Lay out `lines` starting at `origin` (left margin, top of the first line).
    ///
    /// Line pitch ignores ruby: annotations sit in the space above their line.
    pub fn layout<M: TextMeasure + ?Sized>(
        &self,
        measure: &mut M,
        lines: &[&str],
        origin: Point,
        font_size: f64,
        style: &TextStyle,
    ) -> DialogueLayout {
        let mut out = DialogueLayout {
            line_count: lines.len(),
            ..DialogueLayout::default()
        };
        let ruby_size = font_size / 2.0;

        for (i, line) in lines.iter().enumerate() {
            let y = origin.y + i as f64 * self.line_pitch(font_size);
            let mut text_x = 0.0;

            for segment in parse_ruby_line(line) {
                let width = measure.advance(&segment.text, font_size, style.weight);
                let base = TextRun {
                    kind: if segment.ruby.is_some() {
                        RunKind::RubyBase
                    } else {
                        RunKind::Base
                    },
                    text: segment.text,
                    origin: Point::new(origin.x + text_x, y),
                    font_size,
                    width,
                    style: *style,
                };
                text_x += width;

                let annotation = segment.ruby.map(|ruby| {
                    // Anchor at the base's center, then shift left by half the measured width.
                    let center_x = base.origin.x + base.width / 2.0;
                    let ruby_width = measure.advance(&ruby, ruby_size, style.weight);
                    TextRun {
                        kind: RunKind::RubyAnnotation,
                        text: ruby,
                        origin: Point::new(center_x - ruby_width / 2.0, y - font_size / 2.0),
                        font_size: ruby_size,
                        width: ruby_width,
                        style: *style,
                    }
                });

                out.runs.push(base);
                out.runs.extend(annotation);
            }

            out.last_line_advance = text_x;
        }

        out
    }
}

/// Split caller text into lines on `\n`.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
