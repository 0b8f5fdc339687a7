//! Inline ruby (furigana) markup.
//!
//! A line may embed annotations of the form `[#base,ruby]`. Anything that does not form a
//! complete annotation is kept as literal text, so a typo never breaks the render.

use serde::Serialize;

const OPEN: &str = "[#";
const SEP: char = ',';
const CLOSE: char = ']';

/// One parsed piece of a line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RubySegment {
    /// Text drawn on the baseline.
    pub text: String,
    /// Annotation drawn above `text`, if any.
    pub ruby: Option<String>,
}

impl RubySegment {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ruby: None,
        }
    }

    fn annotated(base: &str, ruby: &str) -> Self {
        Self {
            text: base.to_string(),
            ruby: Some(ruby.to_string()),
        }
    }
}

/// Split `line` into plain and ruby-annotated segments.
///
/// Segments cover the whole line in order. Empty plain runs are omitted.
pub fn parse_ruby_line(line: &str) -> Vec<RubySegment> {
    let mut out = Vec::new();
    let mut parts = line.split(OPEN);

    if let Some(head) = parts.next()
        && !head.is_empty()
    {
        out.push(RubySegment::plain(head));
    }

    for part in parts {
        match split_annotation(part) {
            Some((base, ruby, trailing)) => {
                out.push(RubySegment::annotated(base, ruby));
                if !trailing.is_empty() {
                    out.push(RubySegment::plain(trailing));
                }
            }
            None => {
                tracing::debug!(segment = part, "malformed ruby annotation kept as text");
                out.push(RubySegment::plain(format!("{OPEN}{part}")));
            }
        }
    }

    out
}

/// `base,ruby]trailing` -> `(base, ruby, trailing)`; `None` when the annotation is incomplete.
fn split_annotation(part: &str) -> Option<(&str, &str, &str)> {
    let (base, rest) = part.split_once(SEP)?;
    let (ruby, trailing) = rest.split_once(CLOSE)?;
    if base.is_empty() || ruby.is_empty() || ruby.contains(SEP) {
        return None;
    }
    Some((base, ruby, trailing))
}

/// The text a reader sees on the baseline: annotations replaced by their base text.
pub fn strip_ruby(line: &str) -> String {
    parse_ruby_line(line)
        .into_iter()
        .map(|s| s.text)
        .collect()
}

/// Insert `[#base,ruby]` into `text` before the character at `char_index`.
///
/// The index counts Unicode scalar values and is clamped to the end of the text.
pub fn insert_ruby(text: &str, char_index: usize, base: &str, ruby: &str) -> String {
    let byte_index = text
        .char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i);
    let mut out = String::with_capacity(text.len() + base.len() + ruby.len() + 4);
    out.push_str(&text[..byte_index]);
    out.push_str(OPEN);
    out.push_str(base);
    out.push(SEP);
    out.push_str(ruby);
    out.push(CLOSE);
    out.push_str(&text[byte_index..]);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/ruby.rs"]
mod tests;
