/// Line templates: raw speech text pre-split into literal and placeholder segments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which delimiter family a placeholder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    /// `{key}`, resolved from the named context.
    Named,
    /// `#key#`, resolved from the tagged vocabulary.
    Tagged,
}

impl PlaceholderKind {
    fn delimiters(&self) -> (char, char) {
        match self {
            Self::Named => ('{', '}'),
            Self::Tagged => ('#', '#'),
        }
    }

    /// The token as it appears in a script, e.g. `{village}` or `#meal#`.
    pub fn token(&self, key: &str) -> String {
        let (open, close) = self.delimiters();
        format!("{}{}{}", open, key, close)
    }
}

/// A segment of a parsed line template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Named placeholder: `{player-name}`.
    Named(String),
    /// Tagged placeholder: `#goods#`.
    Tagged(String),
}

/// A line of speech with its placeholders located.
///
/// Parsing never fails. A delimiter that does not open a well-formed
/// placeholder stays in the text as a literal character, so stray `#` or
/// braces in dialogue survive untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTemplate {
    raw: String,
    segments: Vec<TemplateSegment>,
}

impl LineTemplate {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{key}` → `Named`
    /// - `#key#` → `Tagged`
    /// - Everything else → `Literal`
    ///
    /// A key is a non-empty run of ASCII alphanumerics, `-`, `_` or `.`.
    pub fn parse(input: &str) -> LineTemplate {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let kind = match chars[i] {
                '{' => Some(PlaceholderKind::Named),
                '#' => Some(PlaceholderKind::Tagged),
                _ => None,
            };

            if let Some(kind) = kind {
                if let Some((key, next)) = scan_placeholder(&chars, i, kind) {
                    if !literal_buf.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(
                            &mut literal_buf,
                        )));
                    }
                    segments.push(match kind {
                        PlaceholderKind::Named => TemplateSegment::Named(key),
                        PlaceholderKind::Tagged => TemplateSegment::Tagged(key),
                    });
                    i = next;
                    continue;
                }
            }

            literal_buf.push(chars[i]);
            i += 1;
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        LineTemplate {
            raw: input.to_string(),
            segments,
        }
    }

    /// The template exactly as written in the script.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Every placeholder in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = (PlaceholderKind, &str)> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Named(key) => Some((PlaceholderKind::Named, key.as_str())),
            TemplateSegment::Tagged(key) => Some((PlaceholderKind::Tagged, key.as_str())),
            TemplateSegment::Literal(_) => None,
        })
    }

    pub fn has_placeholders(&self) -> bool {
        self.placeholders().next().is_some()
    }
}

impl fmt::Display for LineTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Try to read a placeholder opening at `start`. Returns the key and the
/// index just past the closing delimiter.
fn scan_placeholder(chars: &[char], start: usize, kind: PlaceholderKind) -> Option<(String, usize)> {
    let (_, close) = kind.delimiters();
    let mut end = start + 1;
    while end < chars.len() && is_key_char(chars[end]) {
        end += 1;
    }
    if end == start + 1 || end >= chars.len() || chars[end] != close {
        return None;
    }
    let key: String = chars[start + 1..end].iter().collect();
    Some((key, end + 1))
}
