/// Placeholder resolution — turns a line template into final speech.
///
/// Named placeholders (`{key}`) and tagged placeholders (`#key#`) are looked
/// up in two separate tables. The named table carries identity context
/// (player name, village, inn name); the tagged table carries categorical
/// vocabulary (goods sold, current meal).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::template::{LineTemplate, PlaceholderKind, TemplateSegment};

/// Key filled by [`RenderContext::with_time_of_day`].
pub const TIME_GREETING: &str = "time-greeting";

/// Live values for placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    #[serde(default)]
    pub named: HashMap<String, String>,
    #[serde(default)]
    pub tagged: HashMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_named(key, value);
        self
    }

    pub fn with_tagged(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_tagged(key, value);
        self
    }

    pub fn set_named(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.named.insert(key.into(), value.into());
    }

    pub fn set_tagged(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tagged.insert(key.into(), value.into());
    }

    /// Fill `{time-greeting}` from an hour of the day (0-23).
    pub fn with_time_of_day(self, hour: u8) -> Self {
        self.with_named(TIME_GREETING, time_greeting(hour))
    }

    fn lookup(&self, kind: PlaceholderKind, key: &str) -> Option<&str> {
        let table = match kind {
            PlaceholderKind::Named => &self.named,
            PlaceholderKind::Tagged => &self.tagged,
        };
        table.get(key).map(String::as_str)
    }
}

/// Greeting for an hour of the day. Hours past 23 wrap.
pub fn time_greeting(hour: u8) -> &'static str {
    match hour % 24 {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// What to print in place of a placeholder that has no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackStyle {
    /// The token exactly as written: `{village}`, `#meal#`.
    #[default]
    Verbatim,
    /// The bare key in square brackets: `[meal]`.
    Bracketed,
    /// A fixed replacement string.
    Text(String),
}

impl FallbackStyle {
    fn render(&self, kind: PlaceholderKind, key: &str) -> String {
        match self {
            Self::Verbatim => kind.token(key),
            Self::Bracketed => format!("[{}]", key),
            Self::Text(text) => text.clone(),
        }
    }
}

/// A placeholder that had no value in the render context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderMiss {
    pub kind: PlaceholderKind,
    pub key: String,
}

impl PlaceholderMiss {
    /// The token as it appeared in the template.
    pub fn token(&self) -> String {
        self.kind.token(&self.key)
    }
}

/// Output of a resolve: the text plus any placeholders that fell back.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub text: String,
    pub misses: Vec<PlaceholderMiss>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty()
    }
}

/// Substitutes placeholders using a configured fallback.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    fallback: FallbackStyle,
}

impl Resolver {
    pub fn new(fallback: FallbackStyle) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &FallbackStyle {
        &self.fallback
    }

    /// Render a template against a context.
    ///
    /// Never fails: a missing key is replaced by the fallback and recorded
    /// in `misses`.
    pub fn resolve(&self, template: &LineTemplate, ctx: &RenderContext) -> Resolution {
        let mut text = String::with_capacity(template.raw().len());
        let mut misses = Vec::new();

        for segment in template.segments() {
            let (kind, key) = match segment {
                TemplateSegment::Literal(s) => {
                    text.push_str(s);
                    continue;
                }
                TemplateSegment::Named(key) => (PlaceholderKind::Named, key),
                TemplateSegment::Tagged(key) => (PlaceholderKind::Tagged, key),
            };

            match ctx.lookup(kind, key) {
                Some(value) => text.push_str(value),
                None => {
                    tracing::warn!(
                        placeholder = %kind.token(key),
                        template = template.raw(),
                        "no value for placeholder, using fallback"
                    );
                    text.push_str(&self.fallback.render(kind, key));
                    misses.push(PlaceholderMiss {
                        kind,
                        key: key.clone(),
                    });
                }
            }
        }

        Resolution { text, misses }
    }
}

/// Resolve with the default (verbatim) fallback.
pub fn resolve(template: &LineTemplate, ctx: &RenderContext) -> Resolution {
    Resolver::default().resolve(template, ctx)
}
