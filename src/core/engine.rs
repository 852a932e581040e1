/// The dialogue engine: script loading, configuration and seeded speech.
///
/// Wires together the script parser, the voice registry, the selector and
/// the resolver behind a builder, and keeps the RNG so callers only have to
/// carry a `LineHistory` per speaker.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::{ConfigError, DialogueConfig};
use crate::core::context::LineHistory;
use crate::core::registry::{DialogueError, RenderedLine, VoiceRegistry};
use crate::core::resolver::{RenderContext, Resolver};
use crate::core::script::ScriptError;
use crate::schema::relationship::RelationshipState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level dialogue engine. Built via `DialogueEngine::builder()`.
pub struct DialogueEngine {
    registry: VoiceRegistry,
    config: DialogueConfig,
    load_errors: Vec<ScriptError>,
    rng: StdRng,
}

/// Builder for constructing a `DialogueEngine`.
#[derive(Default)]
pub struct DialogueEngineBuilder {
    script_paths: Vec<PathBuf>,
    scripts_dir: Option<PathBuf>,
    script_texts: Vec<String>,
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    deny_errors: bool,
    /// Directly provided config (for testing without files).
    config: Option<DialogueConfig>,
    /// Directly provided voices (for testing without files).
    registry: Option<VoiceRegistry>,
}

impl DialogueEngine {
    pub fn builder() -> DialogueEngineBuilder {
        DialogueEngineBuilder::default()
    }

    /// The shared, read-only voice registry.
    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    /// Section and record errors kept from a lenient load.
    pub fn load_errors(&self) -> &[ScriptError] {
        &self.load_errors
    }

    /// A fresh history sized by the configured window.
    pub fn new_history(&self) -> LineHistory {
        LineHistory::new(self.config.history_window)
    }

    /// Say one line for `voice`, avoiding lines in `history` and recording
    /// the line that was spoken.
    pub fn speak(
        &mut self,
        voice: &str,
        state: RelationshipState,
        tag: Option<&str>,
        ctx: &RenderContext,
        history: &mut LineHistory,
    ) -> Result<RenderedLine, DialogueError> {
        let exclude = history.exclusions();
        let line = self
            .registry
            .get_line(voice, state, tag, ctx, &exclude, &mut self.rng)?;
        history.record(line.line_id);
        Ok(line)
    }

    /// Reseed the engine's RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl DialogueEngineBuilder {
    /// Add a script asset file.
    pub fn script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_paths.push(path.into());
        self
    }

    /// Load every `.txt` file in a directory.
    pub fn scripts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.scripts_dir = Some(path.into());
        self
    }

    /// Add script text directly.
    pub fn script_text(mut self, text: impl Into<String>) -> Self {
        self.script_texts.push(text.into());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn with_config(mut self, config: DialogueConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Start from an existing registry (for testing without files).
    pub fn with_registry(mut self, registry: VoiceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fail the build on the first script error instead of loading the
    /// sections that parsed.
    pub fn deny_errors(mut self, deny: bool) -> Self {
        self.deny_errors = deny;
        self
    }

    /// Load config and scripts.
    ///
    /// A section that fails to parse is dropped and its error kept in
    /// `load_errors`; every other voice still loads. With
    /// [`deny_errors`](Self::deny_errors) the first error aborts the build.
    pub fn build(self) -> Result<DialogueEngine, EngineError> {
        let config = match (&self.config_path, self.config) {
            (Some(path), _) => DialogueConfig::load_from_ron(path)?,
            (None, Some(config)) => config,
            (None, None) => DialogueConfig::default(),
        };

        let resolver = Resolver::new(config.fallback.clone());
        let mut registry = self.registry.unwrap_or_default().with_resolver(resolver);

        let mut texts = Vec::new();
        for path in &self.script_paths {
            texts.push(std::fs::read_to_string(path)?);
        }
        if let Some(ref dir) = self.scripts_dir {
            for path in script_files_in(dir)? {
                texts.push(std::fs::read_to_string(&path)?);
            }
        }
        texts.extend(self.script_texts);

        let mut load_errors = Vec::new();
        for text in &texts {
            let errors = registry.load_script(text, config.parse_mode);
            if self.deny_errors {
                if let Some(first) = errors.into_iter().next() {
                    return Err(EngineError::Script(first));
                }
            } else {
                load_errors.extend(errors);
            }
        }

        let seed = self.seed.or(config.seed).unwrap_or(0);
        tracing::info!(
            voices = registry.len(),
            skipped = load_errors.len(),
            seed,
            "dialogue engine ready"
        );

        Ok(DialogueEngine {
            registry,
            config,
            load_errors,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

/// `.txt` files in `dir`, sorted so load order does not depend on the
/// filesystem.
fn script_files_in(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("txt") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::FallbackStyle;
    use crate::core::script::ParseMode;

    const SCRIPT: &str = "\
voice:villager1
Stranger||{time-greeting}.
Stranger||Are you new to {village}?
Stranger||Lovely weather.
Hostile||Stay away from me!
#
";

    fn build_test_engine(seed: u64) -> DialogueEngine {
        DialogueEngine::builder()
            .seed(seed)
            .script_text(SCRIPT)
            .build()
            .unwrap()
    }

    fn ctx() -> RenderContext {
        RenderContext::new()
            .with_time_of_day(9)
            .with_named("village", "Millbrook")
    }

    #[test]
    fn speak_produces_output() {
        let mut engine = build_test_engine(42);
        let mut history = engine.new_history();
        let line = engine
            .speak("villager1", RelationshipState::Stranger, None, &ctx(), &mut history)
            .unwrap();
        assert!(!line.text.is_empty());
        assert!(line.misses.is_empty());
        assert!(history.contains(line.line_id));
    }

    #[test]
    fn speak_deterministic_same_seed() {
        let run = |seed| {
            let mut engine = build_test_engine(seed);
            let mut history = engine.new_history();
            (0..6)
                .map(|_| {
                    engine
                        .speak("villager1", RelationshipState::Stranger, None, &ctx(), &mut history)
                        .unwrap()
                        .text
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn history_prevents_immediate_repeats() {
        let mut engine = build_test_engine(3);
        let mut history = LineHistory::new(2);
        let mut previous = Vec::new();
        for _ in 0..12 {
            let line = engine
                .speak("villager1", RelationshipState::Stranger, None, &ctx(), &mut history)
                .unwrap();
            // Three candidates, window of two: never one of the last two lines.
            for recent in previous.iter().rev().take(2) {
                assert_ne!(*recent, line.line_id);
            }
            previous.push(line.line_id);
        }
    }

    #[test]
    fn builder_seed_overrides_config_seed() {
        let config = DialogueConfig {
            seed: Some(1),
            ..DialogueConfig::default()
        };
        let texts = |engine: &mut DialogueEngine| {
            let mut history = LineHistory::new(0);
            (0..8)
                .map(|_| {
                    engine
                        .speak("villager1", RelationshipState::Stranger, None, &ctx(), &mut history)
                        .unwrap()
                        .text
                })
                .collect::<Vec<_>>()
        };
        let mut from_config = DialogueEngine::builder()
            .with_config(config.clone())
            .script_text(SCRIPT)
            .build()
            .unwrap();
        let mut explicit = DialogueEngine::builder()
            .with_config(config)
            .seed(1)
            .script_text(SCRIPT)
            .build()
            .unwrap();
        assert_eq!(texts(&mut from_config), texts(&mut explicit));
    }

    #[test]
    fn strict_build_drops_only_the_bad_section() {
        let mut engine = DialogueEngine::builder()
            .script_text("voice:good1\nStranger||Hello.\n#\nvoice:bad1\nAngry||Grr.\n#\n")
            .build()
            .unwrap();
        assert_eq!(engine.registry().len(), 1);
        assert!(!engine.registry().contains("bad1"));
        assert!(matches!(
            engine.load_errors(),
            [ScriptError::MalformedVoiceScript { line: 5, .. }]
        ));

        let mut history = engine.new_history();
        let line = engine
            .speak("good1", RelationshipState::Stranger, None, &RenderContext::new(), &mut history)
            .unwrap();
        assert_eq!(line.text, "Hello.");
    }

    #[test]
    fn deny_errors_fails_on_bad_section() {
        let result = DialogueEngine::builder()
            .deny_errors(true)
            .script_text("voice:good1\nStranger||Hello.\n#\nvoice:bad1\nAngry||Grr.\n#\n")
            .build();
        assert!(matches!(
            result,
            Err(EngineError::Script(ScriptError::MalformedVoiceScript { .. }))
        ));
    }

    #[test]
    fn lenient_build_keeps_errors() {
        let engine = DialogueEngine::builder()
            .with_config(DialogueConfig {
                parse_mode: ParseMode::Lenient,
                ..DialogueConfig::default()
            })
            .script_text("voice:bad1\nAngry||Grr.\nStranger||Hm.\n#\n")
            .script_text(SCRIPT)
            .build()
            .unwrap();
        assert_eq!(engine.load_errors().len(), 1);
        assert_eq!(engine.registry().len(), 2);
        assert_eq!(engine.registry().get("bad1").unwrap().len(), 1);
    }

    #[test]
    fn config_fallback_reaches_resolver() {
        let mut engine = DialogueEngine::builder()
            .with_config(DialogueConfig {
                fallback: FallbackStyle::Bracketed,
                ..DialogueConfig::default()
            })
            .script_text("voice:v\nStranger||Off to {village}.\n#\n")
            .build()
            .unwrap();
        let mut history = engine.new_history();
        let line = engine
            .speak("v", RelationshipState::Stranger, None, &RenderContext::new(), &mut history)
            .unwrap();
        assert_eq!(line.text, "Off to [village].");
        assert_eq!(line.misses.len(), 1);
    }

    #[test]
    fn loads_shipped_assets() {
        let engine = DialogueEngine::builder()
            .config_path("dialogue_data/config.ron")
            .scripts_dir("dialogue_data")
            .build()
            .unwrap();
        assert_eq!(engine.registry().len(), 5);
        assert_eq!(engine.new_history().window(), 3);
    }

    #[test]
    fn missing_script_file_is_io_error() {
        let result = DialogueEngine::builder()
            .script_path("dialogue_data/does_not_exist.txt")
            .build();
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
