/// Voice registry — loaded voice definitions and the one-call line lookup.
use rand::Rng;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::resolver::{PlaceholderMiss, RenderContext, Resolver};
use crate::core::script::{self, ParseMode, ScriptError};
use crate::core::selector::{self, SelectionError, SelectionQuery};
use crate::core::voice::{LineRecord, VoiceDefinition};
use crate::schema::ids::{LineId, VoiceId};
use crate::schema::relationship::RelationshipState;

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("unknown voice: {0}")]
    UnknownVoice(VoiceId),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// A finished line of speech.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub voice: VoiceId,
    pub line_id: LineId,
    /// State of the chosen line. Lower than the requested state when the
    /// selector had to fall back.
    pub state: RelationshipState,
    pub text: String,
    /// Placeholders that had no value and were replaced by the fallback.
    pub misses: Vec<PlaceholderMiss>,
}

/// All loaded voices, keyed by id.
///
/// Read-only once loaded: `get_line` takes `&self`, so a registry can be
/// shared across threads with each caller bringing its own RNG and history.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    voices: HashMap<VoiceId, VoiceDefinition>,
    resolver: Resolver,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Add a voice. A voice with the same id is replaced.
    pub fn register(&mut self, definition: VoiceDefinition) {
        let id = definition.id().clone();
        if self.voices.insert(id.clone(), definition).is_some() {
            tracing::warn!(voice = %id, "voice registered twice, keeping the later definition");
        }
    }

    /// Parse a script asset and register every section that loads.
    /// Returns the errors for sections (or records) that did not.
    pub fn load_script(&mut self, text: &str, mode: ParseMode) -> Vec<ScriptError> {
        let load = script::parse_script(text, mode);
        for voice in load.voices {
            self.register(voice);
        }
        load.errors
    }

    /// Like [`load_script`](Self::load_script), reading from a file.
    pub fn load_from_file(&mut self, path: &Path, mode: ParseMode) -> Result<Vec<ScriptError>, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(self.load_script(&contents, mode))
    }

    pub fn get(&self, id: &str) -> Option<&VoiceDefinition> {
        self.voices.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.voices.contains_key(id)
    }

    /// Voice ids in sorted order.
    pub fn voice_ids(&self) -> Vec<&VoiceId> {
        let mut ids: Vec<_> = self.voices.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Select a line record for a voice without rendering it.
    pub fn select<R>(&self, voice: &str, query: &SelectionQuery<'_>, rng: &mut R) -> Result<&LineRecord, DialogueError>
    where
        R: Rng + ?Sized,
    {
        let definition = self
            .voices
            .get(voice)
            .ok_or_else(|| DialogueError::UnknownVoice(VoiceId::new(voice)))?;
        Ok(selector::select(definition, query, rng)?)
    }

    /// Pick and render one line for `voice`.
    ///
    /// `exclude` holds the caller's recently spoken lines for this voice.
    pub fn get_line<R>(
        &self,
        voice: &str,
        state: RelationshipState,
        tag: Option<&str>,
        ctx: &RenderContext,
        exclude: &FxHashSet<LineId>,
        rng: &mut R,
    ) -> Result<RenderedLine, DialogueError>
    where
        R: Rng + ?Sized,
    {
        let query = SelectionQuery::new(state).tag(tag).exclude(exclude);
        let line = self.select(voice, &query, rng)?;
        let resolution = self.resolver.resolve(&line.template, ctx);

        Ok(RenderedLine {
            voice: VoiceId::new(voice),
            line_id: line.id,
            state: line.state,
            text: resolution.text,
            misses: resolution.misses,
        })
    }
}
