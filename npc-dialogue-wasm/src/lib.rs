//! WASM bindings for npc-dialogue — powers the interactive web demo.

use std::collections::HashMap;
use wasm_bindgen::prelude::*;

use npc_dialogue::core::context::LineHistory;
use npc_dialogue::core::engine::DialogueEngine;
use npc_dialogue::core::resolver::RenderContext;
use npc_dialogue::schema::relationship::RelationshipState;

// ---------------------------------------------------------------------------
// Embedded demo data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const DIALOGUE: &str = include_str!("../../dialogue_data/dialogue.txt");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct SpeakInput {
    voice: String,
    state: String,
    tag: Option<String>,
    #[serde(default)]
    hour: Option<u8>,
    #[serde(default)]
    named: HashMap<String, String>,
    #[serde(default)]
    tagged: HashMap<String, String>,
}

#[derive(serde::Serialize)]
struct SpeakOutput {
    text: String,
    state: String,
    fallback: bool,
    line_id: usize,
    missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// DialogueDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct DialogueDemo {
    engine: DialogueEngine,
    histories: HashMap<String, LineHistory>,
}

#[wasm_bindgen]
impl DialogueDemo {
    /// Create a demo instance over the embedded script.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<DialogueDemo, JsError> {
        let engine = DialogueEngine::builder()
            .seed(seed)
            .script_text(data::DIALOGUE)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;

        Ok(DialogueDemo {
            engine,
            histories: HashMap::new(),
        })
    }

    /// Speak one line for a request described by a JSON string.
    ///
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "voice": "innkeeper1",
    ///   "state": "Friendly",
    ///   "tag": "working",
    ///   "hour": 19,
    ///   "named": { "player-name": "Ada", "inn-name": "The Sleeping Dog" },
    ///   "tagged": { "meal": "supper" }
    /// }
    /// ```
    pub fn speak(&mut self, request_json: &str) -> Result<String, JsError> {
        let input: SpeakInput = serde_json::from_str(request_json)
            .map_err(|e| JsError::new(&format!("Invalid request JSON: {e}")))?;
        let state: RelationshipState = input
            .state
            .parse()
            .map_err(|e| JsError::new(&format!("{e}")))?;

        let mut ctx = RenderContext {
            named: input.named,
            tagged: input.tagged,
        };
        if let Some(hour) = input.hour {
            ctx = ctx.with_time_of_day(hour);
        }

        let history = self
            .histories
            .entry(input.voice.clone())
            .or_insert_with(|| self.engine.new_history());
        let rendered = self
            .engine
            .speak(&input.voice, state, input.tag.as_deref(), &ctx, history)
            .map_err(|e| JsError::new(&format!("Dialogue error: {e}")))?;

        let output = SpeakOutput {
            text: rendered.text,
            state: rendered.state.to_string(),
            fallback: rendered.state != state,
            line_id: rendered.line_id.0,
            missing: rendered.misses.iter().map(|m| m.token()).collect(),
        };
        serde_json::to_string(&output)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Return JSON array of loaded voice ids.
    pub fn voices(&self) -> String {
        let ids: Vec<&str> = self
            .engine
            .registry()
            .voice_ids()
            .into_iter()
            .map(|id| id.as_str())
            .collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of relationship state names.
    pub fn states() -> String {
        let names: Vec<&str> = RelationshipState::ALL.iter().map(|s| s.as_str()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Reseed and forget every speaker's history.
    pub fn reset(&mut self, seed: u64) {
        self.engine.reseed(seed);
        self.histories.clear();
    }
}
