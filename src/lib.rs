//! NPC Dialogue — data-driven speech for game characters.
//!
//! Voice scripts list candidate lines per relationship state and activity.
//! The engine parses them once, picks a fitting line for a speaker's
//! current standing with the player, and fills in placeholders such as
//! `{player-name}` or `#meal#` from live context.

pub mod core;
pub mod schema;

pub use crate::core::config::DialogueConfig;
pub use crate::core::context::LineHistory;
pub use crate::core::engine::{DialogueEngine, EngineError};
pub use crate::core::registry::{DialogueError, RenderedLine, VoiceRegistry};
pub use crate::core::resolver::{FallbackStyle, PlaceholderMiss, RenderContext, Resolver};
pub use crate::core::script::{parse_script, parse_voice, ParseMode, ScriptError};
pub use crate::core::selector::{select, SelectionError, SelectionQuery};
pub use crate::core::voice::{LineRecord, VoiceDefinition};
pub use crate::schema::ids::{LineId, VoiceId};
pub use crate::schema::relationship::RelationshipState;
