/// Engine configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::resolver::FallbackStyle;
use crate::core::script::ParseMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

fn default_history_window() -> usize {
    3
}

/// Tunables for loading scripts and rendering lines.
///
/// ```ron
/// (
///     fallback: Bracketed,
///     history_window: 4,
///     parse_mode: Lenient,
///     seed: Some(7),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Text printed for placeholders with no value.
    #[serde(default)]
    pub fallback: FallbackStyle,
    /// How many recent lines each speaker avoids repeating.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default)]
    pub parse_mode: ParseMode,
    /// RNG seed. A seed set on the engine builder takes precedence.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackStyle::default(),
            history_window: default_history_window(),
            parse_mode: ParseMode::default(),
            seed: None,
        }
    }
}

impl DialogueConfig {
    pub fn load_from_ron(path: &Path) -> Result<DialogueConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<DialogueConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}
