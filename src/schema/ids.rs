use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Newtype wrapper for voice identifiers (e.g., `mayor1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoiceId(pub String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VoiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for VoiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifies a line record within its voice: the record's position in
/// script order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub usize);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
