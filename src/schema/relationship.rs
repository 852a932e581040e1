use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The affinity tier between the player and a speaker.
///
/// `Stranger < Indifferent < Friendly` form an escalation ladder. `Hostile`
/// sits outside it: it can be reached from any tier and never falls back
/// to another one when a voice has no hostile lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipState {
    Stranger,
    Indifferent,
    Friendly,
    Hostile,
}

impl RelationshipState {
    pub const ALL: [RelationshipState; 4] = [
        Self::Stranger,
        Self::Indifferent,
        Self::Friendly,
        Self::Hostile,
    ];

    /// The script literal for this state (e.g., "Friendly").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stranger => "Stranger",
            Self::Indifferent => "Indifferent",
            Self::Friendly => "Friendly",
            Self::Hostile => "Hostile",
        }
    }

    /// Position on the escalation ladder. `None` for `Hostile`.
    pub fn escalation_rank(&self) -> Option<u8> {
        match self {
            Self::Stranger => Some(0),
            Self::Indifferent => Some(1),
            Self::Friendly => Some(2),
            Self::Hostile => None,
        }
    }

    /// States to try, in order, when looking for lines for this state:
    /// the state itself, then every lower tier on the ladder.
    pub fn fallback_chain(&self) -> &'static [RelationshipState] {
        match self {
            Self::Friendly => &[Self::Friendly, Self::Indifferent, Self::Stranger],
            Self::Indifferent => &[Self::Indifferent, Self::Stranger],
            Self::Stranger => &[Self::Stranger],
            Self::Hostile => &[Self::Hostile],
        }
    }
}

impl fmt::Display for RelationshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four state literals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized relationship state '{0}'")]
pub struct UnknownState(pub String);

impl FromStr for RelationshipState {
    type Err = UnknownState;

    /// Exact, case-sensitive match against the script literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stranger" => Ok(Self::Stranger),
            "Indifferent" => Ok(Self::Indifferent),
            "Friendly" => Ok(Self::Friendly),
            "Hostile" => Ok(Self::Hostile),
            other => Err(UnknownState(other.to_string())),
        }
    }
}
