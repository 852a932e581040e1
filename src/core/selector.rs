/// Line selection — relationship fallback, activity matching and repeat avoidance.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::voice::{LineRecord, VoiceDefinition};
use crate::schema::ids::{LineId, VoiceId};
use crate::schema::relationship::RelationshipState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("voice '{voice}' has no line for state {state} (activity: {tag:?})")]
    NoLineAvailable {
        voice: VoiceId,
        state: RelationshipState,
        tag: Option<String>,
    },
}

/// The live constraints for one selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionQuery<'a> {
    pub state: RelationshipState,
    /// Current activity of the speaker, if any.
    pub tag: Option<&'a str>,
    /// Recently spoken lines to avoid when possible.
    pub exclude: Option<&'a FxHashSet<LineId>>,
}

impl<'a> SelectionQuery<'a> {
    pub fn new(state: RelationshipState) -> Self {
        Self {
            state,
            tag: None,
            exclude: None,
        }
    }

    pub fn tag(mut self, tag: Option<&'a str>) -> Self {
        self.tag = tag;
        self
    }

    pub fn exclude(mut self, exclude: &'a FxHashSet<LineId>) -> Self {
        self.exclude = Some(exclude);
        self
    }
}

/// Pick one line for the query.
///
/// The requested state is tried first, then each lower tier in
/// [`RelationshipState::fallback_chain`] order. The activity rule stays the
/// same at every tier. Excluded lines are dropped unless that would leave
/// nothing, in which case a repeat is spoken. The choice among the
/// remaining lines is uniform.
///
/// Stateless: the caller owns and updates its exclusion history.
pub fn select<'d, R>(
    def: &'d VoiceDefinition,
    query: &SelectionQuery<'_>,
    rng: &mut R,
) -> Result<&'d LineRecord, SelectionError>
where
    R: Rng + ?Sized,
{
    for &state in query.state.fallback_chain() {
        let eligible: Vec<&'d LineRecord> = def
            .lines()
            .iter()
            .filter(|line| line.state == state && line.matches_tag(query.tag))
            .collect();
        if eligible.is_empty() {
            continue;
        }

        if state != query.state {
            tracing::debug!(
                voice = %def.id(),
                requested = %query.state,
                used = %state,
                "falling back to lower relationship state"
            );
        }

        let fresh: Vec<&'d LineRecord> = match query.exclude {
            Some(exclude) => eligible
                .iter()
                .copied()
                .filter(|line| !exclude.contains(&line.id))
                .collect(),
            None => Vec::new(),
        };
        let pool = if fresh.is_empty() { &eligible } else { &fresh };

        if let Some(line) = pool.choose(&mut *rng) {
            return Ok(*line);
        }
    }

    Err(SelectionError::NoLineAvailable {
        voice: def.id().clone(),
        state: query.state,
        tag: query.tag.map(str::to_string),
    })
}
