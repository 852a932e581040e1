/// Voice definitions — the parsed, immutable line sets for one speaker archetype.
use serde::{Deserialize, Serialize};

use crate::core::template::LineTemplate;
use crate::schema::ids::{LineId, VoiceId};
use crate::schema::relationship::RelationshipState;

/// One candidate line of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub id: LineId,
    pub state: RelationshipState,
    /// Activity the line is restricted to. `None` matches any activity.
    pub tag: Option<String>,
    pub template: LineTemplate,
}

impl LineRecord {
    /// Whether this line may be spoken during `activity`.
    ///
    /// Untagged lines match any activity. Tagged lines match only an equal
    /// activity, so they are never picked for an untagged query.
    pub fn matches_tag(&self, activity: Option<&str>) -> bool {
        match &self.tag {
            None => true,
            Some(tag) => activity == Some(tag.as_str()),
        }
    }
}

/// All lines for a voice, in script order.
///
/// Built once by the script parser and never mutated afterwards, so a
/// definition can be shared freely between threads. Only `new` builds one,
/// which keeps every `LineId` equal to its record's position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceDefinition {
    id: VoiceId,
    lines: Vec<LineRecord>,
}

impl VoiceDefinition {
    /// Assemble a definition from `(state, tag, template)` triples.
    /// Line ids are assigned in order.
    pub fn new<I>(id: VoiceId, lines: I) -> Self
    where
        I: IntoIterator<Item = (RelationshipState, Option<String>, LineTemplate)>,
    {
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, (state, tag, template))| LineRecord {
                id: LineId(i),
                state,
                tag,
                template,
            })
            .collect();
        Self { id, lines }
    }

    pub fn id(&self) -> &VoiceId {
        &self.id
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&LineRecord> {
        self.lines.get(id.0).filter(|line| line.id == id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// States with at least one line, in `RelationshipState::ALL` order.
    pub fn states(&self) -> Vec<RelationshipState> {
        RelationshipState::ALL
            .into_iter()
            .filter(|state| self.lines.iter().any(|line| line.state == *state))
            .collect()
    }

    /// Lines for exactly `state` that match `activity`, without fallback.
    pub fn candidates<'a, 'b>(
        &'a self,
        state: RelationshipState,
        activity: Option<&'b str>,
    ) -> impl Iterator<Item = &'a LineRecord> + 'b
    where
        'a: 'b,
    {
        self.lines
            .iter()
            .filter(move |line| line.state == state && line.matches_tag(activity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shopkeeper() -> VoiceDefinition {
        VoiceDefinition::new(
            VoiceId::new("shopkeeper1"),
            vec![
                (
                    RelationshipState::Stranger,
                    None,
                    LineTemplate::parse("Welcome, stranger."),
                ),
                (
                    RelationshipState::Friendly,
                    Some("working".to_string()),
                    LineTemplate::parse("Need more #goods#, {player-name}?"),
                ),
                (
                    RelationshipState::Friendly,
                    Some("working".to_string()),
                    LineTemplate::parse("Back again!"),
                ),
            ],
        )
    }

    #[test]
    fn ids_follow_insertion_order() {
        let def = shopkeeper();
        let ids: Vec<_> = def.lines().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LineId(0), LineId(1), LineId(2)]);
        assert_eq!(def.line(LineId(1)).unwrap().template.raw(), "Need more #goods#, {player-name}?");
        assert!(def.line(LineId(9)).is_none());
    }

    #[test]
    fn tag_rule() {
        let def = shopkeeper();
        let untagged = &def.lines()[0];
        let tagged = &def.lines()[1];
        assert!(untagged.matches_tag(None));
        assert!(untagged.matches_tag(Some("working")));
        assert!(tagged.matches_tag(Some("working")));
        assert!(!tagged.matches_tag(None));
        assert!(!tagged.matches_tag(Some("Working")));
    }

    #[test]
    fn candidates_are_exact_state() {
        let def = shopkeeper();
        assert_eq!(def.candidates(RelationshipState::Friendly, Some("working")).count(), 2);
        assert_eq!(def.candidates(RelationshipState::Friendly, None).count(), 0);
        assert_eq!(def.candidates(RelationshipState::Indifferent, Some("working")).count(), 0);
    }

    #[test]
    fn states_covered() {
        assert_eq!(
            shopkeeper().states(),
            vec![RelationshipState::Stranger, RelationshipState::Friendly]
        );
    }

    #[test]
    fn serializes_to_ron() {
        let def = shopkeeper();
        let serialized = ron::to_string(&def).unwrap();
        assert!(serialized.contains("shopkeeper1"));
        assert!(serialized.contains("Need more #goods#, {player-name}?"));
    }

    #[test]
    fn line_lookup_returns_record_with_that_id() {
        let def = shopkeeper();
        for record in def.lines() {
            assert_eq!(def.line(record.id).unwrap().id, record.id);
        }
    }
}
