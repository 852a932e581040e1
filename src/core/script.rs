/// Voice script parsing — line-oriented `State|[Tag]|Template` records.
///
/// A script asset holds any number of voice sections:
///
/// ```text
/// voice:smith1
/// Stranger||Hello there.
/// Indifferent|working|{time-greeting}, looking for some armour or weapons?
/// #
/// ```
///
/// `parse_voice` handles the body of one section; `parse_script` splits a
/// whole asset into sections and parses each one independently.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::template::LineTemplate;
use crate::core::voice::VoiceDefinition;
use crate::schema::ids::VoiceId;
use crate::schema::relationship::RelationshipState;

const SECTION_HEADER: &str = "voice:";
const SECTION_END: &str = "#";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("malformed voice script '{voice}' at line {line}: {reason} (in {text:?})")]
    MalformedVoiceScript {
        voice: VoiceId,
        line: usize,
        text: String,
        reason: String,
    },
    #[error("voice header at line {line} has no voice id")]
    MissingVoiceId { line: usize },
    #[error("line {line} is outside any voice section: {text:?}")]
    OrphanRecord { line: usize, text: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the parser reacts to a malformed record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    /// The first malformed record fails the whole section.
    #[default]
    Strict,
    /// Malformed records are skipped and reported; the rest of the section loads.
    Lenient,
}

/// A parsed section together with any records skipped in lenient mode.
#[derive(Debug)]
pub struct ParsedVoice {
    pub definition: VoiceDefinition,
    pub skipped: Vec<ScriptError>,
}

/// Result of loading a multi-section script asset.
#[derive(Debug, Default)]
pub struct ScriptLoad {
    pub voices: Vec<VoiceDefinition>,
    /// Sections that failed, header problems, orphan lines, and (in lenient
    /// mode) skipped records.
    pub errors: Vec<ScriptError>,
}

/// Parse one voice section in strict mode.
pub fn parse_voice(script_text: &str, voice_id: impl Into<VoiceId>) -> Result<VoiceDefinition, ScriptError> {
    parse_voice_with(script_text, voice_id, ParseMode::Strict).map(|parsed| parsed.definition)
}

/// Parse one voice section. Line numbers in errors start at 1.
pub fn parse_voice_with(
    script_text: &str,
    voice_id: impl Into<VoiceId>,
    mode: ParseMode,
) -> Result<ParsedVoice, ScriptError> {
    let numbered = script_text.lines().enumerate().map(|(i, line)| (i + 1, line));
    parse_section(numbered, voice_id.into(), mode)
}

fn parse_section<'a, I>(lines: I, voice: VoiceId, mode: ParseMode) -> Result<ParsedVoice, ScriptError>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (line_no, line) in lines {
        if is_separator(line) {
            continue;
        }
        match parse_record(line) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let err = ScriptError::MalformedVoiceScript {
                    voice: voice.clone(),
                    line: line_no,
                    text: line.to_string(),
                    reason,
                };
                match mode {
                    ParseMode::Strict => return Err(err),
                    ParseMode::Lenient => {
                        tracing::warn!(voice = %voice, line = line_no, "skipping malformed record: {}", err);
                        skipped.push(err);
                    }
                }
            }
        }
    }

    Ok(ParsedVoice {
        definition: VoiceDefinition::new(voice, records),
        skipped,
    })
}

/// Blank lines and rules made only of `#`, `-` or `=`.
fn is_separator(line: &str) -> bool {
    line.trim().chars().all(|c| matches!(c, '#' | '-' | '='))
}

fn parse_record(line: &str) -> Result<(RelationshipState, Option<String>, LineTemplate), String> {
    let mut fields = line.splitn(3, '|');
    let state_field = fields.next().unwrap_or_default();
    let (tag_field, template_field) = match (fields.next(), fields.next()) {
        (Some(template), None) => (None, template),
        (Some(tag), Some(template)) => (Some(tag), template),
        _ => return Err("expected State|[Tag]|Template".to_string()),
    };

    let state: RelationshipState = state_field
        .trim()
        .parse()
        .map_err(|e: crate::schema::relationship::UnknownState| e.to_string())?;

    let tag = tag_field
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    if template_field.trim().is_empty() {
        return Err("empty template".to_string());
    }

    Ok((state, tag, LineTemplate::parse(template_field)))
}

/// Parse a whole script asset.
///
/// Each section is parsed on its own: a section that fails is dropped and
/// its error collected, and the remaining sections still load.
pub fn parse_script(text: &str, mode: ParseMode) -> ScriptLoad {
    let mut load = ScriptLoad::default();
    let mut current: Option<(VoiceId, Vec<(usize, &str)>)> = None;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;

        if let Some(id) = line.trim_start().strip_prefix(SECTION_HEADER) {
            finish_section(current.take(), mode, &mut load);
            let id = id.trim();
            if id.is_empty() {
                load.errors.push(ScriptError::MissingVoiceId { line: line_no });
            } else {
                current = Some((VoiceId::new(id), Vec::new()));
            }
            continue;
        }

        if line.trim() == SECTION_END {
            finish_section(current.take(), mode, &mut load);
            continue;
        }

        match current.as_mut() {
            Some((_, body)) => body.push((line_no, line)),
            None if is_separator(line) => {}
            None => load.errors.push(ScriptError::OrphanRecord {
                line: line_no,
                text: line.to_string(),
            }),
        }
    }
    finish_section(current, mode, &mut load);

    tracing::info!(
        voices = load.voices.len(),
        errors = load.errors.len(),
        "parsed voice script"
    );
    load
}

fn finish_section(section: Option<(VoiceId, Vec<(usize, &str)>)>, mode: ParseMode, load: &mut ScriptLoad) {
    let Some((voice, body)) = section else {
        return;
    };
    match parse_section(body, voice.clone(), mode) {
        Ok(parsed) => {
            load.errors.extend(parsed.skipped);
            load.voices.push(parsed.definition);
        }
        Err(err) => {
            tracing::warn!(voice = %voice, "dropping voice section: {}", err);
            load.errors.push(err);
        }
    }
}

/// Read and parse a script asset from disk.
pub fn load_script_file(path: &Path, mode: ParseMode) -> Result<ScriptLoad, ScriptError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_script(&contents, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ids::LineId;

    const SMITH: &str = "\
Stranger||Hello there.
Indifferent|working|{time-greeting}, looking for some armour or weapons?
Friendly|Good to see you, {player-name}.
";

    #[test]
    fn parse_counts_and_fields() {
        let def = parse_voice(SMITH, "smith1").unwrap();
        assert_eq!(def.id().as_str(), "smith1");
        assert_eq!(def.len(), 3);

        let lines = def.lines();
        assert_eq!(lines[0].state, RelationshipState::Stranger);
        assert_eq!(lines[0].tag, None);
        assert_eq!(lines[0].template.raw(), "Hello there.");

        assert_eq!(lines[1].state, RelationshipState::Indifferent);
        assert_eq!(lines[1].tag.as_deref(), Some("working"));
        assert_eq!(
            lines[1].template.raw(),
            "{time-greeting}, looking for some armour or weapons?"
        );

        assert_eq!(lines[2].state, RelationshipState::Friendly);
        assert_eq!(lines[2].tag, None);
        assert_eq!(lines[2].id, LineId(2));
    }

    #[test]
    fn template_keeps_extra_pipes() {
        let def = parse_voice("Hostile||Leave | now.", "guard1").unwrap();
        assert_eq!(def.lines()[0].template.raw(), "Leave | now.");
    }

    #[test]
    fn separators_skipped() {
        let text = "\n---\nStranger||Hi.\n\n===\n#\nHostile||Go away.\n";
        let def = parse_voice(text, "villager1").unwrap();
        assert_eq!(def.len(), 2);
    }

    #[test]
    fn unknown_state_is_malformed() {
        let text = "Stranger||Hi.\nAngry||Grr.\n";
        let err = parse_voice(text, "mayor1").unwrap_err();
        match err {
            ScriptError::MalformedVoiceScript { voice, line, text, .. } => {
                assert_eq!(voice.as_str(), "mayor1");
                assert_eq!(line, 2);
                assert_eq!(text, "Angry||Grr.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn state_is_case_sensitive() {
        assert!(parse_voice("friendly||Hi.", "mayor1").is_err());
    }

    #[test]
    fn missing_pipe_and_empty_template_are_malformed() {
        assert!(parse_voice("Stranger Hello", "v").is_err());
        assert!(parse_voice("Stranger|working|   ", "v").is_err());
        assert!(parse_voice("Stranger|", "v").is_err());
    }

    #[test]
    fn lenient_skips_bad_records() {
        let text = "Stranger||Hi.\nAngry||Grr.\nno pipes here\nFriendly||Hello friend.\n";
        let parsed = parse_voice_with(text, "mayor1", ParseMode::Lenient).unwrap();
        assert_eq!(parsed.definition.len(), 2);
        assert_eq!(parsed.skipped.len(), 2);
        // Surviving records are renumbered densely.
        assert_eq!(parsed.definition.lines()[1].id, LineId(1));
    }

    #[test]
    fn script_sections() {
        let text = "\
voice:mayor1
Stranger||Welcome to {village}.
Friendly||Always a pleasure, {player-name}.
#
voice:smith1
Indifferent|working|{time-greeting}, looking for some armour or weapons?
#
";
        let load = parse_script(text, ParseMode::Strict);
        assert!(load.errors.is_empty(), "{:?}", load.errors);
        assert_eq!(load.voices.len(), 2);
        assert_eq!(load.voices[0].id().as_str(), "mayor1");
        assert_eq!(load.voices[0].len(), 2);
        assert_eq!(load.voices[1].id().as_str(), "smith1");
        assert_eq!(load.voices[1].len(), 1);
    }

    #[test]
    fn bad_section_does_not_block_others() {
        let text = "\
voice:mayor1
Stranger||Welcome.
Angry||Grr.
#
voice:smith1
Stranger||Hello.
#
";
        let load = parse_script(text, ParseMode::Strict);
        assert_eq!(load.voices.len(), 1);
        assert_eq!(load.voices[0].id().as_str(), "smith1");
        assert_eq!(load.errors.len(), 1);
        assert!(matches!(
            &load.errors[0],
            ScriptError::MalformedVoiceScript { voice, line: 3, .. } if voice.as_str() == "mayor1"
        ));
    }

    #[test]
    fn header_closes_previous_section_and_eof_closes_last() {
        let text = "voice:a\nStranger||One.\nvoice:b\nStranger||Two.";
        let load = parse_script(text, ParseMode::Strict);
        assert_eq!(load.voices.len(), 2);
        assert!(load.errors.is_empty());
    }

    #[test]
    fn orphans_and_empty_headers_reported() {
        let text = "Stranger||Nobody owns me.\nvoice:\nStranger||Still orphaned.\n";
        let load = parse_script(text, ParseMode::Strict);
        assert!(load.voices.is_empty());
        assert_eq!(load.errors.len(), 3);
        assert!(matches!(load.errors[0], ScriptError::OrphanRecord { line: 1, .. }));
        assert!(matches!(load.errors[1], ScriptError::MissingVoiceId { line: 2 }));
        assert!(matches!(load.errors[2], ScriptError::OrphanRecord { line: 3, .. }));
    }

    #[test]
    fn load_fixture_file() {
        let path = std::path::PathBuf::from("tests/fixtures/broken_dialogue.txt");
        let load = load_script_file(&path, ParseMode::Strict).unwrap();
        assert_eq!(load.voices.len(), 2);
        assert_eq!(load.errors.len(), 1);

        let lenient = load_script_file(&path, ParseMode::Lenient).unwrap();
        assert_eq!(lenient.voices.len(), 3);
        assert_eq!(lenient.errors.len(), 1);
    }
}
