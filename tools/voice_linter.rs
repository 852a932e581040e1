/// Voice Linter — validates dialogue script coverage and quality.
///
/// Usage: voice_linter <script> [--lenient]

use npc_dialogue::core::script::{load_script_file, ParseMode};
use npc_dialogue::core::template::PlaceholderKind;
use npc_dialogue::core::voice::VoiceDefinition;
use npc_dialogue::schema::relationship::RelationshipState;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: voice_linter <script> [--lenient]");
        process::exit(0);
    }

    let script_path = Path::new(&args[1]);
    let mode = if args[2..].iter().any(|a| a == "--lenient") {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    };

    let load = match load_script_file(script_path, mode) {
        Ok(load) => load,
        Err(e) => {
            eprintln!("ERROR: Failed to read script file: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} voices ({} lines)",
        load.voices.len(),
        load.voices.iter().map(|v| v.len()).sum::<usize>()
    );

    let mut errors: Vec<String> = load.errors.iter().map(|e| e.to_string()).collect();
    let mut warnings = Vec::new();
    lint_voices(&load.voices, &mut errors, &mut warnings);

    // Print report
    println!("\n=== Voice Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    print_placeholder_summary(&load.voices);

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_voices(voices: &[VoiceDefinition], errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let mut seen_ids = HashSet::new();

    for voice in voices {
        let id = voice.id();

        if !seen_ids.insert(id.clone()) {
            errors.push(format!(
                "Voice '{}' is defined more than once; only the last section is kept",
                id
            ));
        }

        if voice.is_empty() {
            warnings.push(format!("Voice '{}' has no lines", id));
            continue;
        }

        // Coverage: first meetings and hostility both need an answer
        if voice.candidates(RelationshipState::Stranger, None).next().is_none() {
            warnings.push(format!(
                "Voice '{}' has no untagged Stranger line; first meetings outside its activities get no reply",
                id
            ));
        }
        if voice.candidates(RelationshipState::Hostile, None).next().is_none() {
            warnings.push(format!("Voice '{}' has no untagged Hostile line", id));
        }

        // States whose lines are all tagged fall back when the speaker is idle
        for state in voice.states() {
            let total = voice.lines().iter().filter(|l| l.state == state).count();
            let untagged = voice.candidates(state, None).count();
            if untagged == 0 {
                warnings.push(format!(
                    "Voice '{}' has {} {} line(s), all tagged; untagged queries fall back",
                    id, total, state
                ));
            }
        }

        // Duplicate templates within a voice
        let mut templates = HashSet::new();
        for line in voice.lines() {
            if !templates.insert((line.state, line.tag.as_deref(), line.template.raw())) {
                warnings.push(format!(
                    "Voice '{}' line {} duplicates an earlier {} line: {:?}",
                    id,
                    line.id,
                    line.state,
                    line.template.raw()
                ));
            }
        }
    }
}

fn print_placeholder_summary(voices: &[VoiceDefinition]) {
    let mut named = BTreeSet::new();
    let mut tagged = BTreeSet::new();
    for voice in voices {
        for line in voice.lines() {
            for (kind, key) in line.template.placeholders() {
                match kind {
                    PlaceholderKind::Named => named.insert(key.to_string()),
                    PlaceholderKind::Tagged => tagged.insert(key.to_string()),
                };
            }
        }
    }

    println!("\nNamed placeholders used:");
    for key in &named {
        println!("  {{{}}}", key);
    }
    println!("Tagged placeholders used:");
    for key in &tagged {
        println!("  #{}#", key);
    }
}
