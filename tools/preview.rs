/// Preview — interactive shell for trying voice scripts.
///
/// Usage: preview --script <path> [--config <path>] [--seed <n>]
///
/// Commands:
///   voice <id>            — set active voice
///   state <State>         — set relationship state
///   tag <tag|none>        — set activity tag
///   set <key> <value...>  — set a named placeholder value
///   vocab <key> <value...>— set a tagged placeholder value
///   hour <0-23>           — fill {time-greeting} from the hour
///   seed <n>              — reseed the RNG and clear histories
///   say                   — speak one line
///   bulk <n>              — speak n lines with variety stats
///   voices                — list loaded voices
///   help                  — list commands
///   quit                  — exit

use npc_dialogue::core::config::DialogueConfig;
use npc_dialogue::core::context::LineHistory;
use npc_dialogue::core::engine::DialogueEngine;
use npc_dialogue::core::resolver::RenderContext;
use npc_dialogue::schema::relationship::RelationshipState;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut script_path = None;
    let mut config_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--script" if i + 1 < args.len() => {
                i += 1;
                script_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(script_path) = script_path else {
        eprintln!("--script is required");
        print_usage();
        std::process::exit(1);
    };

    let config = match config_path {
        Some(ref path) => match DialogueConfig::load_from_ron(std::path::Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR loading config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => DialogueConfig::default(),
    };

    let mut engine = match DialogueEngine::builder()
        .with_config(config)
        .script_path(&script_path)
        .seed(seed)
        .build()
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    for err in engine.load_errors() {
        eprintln!("WARNING: {}", err);
    }

    println!("Loaded {} voices from {}", engine.registry().len(), script_path);
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    // Session state
    let mut active_voice: Option<String> = engine
        .registry()
        .voice_ids()
        .first()
        .map(|id| id.to_string());
    let mut state = RelationshipState::Stranger;
    let mut tag: Option<String> = None;
    let mut ctx = RenderContext::new().with_time_of_day(9);
    let mut histories: HashMap<String, LineHistory> = HashMap::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!(
            "preview [{} {}{}]> ",
            active_voice.as_deref().unwrap_or("-"),
            state,
            tag.as_deref().map(|t| format!(" #{}", t)).unwrap_or_default()
        );
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "voices" => {
                for id in engine.registry().voice_ids() {
                    let def = engine.registry().get(id.as_str()).map(|d| d.len()).unwrap_or(0);
                    println!("  {} ({} lines)", id, def);
                }
            }
            "voice" => {
                if parts.len() < 2 {
                    println!("Usage: voice <id>");
                    println!("  Current: {}", active_voice.as_deref().unwrap_or("none"));
                    continue;
                }
                if engine.registry().contains(parts[1]) {
                    active_voice = Some(parts[1].to_string());
                    println!("Active voice set to '{}'", parts[1]);
                } else {
                    println!("Voice '{}' not found. Use 'voices' to list them.", parts[1]);
                }
            }
            "state" => {
                if parts.len() < 2 {
                    println!("Usage: state <Stranger|Indifferent|Friendly|Hostile>");
                    println!("  Current: {}", state);
                    continue;
                }
                match parts[1].parse::<RelationshipState>() {
                    Ok(s) => {
                        state = s;
                        println!("State set to {}", state);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "tag" => {
                if parts.len() < 2 || parts[1] == "none" {
                    tag = None;
                    println!("Activity tag cleared.");
                } else {
                    tag = Some(parts[1].to_string());
                    println!("Activity tag set to '{}'", parts[1]);
                }
            }
            "set" | "vocab" => {
                if parts.len() < 3 {
                    println!("Usage: {} <key> <value...>", cmd);
                    print_context(&ctx);
                    continue;
                }
                let value = parts[2..].join(" ");
                if cmd == "set" {
                    ctx.set_named(parts[1], value);
                } else {
                    ctx.set_tagged(parts[1], value);
                }
            }
            "hour" => {
                match parts.get(1).and_then(|h| h.parse::<u8>().ok()) {
                    Some(hour) if hour < 24 => {
                        ctx = ctx.with_time_of_day(hour);
                        println!("Hour set to {}", hour);
                    }
                    _ => println!("Usage: hour <0-23>"),
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Usage: seed <n>");
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        engine.reseed(s);
                        histories.clear();
                        println!("Seed set to {}", s);
                    }
                    Err(_) => println!("Invalid seed: {}", parts[1]),
                }
            }
            "say" => {
                let Some(ref voice) = active_voice else {
                    println!("No active voice. Use 'voice <id>' first.");
                    continue;
                };
                let history = histories
                    .entry(voice.clone())
                    .or_insert_with(|| engine.new_history());
                match engine.speak(voice, state, tag.as_deref(), &ctx, history) {
                    Ok(rendered) => {
                        println!("\n  \"{}\"\n", rendered.text);
                        println!(
                            "[Trace] line={} state={}{}",
                            rendered.line_id,
                            rendered.state,
                            if rendered.state != state { " (fallback)" } else { "" }
                        );
                        for miss in &rendered.misses {
                            println!("[Trace] missing placeholder {}", miss.token());
                        }
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "bulk" => {
                let count: usize = match parts.get(1).and_then(|n| n.parse().ok()) {
                    Some(n) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                let Some(ref voice) = active_voice else {
                    println!("No active voice. Use 'voice <id>' first.");
                    continue;
                };

                let mut history = engine.new_history();
                let mut spoken = Vec::new();
                let mut errors = 0;
                let mut misses = 0;
                for _ in 0..count {
                    match engine.speak(voice, state, tag.as_deref(), &ctx, &mut history) {
                        Ok(rendered) => {
                            misses += rendered.misses.len();
                            spoken.push(rendered);
                        }
                        Err(_) => errors += 1,
                    }
                }

                println!("\n=== Bulk: {} lines ({} errors) ===\n", spoken.len(), errors);
                let unique: HashSet<&str> = spoken.iter().map(|r| r.text.as_str()).collect();
                println!("Unique lines: {} / {}", unique.len(), spoken.len());
                let repeats = spoken
                    .windows(2)
                    .filter(|pair| pair[0].line_id == pair[1].line_id)
                    .count();
                println!("Back-to-back repeats: {}", repeats);
                println!("Placeholder misses: {}", misses);

                let mut per_line: HashMap<&str, u32> = HashMap::new();
                for r in &spoken {
                    *per_line.entry(r.text.as_str()).or_insert(0) += 1;
                }
                let mut freq: Vec<(&str, u32)> = per_line.into_iter().collect();
                freq.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
                println!("\nLine frequency:");
                for (text, n) in freq {
                    println!("  {:>4}  {}", n, text);
                }
                println!();
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn print_usage() {
    println!("Preview — interactive shell for trying voice scripts.");
    println!();
    println!("Usage: preview --script <path> [--config <path>] [--seed <n>]");
    println!();
    println!("  --script <path>  Dialogue script asset");
    println!("  --config <path>  RON engine config (optional)");
    println!("  --seed <n>       Initial RNG seed (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  voice <id>             Set active voice");
    println!("  voices                 List loaded voices");
    println!("  state <State>          Stranger, Indifferent, Friendly or Hostile");
    println!("  tag <tag|none>         Set or clear the activity tag");
    println!("  set <key> <value>      Set a {{named}} placeholder");
    println!("  vocab <key> <value>    Set a #tagged# placeholder");
    println!("  hour <0-23>            Fill {{time-greeting}} from the hour");
    println!("  seed <n>               Reseed the RNG");
    println!("  say                    Speak one line");
    println!("  bulk <n>               Speak n lines with variety statistics");
    println!("  help                   Show this help");
    println!("  quit                   Exit");
}

fn print_context(ctx: &RenderContext) {
    let mut named: Vec<_> = ctx.named.iter().collect();
    named.sort();
    let mut tagged: Vec<_> = ctx.tagged.iter().collect();
    tagged.sort();
    for (k, v) in named {
        println!("  {{{}}} = {}", k, v);
    }
    for (k, v) in tagged {
        println!("  #{}# = {}", k, v);
    }
}
