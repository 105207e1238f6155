// Blood on the Clocktower rules engine: command-line driver
//
// Logging goes to stderr and is controlled with RUST_LOG (default botc_engine=info).
// Game settings not given in a game file come from BOTC_DISCUSSION_TIMER, BOTC_DEAL
// and BOTC_SEED.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use botc_engine::setup::{analyze_distribution, parse_bag, validate_distribution, DistributionAnalysis};
use botc_engine::{Event, Game, GameConfig, Role, Script};

/// BotC rules engine
#[derive(Parser, Debug)]
#[command(name = "botc-engine")]
#[command(about = "Blood on the Clocktower rules engine and setup validator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a role distribution bag
    ValidateRoleDistribution {
        /// Role bag in format: {role1 role2 role3 ...}
        bag: String,

        /// Optional script to restrict roles (e.g., "trouble-brewing", "tb")
        #[arg(short, long)]
        script: Option<String>,
    },

    /// Print the first-night and other-night wake order
    NightOrder {
        #[arg(short, long)]
        script: Option<String>,
    },

    /// Replay a game file and print the resulting public state
    Play {
        /// JSON file with players, optional config and the events to apply
        game: PathBuf,

        /// Also print the storyteller's grimoire after the replay
        #[arg(long)]
        show_grimoire: bool,
    },
}

/// A recorded game: either `names` + `bag`, or a setup `grimoire`.
#[derive(Debug, Deserialize)]
struct GameFile {
    #[serde(default)]
    names: Vec<String>,
    bag: Option<String>,
    grimoire: Option<String>,
    config: Option<GameConfig>,
    #[serde(default)]
    events: Vec<Event>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botc_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ValidateRoleDistribution { bag, script } => {
            validate_role_distribution_cmd(&bag, script.as_deref())
        }
        Command::NightOrder { script } => night_order_cmd(script.as_deref()),
        Command::Play {
            game,
            show_grimoire,
        } => play_cmd(&game, show_grimoire),
    }
}

fn load_script(name: Option<&str>) -> Option<Script> {
    match name {
        None => Some(Script::default()),
        Some(name) => {
            let script = Script::from_name(name);
            if script.is_none() {
                eprintln!("Error: Unknown script '{}'", name);
                eprintln!("Available scripts: trouble-brewing (tb)");
            }
            script
        }
    }
}

fn explain_distribution_error(analysis: &DistributionAnalysis) {
    println!("INVALID: This role distribution violates BotC setup rules\n");
    println!("  Required distribution: {}", analysis.expected);
    println!("  Your bag contains: {}", analysis.actual);

    let problems = analysis.problems();
    if !problems.is_empty() {
        println!("\n  Problems:");
        for problem in problems {
            println!("    • {}", problem);
        }
    }
}

fn validate_role_distribution_cmd(bag_str: &str, script_name: Option<&str>) -> ExitCode {
    let script = match script_name {
        Some(_) => match load_script(script_name) {
            Some(s) => {
                println!("Using script: {}", s.title);
                Some(s)
            }
            None => return ExitCode::FAILURE,
        },
        None => None,
    };

    println!("Validating role distribution: {}", bag_str);

    let roles = match parse_bag(bag_str, script.as_ref()) {
        Ok(roles) => roles,
        Err(e) => {
            eprintln!("Error parsing bag: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("  Player count: {}", roles.len());
    println!("  Roles specified:");
    for role in &roles {
        println!("    - {} ({:?})", role.name(), role.team());
    }

    println!("\n=== RESULT ===");
    match validate_distribution(roles.len(), &roles) {
        Ok(distribution) => {
            println!(
                "✓ VALID: {} is a legal setup for {} players",
                distribution,
                roles.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            match analyze_distribution(roles.len(), &roles) {
                Ok(analysis) if !analysis.is_valid() => explain_distribution_error(&analysis),
                _ => println!("INVALID: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn night_order_cmd(script_name: Option<&str>) -> ExitCode {
    let Some(script) = load_script(script_name) else {
        return ExitCode::FAILURE;
    };

    println!("{}", script.title);
    for (title, first) in [("First night", true), ("Other nights", false)] {
        println!("\n  {}:", title);
        for (rank, role) in script.night_order(first) {
            println!("    {:>3}  {}", rank, role.name());
        }
    }
    ExitCode::SUCCESS
}

fn play_cmd(path: &Path, show_grimoire: bool) -> ExitCode {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let file: GameFile = match serde_json::from_str(&text) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error parsing {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = file.config.unwrap_or_else(GameConfig::from_env);
    let setup = match (&file.grimoire, &file.bag) {
        (Some(grimoire), _) => Game::from_grimoire(config, grimoire),
        (None, Some(bag)) => parse_bag(bag, None)
            .map_err(Into::into)
            .and_then(|pool: Vec<Role>| Game::configure(config, &file.names, &pool)),
        (None, None) => {
            eprintln!("Error: game file needs either \"grimoire\" or \"names\" and \"bag\"");
            return ExitCode::FAILURE;
        }
    };
    let mut game = match setup {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error setting up game: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for (i, event) in file.events.into_iter().enumerate() {
        let name = event.name();
        match game.apply(event) {
            Ok(reply) => println!("[{:>3}] {:<20} {}", i, name, to_json(&reply)),
            Err(e) => println!("[{:>3}] {:<20} rejected: {}", i, name, e),
        }
    }

    println!("\n=== ANNOUNCEMENTS ===");
    for announcement in game.announcements() {
        println!("  {}", to_json(announcement));
    }

    println!("\n=== PUBLIC STATE ===");
    println!("{}", to_json_pretty(&game.public_state()));

    if show_grimoire {
        println!("\n=== GRIMOIRE ===");
        println!("{}", game.grimoire());
    }
    ExitCode::SUCCESS
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

fn to_json_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
