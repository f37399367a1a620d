use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use skillsim::batch::{self, BatchOptions, EnemyBehavior};
use skillsim::logging;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding an array of enemy behavior records.
    input: PathBuf,

    /// Summarize every enemy at this level instead of its own.
    #[arg(long)]
    level: Option<u32>,

    /// Summarize every level the behavior branches on.
    #[arg(long, conflicts_with = "level")]
    all_levels: bool,

    /// Only summarize these enemy ids (repeatable).
    #[arg(long = "enemy")]
    enemies: Vec<u32>,

    /// Debug filter to specify log topics (e.g., "interp,summary")
    /// Available topics: interp, summary, decode, batch
    #[arg(long)]
    debug_filter: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn load_enemies(args: &Args) -> Result<Vec<EnemyBehavior>, String> {
    let text = fs::read_to_string(&args.input)
        .map_err(|e| format!("Failed to read {}: {}", args.input.display(), e))?;
    let mut enemies: Vec<EnemyBehavior> = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse {}: {}", args.input.display(), e))?;
    if !args.enemies.is_empty() {
        enemies.retain(|enemy| args.enemies.contains(&enemy.enemy_id));
    }
    Ok(enemies)
}

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logger with debug filters if provided
    let log_level = logging::parse_level(&args.log_level);
    if let Err(e) = logging::init_logger(log_level, args.debug_filter.clone()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let enemies = match load_enemies(&args) {
        Ok(enemies) => enemies,
        Err(message) => {
            error!("{}", message);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} enemies from {}", enemies.len(), args.input.display());

    let options = BatchOptions {
        level_override: args.level,
        all_levels: args.all_levels,
    };
    let report = batch::summarize_batch(&enemies, &options);
    report.log_summary();

    let output = if args.pretty {
        serde_json::to_string_pretty(&report.summaries)
    } else {
        serde_json::to_string(&report.summaries)
    };
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to serialize summaries: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", output) {
        error!("Failed to write summaries: {}", e);
        return ExitCode::FAILURE;
    }

    if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
