//! Cache simulator CLI.
//!
//! This binary is the single entry point for trace replays. It performs:
//! 1. **Config loading:** JSON from `--config`, or built-in defaults.
//! 2. **Replay:** Streams the trace once through every configured policy.
//! 3. **Reporting:** Human-readable stat sections or JSON for scripting.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use casim_core::config::Config;
use casim_core::parser::{TraceFormat, TraceReader};
use casim_core::sim::Simulation;
use casim_core::SimError;

#[derive(Parser, Debug)]
#[command(
    name = "casim",
    author,
    version,
    about = "Cost and latency aware cache replacement simulator",
    long_about = "Replay an access trace against latency-aware replacement policies.\n\nConfiguration is JSON-first (see --config); the CLI uses built-in defaults otherwise.\n\nExamples:\n  casim run -t traces/dns.txt -f dns\n  casim run -t traces/storage.lat -f latency --config sweep.json --json\n  casim run -t traces/mem.txt -f address-penalties --sections summary penalties"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a single trace file.
    Run {
        /// Trace file to replay.
        #[arg(short, long)]
        trace: PathBuf,

        /// Trace format: dns, latency, or address-penalties.
        #[arg(short, long)]
        format: String,

        /// JSON configuration file (defaults apply when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stat sections to print (summary, penalties, admission,
        /// accuracy). Prints everything when omitted.
        #[arg(long, num_args = 1..)]
        sections: Vec<String>,

        /// Emit machine-readable JSON summaries instead of sections.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            trace,
            format,
            config,
            sections,
            json,
        } => cmd_run(trace, &format, config, &sections, json),
    };

    if let Err(err) = result {
        eprintln!("casim: {err}");
        process::exit(1);
    }
}

/// Loads the config, replays the trace, and prints the reports.
fn cmd_run(
    trace: PathBuf,
    format: &str,
    config_path: Option<PathBuf>,
    sections: &[String],
    json: bool,
) -> Result<(), SimError> {
    let format: TraceFormat = format.parse()?;
    let config = load_config(config_path)?;

    let mut simulation = Simulation::new(&config)?;
    let reader = TraceReader::new(trace, format);
    simulation.run(&reader)?;

    if json {
        let summaries: Vec<_> = simulation.stats().map(|stats| stats.summary()).collect();
        let rendered = serde_json::to_string_pretty(&summaries)
            .map_err(|err| SimError::Config(format!("summary serialization failed: {err}")))?;
        println!("{rendered}");
    } else {
        for stats in simulation.stats() {
            stats.print_sections(sections);
        }
    }
    Ok(())
}

/// Reads a JSON config file, or falls back to the defaults.
fn load_config(path: Option<PathBuf>) -> Result<Config, SimError> {
    match path {
        None => Ok(Config::default()),
        Some(path) => {
            let text = fs::read_to_string(&path)?;
            let config = serde_json::from_str(&text)
                .map_err(|err| SimError::Config(format!("{}: {err}", path.display())))?;
            log::debug!("loaded configuration from {}", path.display());
            Ok(config)
        }
    }
}
