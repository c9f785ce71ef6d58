use std::process;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use owo_colors::{OwoColorize, Stream};
use rand::Rng;
use tracing::info;

use ulpbench::config::Config;
use ulpbench::display;
use ulpbench::logging;
use ulpbench::subjects;
use ulpbench::types::OutputFormat;

const DEFAULT_ITERATIONS: usize = 1_000_000;

#[derive(Parser)]
#[command(
    name = "ulpbench",
    version,
    about = "Time floating-point candidates and measure their ULP error against a high-precision reference"
)]
struct Cli {
    /// Number of operand tuples to evaluate per candidate
    #[arg(default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::resolve(|key| std::env::var(key).ok(), Config::default_path())?;
    logging::init(config.log.as_deref());

    let seed = match config.seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::rng().random();
            info!(seed, "no seed configured, drew a fresh one");
            seed
        }
    };

    let report = subjects::run_subject(config.subject, cli.iterations, seed);

    let output = match config.format {
        OutputFormat::Text => display::format_text(&report),
        OutputFormat::Json => display::format_json(&report, Utc::now()) + "\n",
    };
    print!("{}", output);

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!(
            "{} {}",
            "error:".if_supports_color(Stream::Stderr, |s| s.red()),
            err
        );
        process::exit(1);
    }
}
