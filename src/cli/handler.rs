use anyhow::{Context, Result};
use clap::Parser;
use destiny_engine::engine::montecarlo::DEFAULT_SAMPLES;
use destiny_engine::{analyze, analyze_distribution, AnalysisInput, Config};
use std::fs;
use std::io::Read;

#[derive(Parser)]
#[command(name = "destiny-engine")]
#[command(version = "0.1")]
#[command(about = "Deterministic destiny-physics graph engine", long_about = None)]
pub struct Cli {
    /// Chart input document (JSON); pass '-' to read stdin.
    pub input: String,

    /// Optional config overlay (JSON); unspecified fields keep defaults.
    #[arg(long)]
    pub config: Option<String>,

    /// Emit percentile distributions instead of a point analysis.
    #[arg(long)]
    pub distribution: bool,

    /// Monte-Carlo seed (distribution mode only).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Monte-Carlo sample count (distribution mode only).
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// Compact JSON output.
    #[arg(long)]
    pub compact: bool,
}

pub fn handle_cli() -> Result<()> {
    let cli = Cli::parse();

    let raw = if cli.input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read chart from stdin")?;
        buf
    } else {
        fs::read_to_string(&cli.input)
            .with_context(|| format!("Failed to read chart file {}", cli.input))?
    };
    let input: AnalysisInput =
        serde_json::from_str(&raw).context("Failed to parse chart input")?;

    let config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_json::from_str(&raw).context("Failed to parse config overlay")?
        }
        None => Config::default(),
    };

    let rendered = if cli.distribution {
        let summary = analyze_distribution(&input, &config, cli.seed, cli.samples)?;
        to_json(&summary, cli.compact)?
    } else {
        let analysis = analyze(&input, &config)?;
        to_json(&analysis, cli.compact)?
    };

    println!("{rendered}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    let s = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(s)
}
