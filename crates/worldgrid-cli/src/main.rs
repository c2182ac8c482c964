use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use worldgrid_core::EngineConfig;

mod calibrate;
mod layout;

#[derive(Parser)]
#[command(name = "worldgrid", about = "Grid analysis and mine supply tools")]
struct Cli {
    /// JSON engine configuration. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exhaust a deposit under every supply selection and compare the number
    /// of extraction events with the advertised change.
    Supply {
        #[arg(long, default_value_t = 10_000)]
        amount: u32,
        #[arg(long, default_value_t = 4)]
        trials: u32,
    },
    /// Generate a height map, classify it into tiers, seed deposits on the top
    /// tier and let miners work it for a number of ticks.
    Layout {
        #[arg(long, default_value_t = 64)]
        width: u32,
        #[arg(long, default_value_t = 64)]
        height: u32,
        #[arg(long, default_value_t = 5)]
        tiers: usize,
        #[arg(long, default_value_t = 8)]
        deposit: u32,
        #[arg(long, default_value_t = 12)]
        miners: u32,
        #[arg(long, default_value_t = 200)]
        ticks: u32,
    },
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json_str(&text)
        .with_context(|| format!("loading config {}", path.display()))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Supply { amount, trials } => {
            let rows = calibrate::run(&config, amount, trials)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                calibrate::print_table(&rows);
            }
        }
        Command::Layout {
            width,
            height,
            tiers,
            deposit,
            miners,
            ticks,
        } => {
            let params = layout::LayoutParams {
                width,
                height,
                tiers,
                deposit,
                miners,
                ticks,
            };
            let report = layout::run(&config, &params)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                layout::print_summary(&report);
            }
        }
    }
    Ok(())
}
