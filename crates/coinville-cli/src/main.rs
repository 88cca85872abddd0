//! Coinville CLI - run one day of the city economy.
//!
//! ```bash
//! coinville                          # defaults
//! coinville --config coinville.toml  # tuned run
//! RUST_LOG=info coinville            # watch every transaction
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coinville_city::{City, Simulation};
use coinville_domain::SimConfig;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Coinville - a day in the life of a small closed economy
#[derive(Parser)]
#[command(name = "coinville")]
#[command(author = "Coinville Contributors")]
#[command(version)]
#[command(
    about = "Simulate one day of a city where spenders hire workers and everyone banks",
    long_about = "Coinville simulates a closed city economy for one configured day.\n\
        Spenders hire idle workers and pay them a salary, borrowing from a\n\
        bank when short of funds. Workers deposit their savings once they\n\
        pass a threshold. Banks serve a single client at a time. Money is\n\
        created only by loans and the city total is conserved end to end."
)]
struct Cli {
    /// Path to a TOML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the day duration, in milliseconds
    #[arg(long)]
    day_duration_ms: Option<u64>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the periodic city bulletin
    #[arg(short, long)]
    quiet: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<SimConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(ms) = cli.day_duration_ms {
        cfg.day_duration_ms = ms;
    }
    if let Some(seed) = cli.seed {
        cfg.rng_seed = seed;
    }
    if cli.quiet {
        cfg.report_interval_ms = 0;
    }
    Ok(cfg)
}

fn print_banner() {
    println!("{}", "--- Coinville ---".bold());
    println!("Spenders hire workers and pay salaries, borrowing when short.");
    println!("Workers bank their savings once they pass a threshold.");
    println!("Banks serve one client at a time, for loans and deposits.");
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    tracing::debug!(?cfg, "configuration resolved");

    print_banner();

    let city = Arc::new(City::build(&cfg)?);
    let opening = city.total_money();
    println!(
        "Total money in the city at day start: {}",
        format!("{opening}$").green().bold()
    );

    let report = Simulation::new(city, cfg).run_day().await;

    println!(
        "Total money in the city at day end:   {}",
        format!("{}$", report.closing).green().bold()
    );

    if !report.is_balanced() {
        anyhow::bail!(
            "money was created or destroyed: {}$ at start, {}$ at end",
            report.opening,
            report.closing
        );
    }
    Ok(())
}
