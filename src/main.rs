//! Card Rebalance - command-line runner
//!
//! Loads a card pool from a JSON snapshot, applies a change document to it
//! and prints a run summary. The mutated pool can be written back out.

use std::path::PathBuf;

use card_rebalance::changes::{load_changes, load_configured_changes};
use card_rebalance::core::config::{BalanceConfig, ParseMode};
use card_rebalance::core::error::Result;
use card_rebalance::host::{HostSnapshot, MemoryHost};
use card_rebalance::run_changes;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Apply card balance changes to a snapshot of a card pool
#[derive(Parser, Debug)]
#[command(name = "card-rebalance")]
#[command(about = "Apply declarative card balance changes to an entity pool")]
struct Args {
    /// Change document; located from config when omitted
    #[arg(long)]
    changes: Option<PathBuf>,

    /// Host root searched for the change document
    #[arg(long)]
    host_root: Option<PathBuf>,

    /// JSON snapshot of the card pool
    #[arg(long)]
    entities: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject malformed literals and trailing content in the change document
    #[arg(long)]
    strict: bool,

    /// Write the mutated snapshot here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Summary format: text or json
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("card_rebalance=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BalanceConfig::load(path)?,
        None => BalanceConfig::default(),
    };
    if let Some(root) = args.host_root {
        config.host_root = Some(root);
    }
    if args.strict {
        config.parse_mode = ParseMode::Strict;
    }

    let snapshot = HostSnapshot::load(&args.entities)?;
    let mut host = MemoryHost::from_snapshot(&snapshot)?;
    tracing::info!(
        "Loaded {} records from {}",
        host.record_count(),
        args.entities.display()
    );

    let changes = match &args.changes {
        Some(path) => load_changes(path, config.parse_mode),
        None => load_configured_changes(&config),
    };

    let summary = run_changes(&mut host, &changes, &config);

    if let Some(output) = &args.output {
        host.to_snapshot().save(output)?;
        tracing::info!("Wrote mutated snapshot to {}", output.display());
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => println!("{}", summary),
    }

    Ok(())
}
