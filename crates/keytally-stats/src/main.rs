//! keytally-stats: read-only report over the durable statistics file.
//!
//! Prints the total click count and the top keys, words (shorter words
//! hidden), and shortcuts, or the same report as JSON with `--json`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use keytally_core::{AggregateStore, StatsReport};
use keytally_daemon::infrastructure::storage::config::{
    load_config, load_config_from, resolve_stats_path,
};
use keytally_daemon::infrastructure::storage::stats_file::JsonFileStore;

#[derive(Debug, Parser)]
#[command(
    name = "keytally-stats",
    about = "Shows the most used keys, words and shortcuts",
    version
)]
struct Cli {
    /// Config file (default: platform config directory).
    #[arg(long, env = "KEYTALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Statistics file, overriding `storage.stats_path`.
    #[arg(long, env = "KEYTALLY_STATS_PATH")]
    stats_path: Option<PathBuf>,

    /// Entries per category, overriding `stats.top_n`.
    #[arg(long)]
    top: Option<usize>,

    /// Shortest word shown, overriding `stats.min_word_len`.
    #[arg(long)]
    min_word_len: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--json` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    let stats_path = match cli.stats_path {
        Some(path) => path,
        None => resolve_stats_path(&config).context("failed to resolve statistics file")?,
    };
    let mut options = config.stats.report_options();
    if let Some(top) = cli.top {
        options.top_n = top;
    }
    if let Some(min_word_len) = cli.min_word_len {
        options.min_word_len = min_word_len;
    }

    debug!(stats = %stats_path.display(), ?options, "reading statistics");
    let aggregate = JsonFileStore::new(&stats_path)
        .load()
        .with_context(|| format!("failed to read {}", stats_path.display()))?;
    let report = StatsReport::build(&aggregate, options);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        print!("{report}");
    }
    Ok(())
}
