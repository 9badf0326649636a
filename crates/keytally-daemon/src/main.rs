//! keytally recording daemon entry point.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, init tracing
//!  └─ ReplayInputSource      (reader thread, std mpsc)
//!       └─ forward_to_async  (forwarder thread → Tokio channel)
//!  └─ Recorder::run          (owns StatsEngine + JsonFileStore)
//!       ├─ input events
//!       ├─ periodic flush timer
//!       └─ FlushHandle       ← Ctrl-C / SIGTERM task
//! ```
//!
//! Input comes from a replay log (`--replay FILE`) or stdin (the default,
//! or `--replay -`).  One line per event, see
//! `infrastructure::input_capture::replay` for the format.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keytally_daemon::application::record_input::{FlushHandle, RecordInputUseCase, Recorder};
use keytally_daemon::infrastructure::input_capture::{
    forward_to_async, replay::ReplayInputSource, InputSource,
};
use keytally_daemon::infrastructure::storage::config::{
    load_config, load_config_from, resolve_stats_path,
};
use keytally_daemon::infrastructure::storage::stats_file::JsonFileStore;

/// Events buffered between the capture threads and the recorder task.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Command-line arguments.  Anything not given falls back to the config file.
#[derive(Debug, Parser)]
#[command(
    name = "keytally-daemon",
    about = "Records keystroke, word, shortcut and click statistics",
    version
)]
struct Cli {
    /// Config file (default: platform config directory).
    #[arg(long, env = "KEYTALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Statistics file, overriding `storage.stats_path`.
    #[arg(long, env = "KEYTALLY_STATS_PATH")]
    stats_path: Option<PathBuf>,

    /// Seconds between periodic flushes, overriding `daemon.flush_interval_secs`.
    #[arg(long, env = "KEYTALLY_FLUSH_INTERVAL")]
    flush_interval: Option<u64>,

    /// Event log to replay; `-` reads stdin.
    #[arg(long, default_value = "-")]
    replay: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level)),
        )
        .init();

    let stats_path = match cli.stats_path {
        Some(path) => path,
        None => resolve_stats_path(&config).context("failed to resolve statistics file")?,
    };
    let flush_interval =
        Duration::from_secs(cli.flush_interval.unwrap_or(config.daemon.flush_interval_secs));

    info!(
        stats = %stats_path.display(),
        flush_secs = flush_interval.as_secs(),
        "keytally daemon starting"
    );

    // ── Input ────────────────────────────────────────────────────────────────
    let source = ReplayInputSource::from_arg(&cli.replay);
    let raw_rx = source.start().context("failed to start input source")?;
    let events = forward_to_async(raw_rx, EVENT_CHANNEL_CAPACITY)
        .context("failed to start event forwarder")?;

    // ── Recorder ─────────────────────────────────────────────────────────────
    let store = JsonFileStore::new(stats_path);
    let (recorder, flush_handle) = Recorder::new(RecordInputUseCase::new(store), flush_interval);

    tokio::spawn(flush_on_shutdown_signal(flush_handle));

    let result = recorder.run(events).await;
    source.stop();

    match result {
        Ok(summary) => {
            info!(
                events = summary.events,
                flushes = summary.flushes,
                "keytally daemon stopped"
            );
            Ok(())
        }
        Err(e) => Err(e).context("recording failed"),
    }
}

/// Waits for Ctrl-C (or SIGTERM on Unix) and asks the recorder for a final
/// flush before it stops.
async fn flush_on_shutdown_signal(handle: FlushHandle) {
    wait_for_shutdown_signal().await;
    info!("shutdown signal received");
    if let Err(e) = handle.shutdown().await {
        warn!("shutdown flush failed: {e}");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    ctrl_c().await;
}

/// Resolves on Ctrl-C.  Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
