//! Storage infrastructure: configuration and statistics persistence.
//!
//! - `config` reads and writes the TOML configuration file from the
//!   platform-appropriate directory, with defaults on first run.
//! - `stats_file` is the JSON-file backed
//!   [`AggregateStore`](keytally_core::AggregateStore): every flush reads the
//!   durable aggregate, adds the pending deltas, and atomically replaces the
//!   file.

pub mod config;
pub mod stats_file;
