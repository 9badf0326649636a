//! Read-only top-N report over a [`DurableAggregate`].
//!
//! Short words are filtered here, at the read boundary, and never at commit
//! time: the durable aggregate keeps counting them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{Category, DurableAggregate};

/// Default number of entries shown per category.
pub const DEFAULT_TOP_N: usize = 10;

/// Default minimum word length (in characters) shown in the report.
pub const DEFAULT_MIN_WORD_LEN: usize = 3;

/// Report shaping options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub min_word_len: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_word_len: DEFAULT_MIN_WORD_LEN,
        }
    }
}

/// One `label: count` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub label: String,
    pub count: u64,
}

/// Top entries per category plus the total click count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub clicks: u64,
    pub keys: Vec<ReportEntry>,
    pub words: Vec<ReportEntry>,
    pub commands: Vec<ReportEntry>,
}

impl StatsReport {
    pub fn build(aggregate: &DurableAggregate, options: ReportOptions) -> Self {
        Self {
            clicks: aggregate.clicks,
            keys: top_entries(aggregate.get(Category::Keys), options.top_n, 0),
            words: top_entries(
                aggregate.get(Category::Words),
                options.top_n,
                options.min_word_len,
            ),
            commands: top_entries(aggregate.get(Category::Commands), options.top_n, 0),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Clicks: {}", self.clicks)?;
        for (title, entries) in [
            ("Top Keys", &self.keys),
            ("Top Words", &self.words),
            ("Top Commands", &self.commands),
        ] {
            writeln!(f)?;
            writeln!(f, "{title}:")?;
            for entry in entries {
                writeln!(f, "{}: {}", entry.label, entry.count)?;
            }
        }
        Ok(())
    }
}

/// Returns up to `n` entries by count descending.
///
/// Ties are broken by label ascending so the output is deterministic.
/// Labels shorter than `min_len` characters are skipped.
pub fn top_entries(map: &BTreeMap<String, u64>, n: usize, min_len: usize) -> Vec<ReportEntry> {
    let mut entries: Vec<(&String, &u64)> = map
        .iter()
        .filter(|(label, _)| label.chars().count() >= min_len)
        .collect();
    // `map` iterates in label order and the sort is stable.
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries
        .into_iter()
        .take(n)
        .map(|(label, count)| ReportEntry {
            label: label.clone(),
            count: *count,
        })
        .collect()
}
