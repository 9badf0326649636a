//! Durable statistics and the merge-on-flush discipline.
//!
//! The durable aggregate holds four entries: `keys`, `words`, `commands`
//! (label → count) and a scalar `clicks`.  A flush never overwrites: for
//! every pending `(label, delta)` it stores `existing[label] + delta`.
//!
//! Backends implement [`AggregateStore`].  [`MemoryStore`] keeps everything
//! in memory (tests, benchmarks); the daemon provides a JSON-file store.

pub mod report;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the three label → count categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Keys,
    Words,
    Commands,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Keys, Category::Words, Category::Commands];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Keys => f.write_str("keys"),
            Category::Words => f.write_str("words"),
            Category::Commands => f.write_str("commands"),
        }
    }
}

/// Error type for aggregate store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not read or write the durable aggregate.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// The persisted statistics.
///
/// Missing fields deserialize to empty maps / zero so older files stay
/// readable when new categories are added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableAggregate {
    #[serde(default)]
    pub keys: BTreeMap<String, u64>,
    #[serde(default)]
    pub words: BTreeMap<String, u64>,
    #[serde(default)]
    pub commands: BTreeMap<String, u64>,
    #[serde(default)]
    pub clicks: u64,
}

impl DurableAggregate {
    pub fn get(&self, category: Category) -> &BTreeMap<String, u64> {
        match category {
            Category::Keys => &self.keys,
            Category::Words => &self.words,
            Category::Commands => &self.commands,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut BTreeMap<String, u64> {
        match category {
            Category::Keys => &mut self.keys,
            Category::Words => &mut self.words,
            Category::Commands => &mut self.commands,
        }
    }

    /// Adds every delta to the existing count, inserting missing labels.
    pub fn merge_counts(&mut self, category: Category, deltas: &HashMap<String, u64>) {
        let map = self.get_mut(category);
        for (label, delta) in deltas {
            let entry = map.entry(label.clone()).or_insert(0);
            *entry = entry.saturating_add(*delta);
        }
    }

    pub fn merge_clicks(&mut self, delta: u64) {
        self.clicks = self.clicks.saturating_add(delta);
    }

    /// Durable count for `label`, or 0.
    pub fn count(&self, category: Category, label: &str) -> u64 {
        self.get(category).get(label).copied().unwrap_or(0)
    }
}

/// A durable read-merge-write backend for the aggregate.
///
/// The store is the only component that touches the durable mapping.
/// Each call must either apply the whole delta or none of it, so the caller
/// can keep its pending counters on error and retry them later without
/// double-counting.
#[cfg_attr(test, mockall::automock)]
pub trait AggregateStore: Send {
    /// Adds `deltas` into the durable `category` mapping.
    fn merge_counts(
        &mut self,
        category: Category,
        deltas: &HashMap<String, u64>,
    ) -> Result<(), StoreError>;

    /// Adds `delta` to the durable click count.
    fn merge_clicks(&mut self, delta: u64) -> Result<(), StoreError>;

    /// Returns a copy of the current durable aggregate.
    fn load(&self) -> Result<DurableAggregate, StoreError>;
}

/// What a flush wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Distinct key labels merged.
    pub keys: usize,
    /// Distinct words merged.
    pub words: usize,
    /// Distinct shortcut labels merged.
    pub commands: usize,
    /// Clicks merged.
    pub clicks: u64,
}

impl FlushSummary {
    /// Returns `true` if the flush had nothing to write.
    pub fn is_empty(&self) -> bool {
        self.keys == 0 && self.words == 0 && self.commands == 0 && self.clicks == 0
    }

    pub(crate) fn record(&mut self, category: Category, entries: usize) {
        match category {
            Category::Keys => self.keys = entries,
            Category::Words => self.words = entries,
            Category::Commands => self.commands = entries,
        }
    }
}

/// In-memory [`AggregateStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    aggregate: DurableAggregate,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing aggregate (e.g. a previous run).
    pub fn with_aggregate(aggregate: DurableAggregate) -> Self {
        Self { aggregate }
    }

    pub fn aggregate(&self) -> &DurableAggregate {
        &self.aggregate
    }
}

impl AggregateStore for MemoryStore {
    fn merge_counts(
        &mut self,
        category: Category,
        deltas: &HashMap<String, u64>,
    ) -> Result<(), StoreError> {
        self.aggregate.merge_counts(category, deltas);
        Ok(())
    }

    fn merge_clicks(&mut self, delta: u64) -> Result<(), StoreError> {
        self.aggregate.merge_clicks(delta);
        Ok(())
    }

    fn load(&self) -> Result<DurableAggregate, StoreError> {
        Ok(self.aggregate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_merge_adds_to_existing_and_inserts_new() {
        // Arrange: durable words = {"the": 5}
        let mut agg = DurableAggregate::default();
        agg.merge_counts(Category::Words, &deltas(&[("the", 5)]));

        // Act: pending words = {"the": 2, "cat": 1}
        agg.merge_counts(Category::Words, &deltas(&[("the", 2), ("cat", 1)]));

        // Assert
        assert_eq!(agg.count(Category::Words, "the"), 7);
        assert_eq!(agg.count(Category::Words, "cat"), 1);
        assert_eq!(agg.words.len(), 2);
    }

    #[test]
    fn test_merge_empty_deltas_leaves_aggregate_unchanged() {
        let mut agg = DurableAggregate::default();
        agg.merge_counts(Category::Keys, &deltas(&[("d: a", 3)]));
        let before = agg.clone();

        agg.merge_counts(Category::Keys, &HashMap::new());

        assert_eq!(agg, before);
    }

    #[test]
    fn test_merge_clicks_accumulates() {
        let mut agg = DurableAggregate::default();
        agg.merge_clicks(4);
        agg.merge_clicks(6);
        assert_eq!(agg.clicks, 10);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let agg: DurableAggregate = serde_json::from_str(r#"{"clicks": 3}"#).unwrap();
        assert_eq!(agg.clicks, 3);
        assert!(agg.keys.is_empty());
        assert!(agg.words.is_empty());
        assert!(agg.commands.is_empty());
    }

    #[test]
    fn test_memory_store_load_reflects_merges() {
        let mut store = MemoryStore::new();
        store
            .merge_counts(Category::Commands, &deltas(&[("⌘C", 2)]))
            .unwrap();
        store.merge_clicks(1).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.count(Category::Commands, "⌘C"), 2);
        assert_eq!(loaded.clicks, 1);
    }

    #[test]
    fn test_category_display_matches_file_keys() {
        assert_eq!(Category::Keys.to_string(), "keys");
        assert_eq!(Category::Words.to_string(), "words");
        assert_eq!(Category::Commands.to_string(), "commands");
    }
}
