//! In-memory increments waiting for the next flush.

use std::collections::HashMap;

use crate::store::Category;

/// Label → count mapping used for one pending category.
pub type CountMap = HashMap<String, u64>;

/// Pending per-key, per-word and per-command increments.
///
/// Entries are only ever created with a count of at least 1 and are removed
/// (never zeroed) by a successful flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingCounters {
    pub keys: CountMap,
    pub words: CountMap,
    pub commands: CountMap,
}

impl PendingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to `label` in `category` and returns the new pending count.
    pub fn increment(&mut self, category: Category, label: &str) -> u64 {
        let map = self.get_mut(category);
        // Avoid allocating a new String for labels that are already present.
        if let Some(count) = map.get_mut(label) {
            *count += 1;
            return *count;
        }
        map.insert(label.to_string(), 1);
        1
    }

    pub fn get(&self, category: Category) -> &CountMap {
        match category {
            Category::Keys => &self.keys,
            Category::Words => &self.words,
            Category::Commands => &self.commands,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CountMap {
        match category {
            Category::Keys => &mut self.keys,
            Category::Words => &mut self.words,
            Category::Commands => &mut self.commands,
        }
    }

    /// Pending count for `label`, or 0.
    pub fn count(&self, category: Category, label: &str) -> u64 {
        self.get(category).get(label).copied().unwrap_or(0)
    }

    /// Returns `true` when no category has pending entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.words.is_empty() && self.commands.is_empty()
    }
}
