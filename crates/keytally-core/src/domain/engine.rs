//! StatsEngine: the classifier, the click counter and the pending counters
//! behind one owner.
//!
//! The engine is not shared between threads: whoever owns it serializes
//! event classification and flushing.  The daemon keeps it inside a single
//! task so a flush always sees a consistent snapshot of the pending counters.

use tracing::debug;

use super::classifier::{ClassifyError, KeyEventClassifier, KeyOutcome};
use super::clicks::ClickCounter;
use super::pending::PendingCounters;
use crate::store::{AggregateStore, Category, FlushSummary, StoreError};

/// Turns raw keyboard and pointer events into pending statistics.
#[derive(Debug, Clone, Default)]
pub struct StatsEngine {
    classifier: KeyEventClassifier,
    clicks: ClickCounter,
    pending: PendingCounters,
}

impl StatsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: KeyEventClassifier) -> Self {
        Self {
            classifier,
            clicks: ClickCounter::new(),
            pending: PendingCounters::new(),
        }
    }

    /// Classifies a keyboard event.
    ///
    /// # Errors
    ///
    /// Returns the classifier's fatal [`ClassifyError`].
    pub fn on_key(&mut self, code: u32, pressed: bool) -> Result<KeyOutcome, ClassifyError> {
        self.classifier.classify(code, pressed, &mut self.pending)
    }

    /// Handles a pointer button transition.
    ///
    /// A press counts one click and ends the active word (focus probably
    /// moved).  Releases are ignored.  Returns the committed word, if any.
    pub fn on_pointer(&mut self, pressed: bool) -> Option<String> {
        if !pressed {
            return None;
        }
        self.clicks.on_click();
        self.classifier.commit_word(&mut self.pending)
    }

    /// Merges all pending counts into `store` and clears them.
    ///
    /// Categories with nothing pending are skipped entirely.  A category is
    /// cleared only after the store accepted it, so a failed flush leaves the
    /// remaining deltas pending and a later flush applies each delta exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] reported by the store.
    pub fn flush<S>(&mut self, store: &mut S) -> Result<FlushSummary, StoreError>
    where
        S: AggregateStore + ?Sized,
    {
        let mut summary = FlushSummary::default();
        for category in Category::ALL {
            let map = self.pending.get_mut(category);
            if map.is_empty() {
                continue;
            }
            store.merge_counts(category, map)?;
            summary.record(category, map.len());
            map.clear();
        }
        summary.clicks = self.clicks.flush(store)?;
        if !summary.is_empty() {
            debug!(?summary, "flushed pending statistics");
        }
        Ok(summary)
    }

    pub fn pending(&self) -> &PendingCounters {
        &self.pending
    }

    pub fn pending_clicks(&self) -> u64 {
        self.clicks.pending()
    }

    pub fn classifier(&self) -> &KeyEventClassifier {
        &self.classifier
    }

    /// Returns `true` if a flush would write nothing.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.clicks.pending() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MockAggregateStore};

    const KEY_A: u32 = 0x04;
    const KEY_T: u32 = 0x17;
    const SPACE: u32 = 0x2C;

    fn tap(engine: &mut StatsEngine, code: u32) {
        engine.on_key(code, true).unwrap();
        engine.on_key(code, false).unwrap();
    }

    #[test]
    fn test_click_commits_active_word() {
        let mut engine = StatsEngine::new();
        tap(&mut engine, KEY_A);
        tap(&mut engine, KEY_T);

        let word = engine.on_pointer(true);

        assert_eq!(word.as_deref(), Some("at"));
        assert_eq!(engine.pending_clicks(), 1);
        assert_eq!(engine.pending().count(Category::Words, "at"), 1);
    }

    #[test]
    fn test_pointer_release_is_ignored() {
        let mut engine = StatsEngine::new();
        tap(&mut engine, KEY_A);
        assert_eq!(engine.on_pointer(false), None);
        assert_eq!(engine.pending_clicks(), 0);
        assert_eq!(engine.classifier().active_word(), "a");
    }

    #[test]
    fn test_flush_moves_everything_into_store() {
        // Arrange
        let mut engine = StatsEngine::new();
        let mut store = MemoryStore::new();
        tap(&mut engine, KEY_A);
        tap(&mut engine, KEY_T);
        tap(&mut engine, SPACE);
        engine.on_pointer(true);

        // Act
        let summary = engine.flush(&mut store).unwrap();

        // Assert
        assert_eq!(summary.words, 1);
        assert_eq!(summary.keys, 3);
        assert_eq!(summary.clicks, 1);
        assert!(engine.is_idle());
        assert_eq!(store.aggregate().count(Category::Words, "at"), 1);
        assert_eq!(store.aggregate().count(Category::Keys, "space"), 1);
    }

    #[test]
    fn test_second_flush_is_noop() {
        let mut engine = StatsEngine::new();
        let mut store = MemoryStore::new();
        tap(&mut engine, KEY_A);
        tap(&mut engine, SPACE);
        engine.flush(&mut store).unwrap();
        let after_first = store.clone();

        let summary = engine.flush(&mut store).unwrap();

        assert!(summary.is_empty());
        assert_eq!(store, after_first);
    }

    #[test]
    fn test_flush_skips_empty_categories() {
        // Arrange: only a key is pending; words, commands and clicks are empty.
        let mut engine = StatsEngine::new();
        engine.on_key(KEY_A, true).unwrap();
        let mut store = MockAggregateStore::new();
        store
            .expect_merge_counts()
            .withf(|category, deltas| *category == Category::Keys && deltas.len() == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_merge_clicks().never();

        // Act / Assert
        let summary = engine.flush(&mut store).unwrap();
        assert_eq!(summary.keys, 1);
    }

    #[test]
    fn test_failed_flush_keeps_unwritten_deltas() {
        // Arrange: keys succeed, words fail.
        let mut engine = StatsEngine::new();
        tap(&mut engine, KEY_A);
        tap(&mut engine, SPACE);
        let mut store = MockAggregateStore::new();
        store
            .expect_merge_counts()
            .withf(|category, _| *category == Category::Keys)
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_merge_counts()
            .withf(|category, _| *category == Category::Words)
            .times(1)
            .returning(|_, _| Err(StoreError::Backend("read-only".into())));

        // Act
        let result = engine.flush(&mut store);

        // Assert: keys were committed and cleared, the word is still pending.
        assert!(result.is_err());
        assert!(engine.pending().keys.is_empty());
        assert_eq!(engine.pending().count(Category::Words, "a"), 1);
    }

    #[test]
    fn test_flush_adds_to_previous_durable_counts() {
        let mut previous = crate::store::DurableAggregate::default();
        previous.words.insert("the".to_string(), 5);
        let mut store = MemoryStore::with_aggregate(previous);
        let mut engine = StatsEngine::new();
        for _ in 0..2 {
            tap(&mut engine, KEY_T);
            tap(&mut engine, 0x0B); // h
            tap(&mut engine, 0x08); // e
            tap(&mut engine, SPACE);
        }

        engine.flush(&mut store).unwrap();

        assert_eq!(store.aggregate().count(Category::Words, "the"), 7);
    }
}
