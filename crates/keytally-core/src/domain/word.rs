//! Word segmentation: turns typed characters into committed words.
//!
//! Characters are appended to an active buffer.  A boundary (space, return,
//! tab, escape, an arrow key, a sentence terminator, or a pointer click)
//! commits the buffer: it is lower-cased, stripped of non-letters at both
//! ends, and counted if anything is left.  The buffer is cleared on every
//! commit, whether or not a word came out of it.

use tracing::debug;

use super::pending::PendingCounters;
use crate::store::Category;

/// Returns `true` for characters that end a sentence (and therefore a word).
pub fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

/// Normalises a raw buffer into a countable word.
///
/// Lower-cases the text and trims every non-alphabetic character from both
/// ends.  Returns `None` if nothing alphabetic remains.
pub fn normalize(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphabetic());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Accumulates the word currently being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSegmenter {
    buffer: Vec<char>,
}

impl WordSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a printable, non-terminator character.
    pub fn append(&mut self, c: char) {
        self.buffer.push(c);
    }

    /// Removes the last buffered character (backspace).  No-op when empty.
    pub fn delete_last(&mut self) {
        self.buffer.pop();
    }

    /// Commits the active buffer into `pending` and clears it.
    ///
    /// Returns the committed word, or `None` if normalisation left nothing.
    pub fn commit(&mut self, pending: &mut PendingCounters) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw: String = self.buffer.drain(..).collect();
        let word = normalize(&raw)?;
        let count = pending.increment(Category::Words, &word);
        debug!("{word}: {count}");
        Some(word)
    }

    /// The characters typed since the last boundary.
    pub fn active(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_chars(seg: &mut WordSegmenter, text: &str) {
        for c in text.chars() {
            seg.append(c);
        }
    }

    #[test]
    fn test_commit_counts_word_and_clears_buffer() {
        // Arrange
        let mut seg = WordSegmenter::new();
        let mut pending = PendingCounters::new();
        type_chars(&mut seg, "hello");

        // Act
        let word = seg.commit(&mut pending);

        // Assert
        assert_eq!(word.as_deref(), Some("hello"));
        assert_eq!(pending.count(Category::Words, "hello"), 1);
        assert!(seg.is_empty());
    }

    #[test]
    fn test_second_commit_without_input_counts_nothing() {
        let mut seg = WordSegmenter::new();
        let mut pending = PendingCounters::new();
        type_chars(&mut seg, "hello");
        seg.commit(&mut pending);

        assert_eq!(seg.commit(&mut pending), None);
        assert_eq!(pending.words.len(), 1);
        assert_eq!(pending.count(Category::Words, "hello"), 1);
    }

    #[test]
    fn test_commit_lowercases() {
        let mut seg = WordSegmenter::new();
        let mut pending = PendingCounters::new();
        type_chars(&mut seg, "Hello");
        assert_eq!(seg.commit(&mut pending).as_deref(), Some("hello"));
    }

    #[test]
    fn test_commit_discards_buffer_without_letters() {
        let mut seg = WordSegmenter::new();
        let mut pending = PendingCounters::new();
        type_chars(&mut seg, "123,-");

        assert_eq!(seg.commit(&mut pending), None);
        assert!(pending.words.is_empty());
        assert!(seg.is_empty(), "buffer must clear even when nothing counted");
    }

    #[test]
    fn test_normalize_trims_non_letters_at_boundaries_only() {
        assert_eq!(normalize("\"quoted\",").as_deref(), Some("quoted"));
        assert_eq!(normalize("(don't)").as_deref(), Some("don't"));
        assert_eq!(normalize("e-mail").as_deref(), Some("e-mail"));
        assert_eq!(normalize("42nd").as_deref(), Some("nd"));
        assert_eq!(normalize("  "), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn test_delete_last_removes_one_character() {
        let mut seg = WordSegmenter::new();
        type_chars(&mut seg, "cart");
        seg.delete_last();
        assert_eq!(seg.active(), "car");
        assert_eq!(seg.len(), 3);
    }

    #[test]
    fn test_delete_last_on_empty_buffer_is_noop() {
        let mut seg = WordSegmenter::new();
        seg.delete_last();
        assert!(seg.is_empty());
    }

    #[test]
    fn test_sentence_terminators() {
        assert!(is_sentence_terminator('.'));
        assert!(is_sentence_terminator('?'));
        assert!(is_sentence_terminator('!'));
        assert!(!is_sentence_terminator(','));
        assert!(!is_sentence_terminator('a'));
    }
}
