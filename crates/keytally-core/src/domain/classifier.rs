//! KeyEventClassifier: the per-event orchestration state machine.
//!
//! For each `(scan code, pressed)` event the classifier:
//!
//! 1. Resolves the [`SemanticKey`] under the current shift state.
//! 2. Routes it: characters go through the shortcut detector first and then
//!    either commit (sentence terminators) or append to the active word;
//!    boundary keys commit; delete removes the last character; caps-lock and
//!    the eight modifiers update the modifier state machine.
//! 3. On press, counts the key under its label in the per-key mapping.  This
//!    count is independent of the word and command counts.
//!
//! # Failure semantics
//!
//! An unmapped scan code or a failed shortcut re-resolution means the
//! static table does not cover the hardware.  Both are returned as
//! [`ClassifyError`] and must halt recording rather than guess.

use thiserror::Error;
use tracing::debug;

use super::modifiers::ModifierStateMachine;
use super::pending::PendingCounters;
use super::shortcut::ShortcutDetector;
use super::word::{is_sentence_terminator, WordSegmenter};
use crate::keymap::key::{SemanticKey, ShiftState};
use crate::keymap::table::ScanCodeTable;
use crate::store::Category;

/// Fatal classification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// The scan code has no entry for the active shift state.
    #[error("unmapped scan code 0x{code:02X} (shift state: {shift_state})")]
    UnmappedScanCode { code: u32, shift_state: ShiftState },

    /// A shifted shortcut key has no unshifted character glyph.
    #[error("no unshifted glyph for shortcut scan code 0x{code:02X}")]
    UnresolvedShortcutGlyph { code: u32 },
}

/// What a single key event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The resolved key.
    pub key: SemanticKey,
    /// The word committed by this event, if any.
    pub committed_word: Option<String>,
    /// The shortcut label recorded by this event, if any.
    pub shortcut: Option<String>,
}

/// Classifies keyboard events into pending key, word and command counts.
#[derive(Debug, Clone)]
pub struct KeyEventClassifier {
    table: &'static ScanCodeTable,
    modifiers: ModifierStateMachine,
    words: WordSegmenter,
    shortcuts: ShortcutDetector,
}

impl KeyEventClassifier {
    /// Creates a classifier over the shared US ANSI table.
    pub fn new() -> Self {
        Self::with_table(ScanCodeTable::shared())
    }

    pub fn with_table(table: &'static ScanCodeTable) -> Self {
        Self {
            table,
            modifiers: ModifierStateMachine::new(),
            words: WordSegmenter::new(),
            shortcuts: ShortcutDetector::new(),
        }
    }

    /// Classifies one keyboard event and records its increments in `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::UnmappedScanCode`] if `code` is not in the
    /// table and [`ClassifyError::UnresolvedShortcutGlyph`] if a shifted
    /// shortcut cannot be canonicalised.
    pub fn classify(
        &mut self,
        code: u32,
        pressed: bool,
        pending: &mut PendingCounters,
    ) -> Result<KeyOutcome, ClassifyError> {
        let shift_state = self.modifiers.shift_state();
        let key = self
            .table
            .lookup(code, shift_state)
            .ok_or(ClassifyError::UnmappedScanCode { code, shift_state })?;

        let mut outcome = KeyOutcome {
            key,
            committed_word: None,
            shortcut: None,
        };

        match key {
            SemanticKey::Character(c) => {
                if pressed {
                    let table = self.table;
                    let shortcut = self.shortcuts.detect(c, &self.modifiers, || {
                        match table.lookup(code, ShiftState::None) {
                            Some(SemanticKey::Character(base)) => Ok(base),
                            _ => Err(ClassifyError::UnresolvedShortcutGlyph { code }),
                        }
                    })?;
                    match shortcut {
                        Some(label) => {
                            let count = pending.increment(Category::Commands, &label);
                            debug!("{label}: {count}");
                            outcome.shortcut = Some(label);
                        }
                        None if is_sentence_terminator(c) => {
                            outcome.committed_word = self.words.commit(pending);
                        }
                        None => self.words.append(c),
                    }
                }
            }
            SemanticKey::Function(_) => {}
            SemanticKey::Space
            | SemanticKey::Return
            | SemanticKey::Tab
            | SemanticKey::Escape
            | SemanticKey::ArrowUp
            | SemanticKey::ArrowDown
            | SemanticKey::ArrowLeft
            | SemanticKey::ArrowRight => {
                if pressed {
                    outcome.committed_word = self.words.commit(pending);
                }
            }
            SemanticKey::Delete => {
                if pressed {
                    self.words.delete_last();
                }
            }
            SemanticKey::CapsLock | SemanticKey::Modifier(_) => {
                self.modifiers.apply(key, pressed);
            }
        }

        if pressed {
            pending.increment(Category::Keys, &key.label());
        }
        Ok(outcome)
    }

    /// Commits the active word as if a boundary key had been pressed.
    pub fn commit_word(&mut self, pending: &mut PendingCounters) -> Option<String> {
        self.words.commit(pending)
    }

    pub fn modifiers(&self) -> &ModifierStateMachine {
        &self.modifiers
    }

    pub fn shift_state(&self) -> ShiftState {
        self.modifiers.shift_state()
    }

    /// The characters typed since the last word boundary.
    pub fn active_word(&self) -> String {
        self.words.active()
    }
}

impl Default for KeyEventClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_H: u32 = 0x0B;
    const KEY_I: u32 = 0x0C;
    const KEY_C: u32 = 0x06;
    const DIGIT_1: u32 = 0x1E;
    const PERIOD: u32 = 0x37;
    const SPACE: u32 = 0x2C;
    const DELETE: u32 = 0x2A;
    const CAPS: u32 = 0x39;
    const F5: u32 = 0x3E;
    const LEFT_SHIFT: u32 = 0xE1;
    const LEFT_COMMAND: u32 = 0xE3;
    const LEFT_CONTROL: u32 = 0xE0;
    const KEY_A: u32 = 0x04;
    const KEY_T: u32 = 0x17;

    fn tap(c: &mut KeyEventClassifier, p: &mut PendingCounters, code: u32) {
        c.classify(code, true, p).expect("press");
        c.classify(code, false, p).expect("release");
    }

    #[test]
    fn test_unmapped_scan_code_is_fatal() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();

        let err = c.classify(0x46, true, &mut p).unwrap_err();

        assert_eq!(
            err,
            ClassifyError::UnmappedScanCode {
                code: 0x46,
                shift_state: ShiftState::None
            }
        );
        assert!(p.is_empty(), "a failed event must not count anything");
    }

    #[test]
    fn test_hi_period_commits_one_word() {
        // Arrange
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();

        // Act
        c.classify(LEFT_SHIFT, true, &mut p).unwrap();
        tap(&mut c, &mut p, KEY_H);
        c.classify(LEFT_SHIFT, false, &mut p).unwrap();
        tap(&mut c, &mut p, KEY_I);
        let outcome = c.classify(PERIOD, true, &mut p).unwrap();

        // Assert
        assert_eq!(outcome.committed_word.as_deref(), Some("hi"));
        assert_eq!(p.count(Category::Words, "hi"), 1);
        assert_eq!(p.count(Category::Keys, "d: H"), 1);
        assert_eq!(p.count(Category::Keys, "d: i"), 1);
        assert_eq!(p.count(Category::Keys, "d: ."), 1);
        assert_eq!(p.count(Category::Keys, "leftShift"), 1);
        assert!(p.commands.is_empty());
    }

    #[test]
    fn test_releases_never_count_keys() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        c.classify(KEY_H, false, &mut p).unwrap();
        c.classify(SPACE, false, &mut p).unwrap();
        assert!(p.keys.is_empty());
        assert!(c.active_word().is_empty());
    }

    #[test]
    fn test_delete_removes_last_character_without_committing() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, KEY_H);
        tap(&mut c, &mut p, KEY_I);
        tap(&mut c, &mut p, DELETE);

        assert_eq!(c.active_word(), "h");
        assert!(p.words.is_empty());
        assert_eq!(p.count(Category::Keys, "delete"), 1);
    }

    #[test]
    fn test_function_key_counts_but_never_commits() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, KEY_H);
        let outcome = c.classify(F5, true, &mut p).unwrap();

        assert_eq!(outcome.committed_word, None);
        assert_eq!(c.active_word(), "h");
        assert_eq!(p.count(Category::Keys, "f: 5"), 1);
    }

    #[test]
    fn test_shortcut_is_counted_and_suppresses_word_text() {
        // Arrange
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();

        // Act: ⌘C
        c.classify(LEFT_COMMAND, true, &mut p).unwrap();
        let outcome = c.classify(KEY_C, true, &mut p).unwrap();
        c.classify(KEY_C, false, &mut p).unwrap();
        c.classify(LEFT_COMMAND, false, &mut p).unwrap();
        tap(&mut c, &mut p, SPACE);

        // Assert
        assert_eq!(outcome.shortcut.as_deref(), Some("⌘C"));
        assert_eq!(p.count(Category::Commands, "⌘C"), 1);
        assert_eq!(p.count(Category::Keys, "d: c"), 1, "key count is independent");
        assert!(p.words.is_empty(), "shortcut characters never form words");
    }

    #[test]
    fn test_shifted_shortcut_uses_unshifted_digit() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        c.classify(LEFT_COMMAND, true, &mut p).unwrap();
        c.classify(LEFT_SHIFT, true, &mut p).unwrap();

        let outcome = c.classify(DIGIT_1, true, &mut p).unwrap();

        assert_eq!(outcome.key, SemanticKey::Character('!'));
        assert_eq!(outcome.shortcut.as_deref(), Some("⇧⌘1"));
        assert_eq!(p.count(Category::Commands, "⇧⌘1"), 1);
        assert_eq!(p.count(Category::Commands, "⇧⌘!"), 0);
    }

    #[test]
    fn test_caps_lock_changes_resolved_glyph() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, CAPS);

        let outcome = c.classify(KEY_H, true, &mut p).unwrap();

        assert_eq!(outcome.key, SemanticKey::Character('H'));
        assert_eq!(c.shift_state(), ShiftState::Caps);
        assert_eq!(p.count(Category::Keys, "capsLock"), 1);
    }

    #[test]
    fn test_caps_lock_does_not_shift_digits() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, CAPS);
        let outcome = c.classify(DIGIT_1, true, &mut p).unwrap();
        assert_eq!(outcome.key, SemanticKey::Character('1'));
    }

    #[test]
    fn test_explicit_commit_flushes_active_word() {
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, KEY_H);
        tap(&mut c, &mut p, KEY_I);

        assert_eq!(c.commit_word(&mut p).as_deref(), Some("hi"));
        assert!(c.active_word().is_empty());
    }

    #[test]
    fn test_every_boundary_code_commits_and_clears_the_word() {
        // Return, Escape, Tab, Space, arrows, keypad Enter, keypad period.
        let boundaries = [
            (0x28, "return"),
            (0x29, "escape"),
            (0x2B, "tab"),
            (0x2C, "space"),
            (0x4F, "rightArrow"),
            (0x50, "leftArrow"),
            (0x51, "downArrow"),
            (0x52, "upArrow"),
            (0x58, "return"),
            (0x63, "d: ."),
        ];
        for (code, label) in boundaries {
            // Arrange
            let mut c = KeyEventClassifier::new();
            let mut p = PendingCounters::new();
            for letter in [KEY_C, KEY_A, KEY_T] {
                tap(&mut c, &mut p, letter);
            }

            // Act
            let outcome = c.classify(code, true, &mut p).unwrap();
            c.classify(code, false, &mut p).unwrap();

            // Assert
            assert_eq!(outcome.committed_word.as_deref(), Some("cat"), "0x{code:02X}");
            assert_eq!(p.count(Category::Words, "cat"), 1, "0x{code:02X}");
            assert_eq!(p.count(Category::Keys, label), 1, "0x{code:02X}");
            assert!(c.active_word().is_empty(), "0x{code:02X} left a word behind");
        }
    }

    #[test]
    fn test_control_period_is_a_command_not_a_terminator() {
        // Arrange
        let mut c = KeyEventClassifier::new();
        let mut p = PendingCounters::new();
        tap(&mut c, &mut p, KEY_A);

        // Act
        c.classify(LEFT_CONTROL, true, &mut p).unwrap();
        let outcome = c.classify(PERIOD, true, &mut p).unwrap();
        c.classify(PERIOD, false, &mut p).unwrap();
        c.classify(LEFT_CONTROL, false, &mut p).unwrap();

        // Assert
        assert_eq!(outcome.shortcut.as_deref(), Some("⌃."));
        assert_eq!(outcome.committed_word, None);
        assert_eq!(p.count(Category::Commands, "⌃."), 1);
        assert!(p.words.is_empty());
        assert_eq!(c.active_word(), "a");
    }
}
