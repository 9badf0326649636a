//! Keyboard shortcut detection.
//!
//! A character typed while Control, Option or Command is held is a shortcut.
//! Shift alone is not: it only changes the glyph.  Shortcut labels list the
//! held modifiers in a fixed order (`⌃⌥⇧⌘`) followed by the upper-cased
//! unshifted glyph, e.g. `⌘C`, `⇧⌘1`, `⌃⌥T`.

use super::classifier::ClassifyError;
use super::modifiers::ModifierStateMachine;
use crate::keymap::key::ShiftState;

pub const CONTROL_GLYPH: char = '⌃';
pub const OPTION_GLYPH: char = '⌥';
pub const SHIFT_GLYPH: char = '⇧';
pub const COMMAND_GLYPH: char = '⌘';

/// Builds shortcut labels from the current modifier state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutDetector;

impl ShortcutDetector {
    pub fn new() -> Self {
        Self
    }

    /// Returns the shortcut label for `character`, or `None` if no shortcut
    /// modifier is held.
    ///
    /// When the shift state is `Shifted`, `character` may be a shifted symbol
    /// such as `!`.  `resolve_unshifted` is then called to re-resolve the same
    /// scan code without shift so the label reads `⇧⌘1` rather than `⇧⌘!`.
    /// Under `None` and `Caps` the typed character is upper-cased as is, so a
    /// caps-lock shortcut on a symbol key keeps the symbol it produced.
    ///
    /// # Errors
    ///
    /// Propagates the error from `resolve_unshifted`; a shifted key that has
    /// no unshifted glyph means the scan-code table is incomplete.
    pub fn detect<F>(
        &self,
        character: char,
        modifiers: &ModifierStateMachine,
        resolve_unshifted: F,
    ) -> Result<Option<String>, ClassifyError>
    where
        F: FnOnce() -> Result<char, ClassifyError>,
    {
        let control = modifiers.is_control_held();
        let option = modifiers.is_option_held();
        let command = modifiers.is_command_held();
        if !control && !option && !command {
            return Ok(None);
        }

        let base = match modifiers.shift_state() {
            ShiftState::Shifted => resolve_unshifted()?,
            ShiftState::None | ShiftState::Caps => character,
        };

        let mut label = String::with_capacity(16);
        if control {
            label.push(CONTROL_GLYPH);
        }
        if option {
            label.push(OPTION_GLYPH);
        }
        if modifiers.is_shift_held() {
            label.push(SHIFT_GLYPH);
        }
        if command {
            label.push(COMMAND_GLYPH);
        }
        label.extend(base.to_uppercase());
        Ok(Some(label))
    }
}
