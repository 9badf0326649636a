//! Semantic keys and shift states.
//!
//! A [`SemanticKey`] is what a physical key *means* once the current
//! [`ShiftState`] has been taken into account: the letter `a` and the letter
//! `A` come from the same scan code but are different semantic keys.
//!
//! # Key labels
//!
//! Every semantic key has a stable string label used as the key in the
//! per-key statistics mapping.  The labels are part of the on-disk format and
//! must not change:
//!
//! | Key                     | Label          |
//! |-------------------------|----------------|
//! | `Character('a')`        | `d: a`         |
//! | `Function(5)`           | `f: 5`         |
//! | `Return`                | `return`       |
//! | `ArrowLeft`             | `leftArrow`    |
//! | `Modifier(LeftCommand)` | `leftCommand`  |

use std::fmt;

/// The derived modifier context that decides which glyph a scan code maps to.
///
/// Never set directly: it is recomputed from the held modifier set after
/// every modifier change (see
/// [`ModifierStateMachine`](crate::domain::modifiers::ModifierStateMachine)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShiftState {
    /// No shift key held and caps-lock off.
    #[default]
    None,
    /// Left or right shift held (takes precedence over caps-lock).
    Shifted,
    /// Caps-lock toggled on and no shift key held.
    Caps,
}

impl fmt::Display for ShiftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftState::None => f.write_str("none"),
            ShiftState::Shifted => f.write_str("shifted"),
            ShiftState::Caps => f.write_str("caps"),
        }
    }
}

/// One of the eight positional modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    LeftControl,
    LeftShift,
    LeftOption,
    LeftCommand,
    RightControl,
    RightShift,
    RightOption,
    RightCommand,
}

impl Modifier {
    /// All eight modifiers in HID usage order (0xE0–0xE7).
    pub const ALL: [Modifier; 8] = [
        Modifier::LeftControl,
        Modifier::LeftShift,
        Modifier::LeftOption,
        Modifier::LeftCommand,
        Modifier::RightControl,
        Modifier::RightShift,
        Modifier::RightOption,
        Modifier::RightCommand,
    ];

    /// Returns the statistics label for this modifier.
    pub fn label(self) -> &'static str {
        match self {
            Modifier::LeftControl => "leftControl",
            Modifier::LeftShift => "leftShift",
            Modifier::LeftOption => "leftOption",
            Modifier::LeftCommand => "leftCommand",
            Modifier::RightControl => "rightControl",
            Modifier::RightShift => "rightShift",
            Modifier::RightOption => "rightOption",
            Modifier::RightCommand => "rightCommand",
        }
    }
}

/// The meaning of a key event after scan-code resolution.
///
/// Produced only by [`ScanCodeTable`](super::table::ScanCodeTable) lookups.
/// The enum is closed: adding a new hardware key class is a compile error in
/// every `match` that does not handle it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKey {
    /// A printable glyph (letter, digit, punctuation, keypad symbol).
    Character(char),
    /// Function key `F1`–`F12`.
    Function(u8),
    Space,
    Return,
    Tab,
    Escape,
    /// Backspace (labelled "delete" on the modeled keyboard).
    Delete,
    CapsLock,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Modifier(Modifier),
}

impl SemanticKey {
    /// Returns the per-key statistics label.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SemanticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticKey::Character(c) => write!(f, "d: {c}"),
            SemanticKey::Function(n) => write!(f, "f: {n}"),
            SemanticKey::Space => f.write_str("space"),
            SemanticKey::Return => f.write_str("return"),
            SemanticKey::Tab => f.write_str("tab"),
            SemanticKey::Escape => f.write_str("escape"),
            SemanticKey::Delete => f.write_str("delete"),
            SemanticKey::CapsLock => f.write_str("capsLock"),
            SemanticKey::ArrowUp => f.write_str("upArrow"),
            SemanticKey::ArrowDown => f.write_str("downArrow"),
            SemanticKey::ArrowLeft => f.write_str("leftArrow"),
            SemanticKey::ArrowRight => f.write_str("rightArrow"),
            SemanticKey::Modifier(m) => f.write_str(m.label()),
        }
    }
}
