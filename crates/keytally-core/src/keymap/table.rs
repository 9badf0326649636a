//! USB HID usage ID → [`SemanticKey`] table for the US ANSI layout.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Shift-state entries
//!
//! Every code carries explicit `None` and `Shifted` entries.  Letters also
//! carry an explicit `Caps` entry (the upper-case letter).  Every other code
//! omits `Caps`, so [`ScanCodeTable::lookup`] falls back to its `None` glyph:
//! caps-lock turns `a` into `A` but leaves `1` as `1`, not `!`.
//!
//! # Immutability
//!
//! The table is built once (see [`ScanCodeTable::shared`]) and never mutated
//! afterwards, so concurrent readers need no synchronisation.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::key::{Modifier, SemanticKey, ShiftState};

// ── Static layout data ────────────────────────────────────────────────────────

/// Letters: HID 0x04–0x1D.
const LETTERS: [(u32, char); 26] = [
    (0x04, 'a'),
    (0x05, 'b'),
    (0x06, 'c'),
    (0x07, 'd'),
    (0x08, 'e'),
    (0x09, 'f'),
    (0x0A, 'g'),
    (0x0B, 'h'),
    (0x0C, 'i'),
    (0x0D, 'j'),
    (0x0E, 'k'),
    (0x0F, 'l'),
    (0x10, 'm'),
    (0x11, 'n'),
    (0x12, 'o'),
    (0x13, 'p'),
    (0x14, 'q'),
    (0x15, 'r'),
    (0x16, 's'),
    (0x17, 't'),
    (0x18, 'u'),
    (0x19, 'v'),
    (0x1A, 'w'),
    (0x1B, 'x'),
    (0x1C, 'y'),
    (0x1D, 'z'),
];

/// Main-row digits and punctuation: (code, unshifted, shifted).
const SYMBOL_PAIRS: [(u32, char, char); 21] = [
    (0x1E, '1', '!'),
    (0x1F, '2', '@'),
    (0x20, '3', '#'),
    (0x21, '4', '$'),
    (0x22, '5', '%'),
    (0x23, '6', '^'),
    (0x24, '7', '&'),
    (0x25, '8', '*'),
    (0x26, '9', '('),
    (0x27, '0', ')'),
    (0x2D, '-', '_'),
    (0x2E, '=', '+'),
    (0x2F, '[', '{'),
    (0x30, ']', '}'),
    (0x31, '\\', '|'),
    // 0x32 (Non-US # and ~) is not present on the ANSI layout.
    (0x33, ';', ':'),
    (0x34, '\'', '"'),
    (0x35, '`', '~'),
    (0x36, ',', '<'),
    (0x37, '.', '>'),
    (0x38, '/', '?'),
];

/// Keypad glyphs: identical under every shift state.
const KEYPAD: [(u32, char); 15] = [
    (0x54, '/'),
    (0x55, '*'),
    (0x56, '-'),
    (0x57, '+'),
    (0x59, '1'),
    (0x5A, '2'),
    (0x5B, '3'),
    (0x5C, '4'),
    (0x5D, '5'),
    (0x5E, '6'),
    (0x5F, '7'),
    (0x60, '8'),
    (0x61, '9'),
    (0x62, '0'),
    (0x63, '.'),
];

/// Non-printing keys: identical under every shift state.
const NAMED: [(u32, SemanticKey); 31] = [
    (0x28, SemanticKey::Return),
    (0x29, SemanticKey::Escape),
    (0x2A, SemanticKey::Delete),
    (0x2B, SemanticKey::Tab),
    (0x2C, SemanticKey::Space),
    (0x39, SemanticKey::CapsLock),
    (0x3A, SemanticKey::Function(1)),
    (0x3B, SemanticKey::Function(2)),
    (0x3C, SemanticKey::Function(3)),
    (0x3D, SemanticKey::Function(4)),
    (0x3E, SemanticKey::Function(5)),
    (0x3F, SemanticKey::Function(6)),
    (0x40, SemanticKey::Function(7)),
    (0x41, SemanticKey::Function(8)),
    (0x42, SemanticKey::Function(9)),
    (0x43, SemanticKey::Function(10)),
    (0x44, SemanticKey::Function(11)),
    (0x45, SemanticKey::Function(12)),
    (0x4F, SemanticKey::ArrowRight),
    (0x50, SemanticKey::ArrowLeft),
    (0x51, SemanticKey::ArrowDown),
    (0x52, SemanticKey::ArrowUp),
    // Keypad Enter behaves exactly like Return.
    (0x58, SemanticKey::Return),
    (0xE0, SemanticKey::Modifier(Modifier::LeftControl)),
    (0xE1, SemanticKey::Modifier(Modifier::LeftShift)),
    (0xE2, SemanticKey::Modifier(Modifier::LeftOption)),
    (0xE3, SemanticKey::Modifier(Modifier::LeftCommand)),
    (0xE4, SemanticKey::Modifier(Modifier::RightControl)),
    (0xE5, SemanticKey::Modifier(Modifier::RightShift)),
    (0xE6, SemanticKey::Modifier(Modifier::RightOption)),
    (0xE7, SemanticKey::Modifier(Modifier::RightCommand)),
];

// ── Table ─────────────────────────────────────────────────────────────────────

/// Immutable (scan code, shift state) → [`SemanticKey`] lookup table.
#[derive(Debug, Clone)]
pub struct ScanCodeTable {
    entries: HashMap<(u32, ShiftState), SemanticKey>,
}

impl ScanCodeTable {
    /// Builds the US ANSI table.
    ///
    /// Prefer [`ScanCodeTable::shared`] on hot paths; this constructor
    /// allocates a fresh table on every call.
    pub fn us_ansi() -> Self {
        let mut builder = TableBuilder::default();

        for (code, lower) in LETTERS {
            let upper = lower.to_ascii_uppercase();
            builder.insert(code, ShiftState::None, SemanticKey::Character(lower));
            builder.insert(code, ShiftState::Shifted, SemanticKey::Character(upper));
            builder.insert(code, ShiftState::Caps, SemanticKey::Character(upper));
        }
        for (code, plain, shifted) in SYMBOL_PAIRS {
            builder.insert(code, ShiftState::None, SemanticKey::Character(plain));
            builder.insert(code, ShiftState::Shifted, SemanticKey::Character(shifted));
        }
        for (code, glyph) in KEYPAD {
            builder.insert_unshiftable(code, SemanticKey::Character(glyph));
        }
        for (code, key) in NAMED {
            builder.insert_unshiftable(code, key);
        }

        builder.finish()
    }

    /// Returns the process-wide US ANSI table, building it on first use.
    pub fn shared() -> &'static ScanCodeTable {
        static TABLE: OnceLock<ScanCodeTable> = OnceLock::new();
        TABLE.get_or_init(ScanCodeTable::us_ansi)
    }

    /// Resolves `code` under `shift_state`.
    ///
    /// `None` and `Shifted` requests look up the exact pair.  `Caps` requests
    /// use the explicit `Caps` entry when present and fall back to the `None`
    /// entry otherwise.  Returns `None` when the code is unmapped.
    pub fn lookup(&self, code: u32, shift_state: ShiftState) -> Option<SemanticKey> {
        match shift_state {
            ShiftState::Caps => self
                .entries
                .get(&(code, ShiftState::Caps))
                .or_else(|| self.entries.get(&(code, ShiftState::None)))
                .copied(),
            ShiftState::None | ShiftState::Shifted => {
                self.entries.get(&(code, shift_state)).copied()
            }
        }
    }

    /// Returns every mapped scan code in ascending order.
    #[cfg(test)]
    fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self
            .entries
            .keys()
            .filter(|(_, state)| *state == ShiftState::None)
            .map(|(code, _)| *code)
            .collect();
        codes.sort_unstable();
        codes
    }

    /// Total number of (code, shift state) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ScanCodeTable {
    fn default() -> Self {
        Self::us_ansi()
    }
}

/// Accumulates entries and asserts that no (code, shift state) pair is
/// tabulated twice.
#[derive(Default)]
struct TableBuilder {
    entries: HashMap<(u32, ShiftState), SemanticKey>,
}

impl TableBuilder {
    fn insert(&mut self, code: u32, shift_state: ShiftState, key: SemanticKey) {
        let previous = self.entries.insert((code, shift_state), key);
        debug_assert!(
            previous.is_none(),
            "duplicate scan-code entry 0x{code:02X} ({shift_state})"
        );
    }

    fn insert_unshiftable(&mut self, code: u32, key: SemanticKey) {
        self.insert(code, ShiftState::None, key);
        self.insert(code, ShiftState::Shifted, key);
    }

    fn finish(self) -> ScanCodeTable {
        ScanCodeTable {
            entries: self.entries,
        }
    }
}
