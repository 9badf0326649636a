//! Scan-code translation for the modeled keyboard layout.
//!
//! The input hardware reports USB HID usage IDs (page 0x07, Keyboard/Keypad).
//! Those are physical key positions; [`table::ScanCodeTable`] resolves them to
//! the [`key::SemanticKey`] the user actually produced under the current
//! [`key::ShiftState`].

pub mod key;
pub mod table;

pub use key::{Modifier, SemanticKey, ShiftState};
pub use table::ScanCodeTable;

/// Lowest keyboard usage ID delivered by the device layer.
pub const KEYBOARD_USAGE_MIN: u32 = 0x04;

/// Highest keyboard usage ID delivered by the device layer (Right GUI).
pub const KEYBOARD_USAGE_MAX: u32 = 0xE7;

/// Returns `true` if `code` lies inside the keyboard usage window that the
/// device layer subscribes to.
///
/// Codes outside this window never reach the classifier.  Codes inside the
/// window that have no table entry are a fatal classification error.
pub fn is_keyboard_usage(code: u32) -> bool {
    (KEYBOARD_USAGE_MIN..=KEYBOARD_USAGE_MAX).contains(&code)
}
