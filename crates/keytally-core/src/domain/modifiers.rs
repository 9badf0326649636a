//! Modifier tracking and shift-state derivation.
//!
//! The eight positional modifiers are *held*: inserted on press, removed on
//! release.  Caps-lock is a *toggle*: each press flips it, releases are
//! ignored.
//!
//! The shift state is recomputed explicitly after every mutation by
//! [`ModifierStateMachine::recompute_shift_state`], so it can never go stale.

use crate::keymap::key::{Modifier, SemanticKey, ShiftState};

/// Bit set of held modifiers plus the caps-lock toggle (9 members).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierSet(pub u16);

impl ModifierSet {
    pub const LEFT_CONTROL: u16 = 1 << 0;
    pub const LEFT_SHIFT: u16 = 1 << 1;
    pub const LEFT_OPTION: u16 = 1 << 2;
    pub const LEFT_COMMAND: u16 = 1 << 3;
    pub const RIGHT_CONTROL: u16 = 1 << 4;
    pub const RIGHT_SHIFT: u16 = 1 << 5;
    pub const RIGHT_OPTION: u16 = 1 << 6;
    pub const RIGHT_COMMAND: u16 = 1 << 7;
    pub const CAPS_LOCK: u16 = 1 << 8;

    /// Returns the bit for a positional modifier.
    pub fn bit(modifier: Modifier) -> u16 {
        match modifier {
            Modifier::LeftControl => Self::LEFT_CONTROL,
            Modifier::LeftShift => Self::LEFT_SHIFT,
            Modifier::LeftOption => Self::LEFT_OPTION,
            Modifier::LeftCommand => Self::LEFT_COMMAND,
            Modifier::RightControl => Self::RIGHT_CONTROL,
            Modifier::RightShift => Self::RIGHT_SHIFT,
            Modifier::RightOption => Self::RIGHT_OPTION,
            Modifier::RightCommand => Self::RIGHT_COMMAND,
        }
    }

    pub fn contains(&self, bits: u16) -> bool {
        self.0 & bits != 0
    }

    /// Returns `true` if either control key is held.
    pub fn control(&self) -> bool {
        self.contains(Self::LEFT_CONTROL | Self::RIGHT_CONTROL)
    }

    /// Returns `true` if either shift key is held.
    pub fn shift(&self) -> bool {
        self.contains(Self::LEFT_SHIFT | Self::RIGHT_SHIFT)
    }

    /// Returns `true` if either option key is held.
    pub fn option(&self) -> bool {
        self.contains(Self::LEFT_OPTION | Self::RIGHT_OPTION)
    }

    /// Returns `true` if either command key is held.
    pub fn command(&self) -> bool {
        self.contains(Self::LEFT_COMMAND | Self::RIGHT_COMMAND)
    }

    /// Returns `true` if caps-lock is toggled on.
    pub fn caps_lock(&self) -> bool {
        self.contains(Self::CAPS_LOCK)
    }

    /// Number of members currently in the set.
    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Tracks held modifiers and the derived [`ShiftState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierStateMachine {
    held: ModifierSet,
    shift_state: ShiftState,
}

impl ModifierStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a key transition.  Non-modifier keys are ignored.
    pub fn apply(&mut self, key: SemanticKey, pressed: bool) {
        match key {
            SemanticKey::CapsLock => {
                // Caps-lock has no release semantics.
                if pressed {
                    self.held.0 ^= ModifierSet::CAPS_LOCK;
                    self.recompute_shift_state();
                }
            }
            SemanticKey::Modifier(modifier) => {
                let bit = ModifierSet::bit(modifier);
                if pressed {
                    self.held.0 |= bit;
                } else {
                    self.held.0 &= !bit;
                }
                self.recompute_shift_state();
            }
            SemanticKey::Character(_)
            | SemanticKey::Function(_)
            | SemanticKey::Space
            | SemanticKey::Return
            | SemanticKey::Tab
            | SemanticKey::Escape
            | SemanticKey::Delete
            | SemanticKey::ArrowUp
            | SemanticKey::ArrowDown
            | SemanticKey::ArrowLeft
            | SemanticKey::ArrowRight => {}
        }
    }

    /// Derives the shift state from the held set: shift beats caps-lock.
    pub fn recompute_shift_state(&mut self) {
        self.shift_state = if self.held.shift() {
            ShiftState::Shifted
        } else if self.held.caps_lock() {
            ShiftState::Caps
        } else {
            ShiftState::None
        };
    }

    pub fn shift_state(&self) -> ShiftState {
        self.shift_state
    }

    pub fn held(&self) -> ModifierSet {
        self.held
    }

    pub fn is_control_held(&self) -> bool {
        self.held.control()
    }

    pub fn is_option_held(&self) -> bool {
        self.held.option()
    }

    pub fn is_shift_held(&self) -> bool {
        self.held.shift()
    }

    pub fn is_command_held(&self) -> bool {
        self.held.command()
    }

    pub fn is_caps_lock_on(&self) -> bool {
        self.held.caps_lock()
    }
}
