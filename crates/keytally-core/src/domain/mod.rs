//! Domain logic for keytally.
//!
//! This module contains the stateful part of the engine and no infrastructure
//! dependencies.  It is a Mealy machine over three pieces of state: the held
//! modifier set, the word currently being typed, and the pending counters.
//!
//! # Pipeline
//!
//! ```text
//! (scan code, pressed)
//!   └─ KeyEventClassifier
//!        ├─ ScanCodeTable        (code + shift state → SemanticKey)
//!        ├─ ModifierStateMachine (held modifiers → shift state)
//!        ├─ ShortcutDetector     (modifier + character → "⇧⌘1")
//!        └─ WordSegmenter        (characters → committed words)
//!   └─ PendingCounters           (keys / words / commands)
//!
//! pointer button-down
//!   └─ ClickCounter + implicit word boundary
//! ```
//!
//! [`engine::StatsEngine`] bundles all of the above and owns the flush.

pub mod classifier;
pub mod clicks;
pub mod engine;
pub mod modifiers;
pub mod pending;
pub mod shortcut;
pub mod word;
