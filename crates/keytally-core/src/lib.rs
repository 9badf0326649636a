//! # keytally-core
//!
//! Shared library for keytally containing the scan-code tables, the key
//! classification state machine, and the additive statistics aggregate.
//!
//! This crate is used by both the recording daemon and the stats CLI.
//! It has zero dependencies on OS APIs, async runtimes, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! keytally listens to raw keyboard and pointer events and turns them into
//! usage statistics: how often each key is pressed, which words are typed,
//! which keyboard shortcuts are used, and how many times the mouse is clicked.
//!
//! This crate (`keytally-core`) is the shared foundation.  It defines:
//!
//! - **`keymap`** – The static table that turns a hardware scan code (a USB
//!   HID usage ID) plus the current shift state into a [`SemanticKey`].
//!
//! - **`domain`** – The stateful part: the modifier state machine, the word
//!   segmenter, the shortcut detector, and the classifier that ties them
//!   together into [`StatsEngine`].
//!
//! - **`store`** – The durable aggregate and the [`AggregateStore`] trait that
//!   flushes pending counters into it with add-to-existing semantics.

// Declare the three top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/keymap/mod.rs).
pub mod domain;
pub mod keymap;
pub mod store;

// Re-export the most-used types at the crate root so callers can write
// `keytally_core::StatsEngine` instead of `keytally_core::domain::engine::StatsEngine`.
pub use domain::classifier::{ClassifyError, KeyEventClassifier, KeyOutcome};
pub use domain::engine::StatsEngine;
pub use domain::pending::PendingCounters;
pub use keymap::key::{Modifier, SemanticKey, ShiftState};
pub use keymap::table::ScanCodeTable;
pub use store::{
    AggregateStore, Category, DurableAggregate, FlushSummary, MemoryStore, StoreError,
};
pub use store::report::{ReportOptions, StatsReport};
