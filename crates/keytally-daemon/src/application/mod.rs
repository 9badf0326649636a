//! Application layer use cases for the recording daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure statistics rules in `keytally_core`) and the infrastructure (input
//! sources, files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "count every
//!   keystroke and persist the totals every minute").
//! - **Depend on abstractions** (the `AggregateStore` trait) rather than
//!   concrete storage, so tests can swap in an in-memory store.
//! - **Contain no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`record_input`** – Feeds raw input events into the statistics engine
//!   and flushes pending counts on a timer, on request, at shutdown, and at
//!   end of input, all from one task.

pub mod record_input;
