//! Infrastructure layer for the recording daemon.
//!
//! Contains OS-facing adapters: input event sources and file-system storage
//! (configuration and the durable statistics file).
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keytally_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod input_capture;
pub mod storage;
