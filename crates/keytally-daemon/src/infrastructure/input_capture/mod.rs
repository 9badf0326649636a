//! Input capture infrastructure for the recording daemon.
//!
//! A source produces [`RawInputEvent`]s on a dedicated OS thread and hands
//! them over through a `std::sync::mpsc` channel.  [`forward_to_async`]
//! bridges that channel into a Tokio channel consumed by the recorder task.
//!
//! Key codes are USB HID usage IDs (page 0x07).  Sources drop codes outside
//! the keyboard usage window (`0x04..=0xE7`) before they reach the recorder.
//!
//! # Testability
//!
//! The `InputSource` trait allows tests to inject synthetic events through
//! [`mock::MockInputSource`] without any OS hooks.

use std::sync::mpsc;

use tokio::sync::mpsc as tokio_mpsc;
use tracing::debug;

pub mod mock;
pub mod replay;

/// A raw input event produced by the input capture infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    /// A keyboard key changed state.
    Key {
        /// HID usage ID.
        code: u32,
        /// `true` on press, `false` on release.
        pressed: bool,
    },
    /// A pointer button changed state.
    PointerButton { pressed: bool },
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("input source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("capture source has already been stopped")]
    AlreadyStopped,
    #[error("malformed input at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Trait abstracting input event production.
pub trait InputSource: Send {
    /// Starts the input source and returns a receiver for captured events.
    ///
    /// The channel disconnects when the source runs out of input or is
    /// stopped.
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError>;
    /// Stops the input source and releases all OS resources.
    fn stop(&self);
}

/// Spawns a forwarder thread moving events from `rx` into a bounded Tokio
/// channel of `capacity` events.
///
/// The Tokio receiver yields `None` once `rx` disconnects.  The thread also
/// exits when the Tokio receiver is dropped.
///
/// # Errors
///
/// Returns [`CaptureError::SourceUnavailable`] if the thread cannot be spawned.
pub fn forward_to_async(
    rx: mpsc::Receiver<RawInputEvent>,
    capacity: usize,
) -> Result<tokio_mpsc::Receiver<RawInputEvent>, CaptureError> {
    let (tx, async_rx) = tokio_mpsc::channel(capacity.max(1));
    std::thread::Builder::new()
        .name("keytally-capture-forward".to_string())
        .spawn(move || {
            for event in rx {
                if tx.blocking_send(event).is_err() {
                    debug!("recorder dropped its event channel; forwarder exiting");
                    return;
                }
            }
            debug!("input source disconnected; forwarder exiting");
        })
        .map_err(|e| CaptureError::SourceUnavailable(format!("forwarder thread: {e}")))?;
    Ok(async_rx)
}
