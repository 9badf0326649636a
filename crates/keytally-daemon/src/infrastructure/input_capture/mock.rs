//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without any OS hooks.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{CaptureError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Debug, Default, Clone)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawInputEvent>>>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: RawInputEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(event)
                .expect("receiver has been dropped; call start() first"),
            None => panic!("MockInputSource::inject_event called before start()"),
        }
    }

    /// Injects a press followed by a release of `code`.
    pub fn tap_key(&self, code: u32) {
        self.inject_event(RawInputEvent::Key { code, pressed: true });
        self.inject_event(RawInputEvent::Key { code, pressed: false });
    }

    /// Injects a pointer press followed by a release.
    pub fn click(&self) {
        self.inject_event(RawInputEvent::PointerButton { pressed: true });
        self.inject_event(RawInputEvent::PointerButton { pressed: false });
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}
