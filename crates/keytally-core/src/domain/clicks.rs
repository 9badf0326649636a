//! Pointer click counting.

use crate::store::{AggregateStore, StoreError};

/// Counts pointer button presses between flushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickCounter {
    pending: u64,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_click(&mut self) {
        self.pending += 1;
    }

    /// Clicks recorded since the last successful flush.
    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Adds the pending clicks to the durable count and resets to zero.
    ///
    /// Does not touch the store when nothing is pending.  On error the
    /// pending count is kept for the next flush.  Returns the number of
    /// clicks written.
    pub fn flush<S>(&mut self, store: &mut S) -> Result<u64, StoreError>
    where
        S: AggregateStore + ?Sized,
    {
        if self.pending == 0 {
            return Ok(0);
        }
        store.merge_clicks(self.pending)?;
        Ok(std::mem::take(&mut self.pending))
    }
}
