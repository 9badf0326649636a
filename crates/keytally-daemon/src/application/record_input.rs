//! RecordInputUseCase: feeds captured input into the statistics engine and
//! flushes pending counts into the durable store.
//!
//! # Serialization
//!
//! The [`Recorder`] task owns the use case (and with it the engine and the
//! store).  Input events, the periodic flush timer, explicit flush requests
//! from a [`FlushHandle`], and shutdown all go through one `select!` loop, so
//! classification and flushing never interleave and every flush sees a
//! consistent snapshot of the pending counters.
//!
//! # Failure policy
//!
//! A classification error (unmapped scan code) or a store error is fatal:
//! the recorder makes one best-effort flush of whatever is still pending and
//! then returns the error.

use std::fmt;
use std::time::Duration;

use keytally_core::{AggregateStore, ClassifyError, FlushSummary, StatsEngine, StoreError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::infrastructure::input_capture::RawInputEvent;

/// Smallest accepted flush period.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// Capacity of the control channel behind [`FlushHandle`].
const CONTROL_CHANNEL_CAPACITY: usize = 8;

/// Error type for the record-input use case.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Reported to a [`FlushHandle`] caller when the recorder's flush failed.
    #[error("flush failed: {0}")]
    FlushFailed(String),
    #[error("recorder is no longer running")]
    RecorderGone,
}

/// Why a flush happened.  Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    Periodic,
    Requested,
    Shutdown,
    EndOfInput,
    Fatal,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlushReason::Periodic => "periodic",
            FlushReason::Requested => "requested",
            FlushReason::Shutdown => "shutdown",
            FlushReason::EndOfInput => "end of input",
            FlushReason::Fatal => "fatal error",
        })
    }
}

/// Totals reported when the recorder stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Input events handled.
    pub events: u64,
    /// Flushes that wrote something.
    pub flushes: u64,
}

/// Applies input events to a [`StatsEngine`] and flushes it into `S`.
#[derive(Debug)]
pub struct RecordInputUseCase<S> {
    engine: StatsEngine,
    store: S,
    summary: RunSummary,
}

impl<S: AggregateStore> RecordInputUseCase<S> {
    pub fn new(store: S) -> Self {
        Self::with_engine(StatsEngine::new(), store)
    }

    pub fn with_engine(engine: StatsEngine, store: S) -> Self {
        Self {
            engine,
            store,
            summary: RunSummary::default(),
        }
    }

    /// Classifies one input event into the pending counters.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Classify`] for a key the scan-code table cannot
    /// resolve.
    pub fn handle_event(&mut self, event: RawInputEvent) -> Result<(), RecordError> {
        self.summary.events += 1;
        match event {
            RawInputEvent::Key { code, pressed } => {
                let outcome = self.engine.on_key(code, pressed)?;
                if let Some(shortcut) = outcome.shortcut {
                    debug!(%shortcut, "shortcut recorded");
                }
            }
            RawInputEvent::PointerButton { pressed } => {
                self.engine.on_pointer(pressed);
            }
        }
        Ok(())
    }

    /// Merges everything pending into the store.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Store`]; deltas the store did not accept stay
    /// pending.
    pub fn flush(&mut self, reason: FlushReason) -> Result<FlushSummary, RecordError> {
        let summary = self.engine.flush(&mut self.store)?;
        if summary.is_empty() {
            debug!(%reason, "nothing pending to flush");
        } else {
            self.summary.flushes += 1;
            info!(
                %reason,
                keys = summary.keys,
                words = summary.words,
                commands = summary.commands,
                clicks = summary.clicks,
                "statistics flushed"
            );
        }
        Ok(summary)
    }

    pub fn engine(&self) -> &StatsEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

type FlushReply = oneshot::Sender<Result<FlushSummary, String>>;

enum ControlMessage {
    Flush(FlushReply),
    Shutdown(FlushReply),
}

/// Cloneable handle for asking a running [`Recorder`] to flush or stop.
#[derive(Debug, Clone)]
pub struct FlushHandle {
    tx: mpsc::Sender<ControlMessage>,
}

impl fmt::Debug for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlMessage::Flush(_) => "Flush",
            ControlMessage::Shutdown(_) => "Shutdown",
        })
    }
}

impl FlushHandle {
    /// Flushes now and waits for the result.
    pub async fn flush(&self) -> Result<FlushSummary, RecordError> {
        self.request(ControlMessage::Flush).await
    }

    /// Flushes one last time and stops the recorder.
    pub async fn shutdown(&self) -> Result<FlushSummary, RecordError> {
        self.request(ControlMessage::Shutdown).await
    }

    async fn request(
        &self,
        message: fn(FlushReply) -> ControlMessage,
    ) -> Result<FlushSummary, RecordError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(message(reply_tx))
            .await
            .map_err(|_| RecordError::RecorderGone)?;
        reply_rx
            .await
            .map_err(|_| RecordError::RecorderGone)?
            .map_err(RecordError::FlushFailed)
    }
}

/// The single task that owns a [`RecordInputUseCase`].
#[derive(Debug)]
pub struct Recorder<S> {
    use_case: RecordInputUseCase<S>,
    flush_interval: Duration,
    control_rx: mpsc::Receiver<ControlMessage>,
}

impl<S: AggregateStore> Recorder<S> {
    pub fn new(use_case: RecordInputUseCase<S>, flush_interval: Duration) -> (Self, FlushHandle) {
        let (tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let recorder = Self {
            use_case,
            flush_interval: flush_interval.max(MIN_FLUSH_INTERVAL),
            control_rx,
        };
        (recorder, FlushHandle { tx })
    }

    /// Runs until `events` closes, a shutdown is requested, or a fatal error.
    ///
    /// The first timer tick fires immediately.  When `events` closes the
    /// pending counts are flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`RecordError`] after a best-effort flush.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<RawInputEvent>,
    ) -> Result<RunSummary, RecordError> {
        let Recorder {
            mut use_case,
            flush_interval,
            mut control_rx,
        } = self;

        let mut ticker = tokio::time::interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = flush_interval.as_millis() as u64, "recorder started");

        loop {
            tokio::select! {
                biased;

                Some(message) = control_rx.recv() => match message {
                    ControlMessage::Flush(reply) => {
                        let result = use_case.flush(FlushReason::Requested);
                        respond(reply, &result);
                        if let Err(e) = result {
                            return Err(fail(&mut use_case, e, true));
                        }
                    }
                    ControlMessage::Shutdown(reply) => {
                        let result = use_case.flush(FlushReason::Shutdown);
                        respond(reply, &result);
                        if let Err(e) = result {
                            return Err(fail(&mut use_case, e, true));
                        }
                        info!("recorder stopped on request");
                        return Ok(use_case.summary());
                    }
                },

                _ = ticker.tick() => {
                    if let Err(e) = use_case.flush(FlushReason::Periodic) {
                        return Err(fail(&mut use_case, e, true));
                    }
                }

                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = use_case.handle_event(event) {
                            return Err(fail(&mut use_case, e, false));
                        }
                    }
                    None => {
                        if let Err(e) = use_case.flush(FlushReason::EndOfInput) {
                            return Err(fail(&mut use_case, e, true));
                        }
                        info!("input closed; recorder stopped");
                        return Ok(use_case.summary());
                    }
                },
            }
        }
    }
}

/// Sends the flush result back to a handle.
fn respond(reply: FlushReply, result: &Result<FlushSummary, RecordError>) {
    let message = result.as_ref().copied().map_err(|e| e.to_string());
    if reply.send(message).is_err() {
        debug!("flush requester went away before the reply");
    }
}

/// Logs a fatal error, attempting a last flush unless the store itself
/// just failed.
fn fail<S: AggregateStore>(
    use_case: &mut RecordInputUseCase<S>,
    err: RecordError,
    store_failed: bool,
) -> RecordError {
    error!("recorder halted: {err}");
    if !store_failed {
        if let Err(e) = use_case.flush(FlushReason::Fatal) {
            warn!("final flush after fatal error failed: {e}");
        }
    }
    err
}
