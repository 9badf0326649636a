//! Line-oriented event source reading a recorded session from a file or stdin.
//!
//! # Format
//!
//! One event per line; blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! key 0x0B down     # HID usage, decimal or 0x-prefixed hex
//! key 0x0B up
//! click             # pointer press
//! button up         # pointer release (`button down` is a press)
//! ```
//!
//! Malformed lines are logged and skipped.  Key codes outside the keyboard
//! usage window are dropped here, before they reach the classifier.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use keytally_core::keymap::is_keyboard_usage;
use tracing::{debug, info, warn};

use super::{CaptureError, InputSource, RawInputEvent};

/// Where the replay reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOrigin {
    File(PathBuf),
    Stdin,
}

/// [`InputSource`] replaying a textual event log.
#[derive(Debug)]
pub struct ReplayInputSource {
    origin: ReplayOrigin,
    stopped: Arc<AtomicBool>,
}

impl ReplayInputSource {
    pub fn new(origin: ReplayOrigin) -> Self {
        Self {
            origin,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ReplayOrigin::File(path.into()))
    }

    pub fn stdin() -> Self {
        Self::new(ReplayOrigin::Stdin)
    }

    /// `"-"` selects stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::stdin()
        } else {
            Self::from_path(arg)
        }
    }

    pub fn origin(&self) -> &ReplayOrigin {
        &self.origin
    }

    fn open(&self) -> Result<Box<dyn BufRead + Send>, CaptureError> {
        match &self.origin {
            ReplayOrigin::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            ReplayOrigin::File(path) => {
                let file = File::open(path).map_err(|e| {
                    CaptureError::SourceUnavailable(format!("{}: {e}", path.display()))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl InputSource for ReplayInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        if self.stopped.load(Ordering::Relaxed) {
            return Err(CaptureError::AlreadyStopped);
        }
        let reader = self.open()?;
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::clone(&self.stopped);

        std::thread::Builder::new()
            .name("keytally-replay".to_string())
            .spawn(move || replay_loop(reader, tx, stopped))
            .map_err(|e| CaptureError::SourceUnavailable(format!("replay thread: {e}")))?;

        info!(origin = ?self.origin, "replay source started");
        Ok(rx)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// Reads lines until EOF, stop, or the receiver goes away.
fn replay_loop(reader: Box<dyn BufRead + Send>, tx: mpsc::Sender<RawInputEvent>, stopped: Arc<AtomicBool>) {
    let mut delivered = 0u64;
    for (index, line) in reader.lines().enumerate() {
        if stopped.load(Ordering::Relaxed) {
            break;
        }
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("replay read failed at line {line_no}: {e}");
                break;
            }
        };
        let event = match parse_line(line_no, &line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!("skipping replay line: {e}");
                continue;
            }
        };
        if !accepts(&event) {
            debug!(?event, "dropping non-keyboard usage");
            continue;
        }
        if tx.send(event).is_err() {
            break;
        }
        delivered += 1;
    }
    info!(delivered, "replay source finished");
}

/// Returns `true` if the event should reach the recorder.
pub fn accepts(event: &RawInputEvent) -> bool {
    match event {
        RawInputEvent::Key { code, .. } => is_keyboard_usage(*code),
        RawInputEvent::PointerButton { .. } => true,
    }
}

/// Parses one replay line.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`CaptureError::Malformed`] naming `line_no` for anything else
/// that is not a valid event.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<RawInputEvent>, CaptureError> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }
    let malformed = |reason: String| CaptureError::Malformed {
        line: line_no,
        reason,
    };

    let tokens: Vec<&str> = content.split_whitespace().collect();
    let event = match tokens.as_slice() {
        ["key", code, state] => RawInputEvent::Key {
            code: parse_code(code).ok_or_else(|| malformed(format!("bad key code {code:?}")))?,
            pressed: parse_state(state)
                .ok_or_else(|| malformed(format!("expected down/up, got {state:?}")))?,
        },
        ["click"] => RawInputEvent::PointerButton { pressed: true },
        ["button", state] => RawInputEvent::PointerButton {
            pressed: parse_state(state)
                .ok_or_else(|| malformed(format!("expected down/up, got {state:?}")))?,
        },
        [verb, ..] => return Err(malformed(format!("unrecognized event {verb:?}"))),
        [] => return Ok(None),
    };
    Ok(Some(event))
}

fn parse_code(token: &str) -> Option<u32> {
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

fn parse_state(token: &str) -> Option<bool> {
    match token {
        "down" => Some(true),
        "up" => Some(false),
        _ => None,
    }
}
