//! Structured audit event stream.
//!
//! One record is emitted when an interview reaches a verdict, or when an
//! interview is torn down mid-game. Events are serialized as newline-
//! delimited JSON (JSONL) with a monotonically increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use interrogation_core::config::SuspectRoleType;

use crate::phase::{InterviewPhase, Outcome};

// ---------------------------------------------------------------------------
// Audit record
// ---------------------------------------------------------------------------

/// Snapshot of an interview at the moment it is audited.
///
/// Setup fields are optional: an interview abandoned early may never have
/// been dealt a packet, role or background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Phase at the time of the audit.
    pub phase: InterviewPhase,
    /// Verdict, if one was reached.
    pub outcome: Option<Outcome>,
    /// Time since the interview clock started, zero if it never started.
    pub duration_ms: u64,
    /// Name of the selected packet.
    pub packet: Option<String>,
    /// Diagram descriptor of the interference pattern.
    pub interference_pattern: Option<String>,
    /// Solution sequence of the interference pattern.
    pub interference_solution: Option<String>,
    /// First suspect background offered.
    pub suspect_background: Option<String>,
    /// Type of the suspect's role.
    pub suspect_type: Option<SuspectRoleType>,
    /// Fault of the suspect's role.
    pub suspect_fault: Option<String>,
    /// Traits of the suspect's role.
    pub suspect_traits: Vec<String>,
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete audit event.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An interview reached a verdict.
    InterviewFinished {
        /// When the verdict was reached.
        timestamp: DateTime<Utc>,
        /// Interview code.
        code: String,
        /// State of the interview.
        record: AuditRecord,
    },

    /// An interview was removed while its clock was running.
    InterviewAbandoned {
        /// When the interview was removed.
        timestamp: DateTime<Utc>,
        /// Interview code.
        code: String,
        /// State of the interview.
        record: AuditRecord,
    },
}

impl Event {
    /// Short label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InterviewFinished { .. } => "finished",
            Self::InterviewAbandoned { .. } => "abandoned",
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are dropped so that
/// auditing never fails a game action.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    ///
    /// Failures are silently dropped.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
