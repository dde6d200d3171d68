//! Observability module
//!
//! Logging, metrics, and the JSONL audit stream for interviews.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{AuditRecord, Event, EventEmitter};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
