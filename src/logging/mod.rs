//! Logging infrastructure for hrm
//!
//! Request and service logs go through `tracing`; mutations can also be
//! appended to a JSONL audit trail.

pub mod audit;

pub use audit::{AuditEvent, AuditLogger, EventType};
