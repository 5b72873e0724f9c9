//! Audit trail of record mutations
//!
//! Writes one JSON object per line for every create, status change, risk
//! change and delete. Events carry the record id and the new value only;
//! contact details and free text never reach the trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CaseCreated,
    CaseStatusChanged,
    CaseDeleted,
    ReportSubmitted,
    ReportStatusChanged,
    VictimAdded,
    VictimRiskChanged,
}

/// One line of the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    /// Hex id of the affected record
    pub record_id: String,
    /// New status or level, for change events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Client address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: EventType, record_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            record_id: record_id.into(),
            value: None,
            remote: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Appends audit events to a JSONL file; a no-op until a file is attached
#[derive(Clone, Default)]
pub struct AuditLogger {
    inner: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl AuditLogger {
    /// Logger that drops every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Logger appending to `path`
    pub fn to_file(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Audit log writing to {}", path.display());
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
        })
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    pub async fn log(&self, event: AuditEvent) {
        let line = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if let Some(ref mut writer) = *inner {
            if let Err(e) = writeln!(writer, "{}", line) {
                error!("Failed to write audit event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        }
    }
}
