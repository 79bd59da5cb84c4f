//! Audit schema and types

use crate::state_machine::ChatId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    detail TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_chat ON audit_log(chat_id, id DESC);
";

/// Kind of audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// Text received from the chat
    Incoming,
    /// Reply sent to the chat
    Outgoing,
    /// Puzzle issued, answered, or skipped
    Outcome,
    /// Round exhausted or restarted
    Round,
    /// Handling failed with an internal error
    Failure,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditKind::Incoming => "incoming",
            AuditKind::Outgoing => "outgoing",
            AuditKind::Outcome => "outcome",
            AuditKind::Round => "round",
            AuditKind::Failure => "failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "incoming" => Some(AuditKind::Incoming),
            "outgoing" => Some(AuditKind::Outgoing),
            "outcome" => Some(AuditKind::Outcome),
            "round" => Some(AuditKind::Round),
            "failure" => Some(AuditKind::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth keeping in the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub chat_id: ChatId,
    pub kind: AuditKind,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(chat_id: ChatId, kind: AuditKind, detail: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind,
            detail: detail.into(),
            at: Utc::now(),
        }
    }
}

/// A stored audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub chat_id: ChatId,
    pub kind: AuditKind,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
