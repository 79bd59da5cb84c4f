//! Trait abstractions for runtime I/O
//!
//! The dispatcher only talks to the outside world through these, so tests
//! can swap in the recording implementations from `testing`.

use crate::db::{AuditDb, AuditEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    /// Hand off one event. Never blocks the caller and never fails it.
    fn record(&self, event: AuditEvent);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn record(&self, event: AuditEvent) {
        (**self).record(event);
    }
}

// ============================================================================
// Production Implementations
// ============================================================================

/// Audit sink that queues events for a background writer
#[derive(Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAuditSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Audit writer is gone, dropping event");
        }
    }
}

/// Drain `rx` into the audit database until every sender is dropped.
///
/// Runs on the blocking pool since every append is a synchronous SQLite write.
pub fn spawn_audit_writer(
    mut rx: mpsc::UnboundedReceiver<AuditEvent>,
    db: AuditDb,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut written = 0u64;
        while let Some(event) = rx.blocking_recv() {
            match db.append(&event) {
                Ok(_) => written += 1,
                Err(e) => tracing::warn!(
                    chat_id = %event.chat_id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to write audit event"
                ),
            }
        }
        tracing::info!(written, "Audit writer stopped");
    })
}
