//! Runtime for dispatching chat messages
//!
//! Wires the pure state machine to chat storage, randomness, and the audit
//! trail.

mod dispatcher;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use dispatcher::{DispatchError, Dispatcher};
pub use traits::*;

use crate::db::AuditDb;
use crate::selector::ConfiguredRandom;
use crate::store::InMemoryChatStore;
use tokio::task::JoinHandle;

/// Type alias for the production dispatcher with concrete implementations
pub type ProductionDispatcher = Dispatcher<InMemoryChatStore, ConfiguredRandom, ChannelAuditSink>;

/// Start the background audit writer and return the sink that feeds it.
///
/// The writer stops once every clone of the sink is dropped.
pub fn start_audit_trail(db: AuditDb) -> (ChannelAuditSink, JoinHandle<()>) {
    let (sink, rx) = ChannelAuditSink::new();
    let writer = spawn_audit_writer(rx, db);
    (sink, writer)
}
