//! HTTP API standing in for the chat transport

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::db::AuditDb;
use crate::runtime::ProductionDispatcher;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ProductionDispatcher>,
    pub audit_db: AuditDb,
}

impl AppState {
    pub fn new(dispatcher: ProductionDispatcher, audit_db: AuditDb) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            audit_db,
        }
    }
}
