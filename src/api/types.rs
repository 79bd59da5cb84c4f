//! API request and response types

use crate::catalog::PuzzleId;
use crate::db::AuditRecord;
use crate::reply::{KeyboardKind, OutgoingResponse};
use crate::state_machine::{ChatId, ChatState, Mode};
use serde::{Deserialize, Serialize};

/// Incoming chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// The bot's reply to one message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub text: String,
    pub keyboard: KeyboardKind,
    /// Button rows matching `keyboard`
    pub buttons: Vec<Vec<String>>,
}

impl From<OutgoingResponse> for MessageResponse {
    fn from(response: OutgoingResponse) -> Self {
        Self {
            buttons: response.keyboard.buttons(),
            text: response.text,
            keyboard: response.keyboard,
        }
    }
}

/// Snapshot of one chat
#[derive(Debug, Serialize)]
pub struct ChatStateResponse {
    pub chat_id: ChatId,
    pub mode: Mode,
    pub active_puzzle: Option<PuzzleId>,
    pub used_puzzles: Vec<PuzzleId>,
    pub attempted: u32,
    pub correct: u32,
    pub catalog_size: usize,
}

impl ChatStateResponse {
    pub fn new(chat_id: ChatId, state: &ChatState, catalog_size: usize) -> Self {
        Self {
            chat_id,
            mode: state.mode(),
            active_puzzle: state.active_puzzle().cloned(),
            used_puzzles: state.used.iter().cloned().collect(),
            attempted: state.attempted,
            correct: state.correct,
            catalog_size,
        }
    }
}

/// Query for the audit listing
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Recent audit rows, newest first
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub events: Vec<AuditRecord>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
