//! Effects produced by state transitions

use crate::catalog::PuzzleId;
use crate::reply::OutgoingResponse;
use serde::{Deserialize, Serialize};

/// What happened to a puzzle, for the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Issued,
    Correct,
    Incorrect,
    Skipped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Issued => "issued",
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
            Outcome::Skipped => "skipped",
        }
    }
}

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a reply to the chat
    Reply(OutgoingResponse),

    /// Record what happened to a puzzle
    RecordOutcome { puzzle: PuzzleId, outcome: Outcome },

    /// Every puzzle has been used this round
    RecordRoundExhausted,

    /// The chat started a fresh round
    RecordRoundRestarted,
}

impl Effect {
    pub fn outcome(puzzle: &PuzzleId, outcome: Outcome) -> Self {
        Effect::RecordOutcome {
            puzzle: puzzle.clone(),
            outcome,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn as_reply(&self) -> Option<&OutgoingResponse> {
        match self {
            Effect::Reply(reply) => Some(reply),
            _ => None,
        }
    }
}
