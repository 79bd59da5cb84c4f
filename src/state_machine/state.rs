//! Chat state types

use crate::catalog::{PuzzleCatalog, PuzzleId};
use crate::intent::Expecting;
use crate::reply::Phrasebook;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// External chat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversational phase of a chat
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Menu: no puzzle is active
    #[default]
    Idle,

    /// A puzzle has been issued and awaits an answer
    Solving { puzzle: PuzzleId },

    /// Just answered correctly, asked whether to continue
    AwaitingContinue,

    /// Every puzzle is used up, asked whether to start over
    AwaitingRestart,
}

/// Coarse mode without the active puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Normal,
    AwaitingContinue,
    AwaitingRestart,
}

impl Phase {
    pub fn mode(&self) -> Mode {
        match self {
            Phase::Idle | Phase::Solving { .. } => Mode::Normal,
            Phase::AwaitingContinue => Mode::AwaitingContinue,
            Phase::AwaitingRestart => Mode::AwaitingRestart,
        }
    }

    pub fn active_puzzle(&self) -> Option<&PuzzleId> {
        match self {
            Phase::Solving { puzzle } => Some(puzzle),
            _ => None,
        }
    }

    /// What input the phase is waiting for
    pub fn expecting(&self) -> Expecting {
        match self {
            Phase::Idle => Expecting::Command,
            Phase::Solving { .. } => Expecting::Answer,
            Phase::AwaitingContinue | Phase::AwaitingRestart => Expecting::Confirmation,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Solving { .. } => "solving",
            Phase::AwaitingContinue => "awaiting_continue",
            Phase::AwaitingRestart => "awaiting_restart",
        }
    }
}

/// Per-chat record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatState {
    pub phase: Phase,
    /// Puzzles resolved (answered or skipped) in the current round
    pub used: BTreeSet<PuzzleId>,
    /// Answer submissions, including skips
    pub attempted: u32,
    pub correct: u32,
}

impl ChatState {
    pub fn mode(&self) -> Mode {
        self.phase.mode()
    }

    pub fn active_puzzle(&self) -> Option<&PuzzleId> {
        self.phase.active_puzzle()
    }

    /// Whether every catalog puzzle has been used this round
    pub fn round_exhausted(&self, catalog: &PuzzleCatalog) -> bool {
        catalog.all_ids().iter().all(|id| self.used.contains(id))
    }

    /// Check the structural invariants against a catalog
    pub fn check_invariants(&self, catalog: &PuzzleCatalog) -> Result<(), String> {
        if self.used.len() > catalog.size() {
            return Err(format!(
                "{} used puzzles exceed catalog size {}",
                self.used.len(),
                catalog.size()
            ));
        }
        if let Some(unknown) = self.used.iter().find(|id| !catalog.contains(id)) {
            return Err(format!("used puzzle {unknown} is not in the catalog"));
        }
        if self.correct > self.attempted {
            return Err(format!(
                "correct {} exceeds attempted {}",
                self.correct, self.attempted
            ));
        }
        match &self.phase {
            Phase::Solving { puzzle } if self.used.contains(puzzle) => {
                Err(format!("active puzzle {puzzle} is already used"))
            }
            Phase::Solving { puzzle } if !catalog.contains(puzzle) => {
                Err(format!("active puzzle {puzzle} is not in the catalog"))
            }
            Phase::AwaitingRestart if !self.round_exhausted(catalog) => {
                Err("awaiting restart before the round is exhausted".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Immutable inputs shared by every transition
#[derive(Debug, Clone, Copy)]
pub struct ChatContext<'a> {
    pub chat_id: ChatId,
    pub catalog: &'a PuzzleCatalog,
    pub phrases: &'a Phrasebook,
}

impl<'a> ChatContext<'a> {
    pub fn new(chat_id: ChatId, catalog: &'a PuzzleCatalog, phrases: &'a Phrasebook) -> Self {
        Self {
            chat_id,
            catalog,
            phrases,
        }
    }
}
