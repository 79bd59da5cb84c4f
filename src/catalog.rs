//! Puzzle catalog
//!
//! A fixed, read-only set of puzzles loaded once at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Stable identifier of a puzzle within the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(String);

impl PuzzleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[allow(dead_code)] // Used in tests
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single puzzle: what we ask and what we expect back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub prompt: String,
    pub answer: String,
}

impl Puzzle {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: PuzzleId::new(id),
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }

    /// Case-insensitive comparison of a submitted answer, ignoring surrounding whitespace
    pub fn accepts(&self, submitted: &str) -> bool {
        submitted.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Puzzle not found: {0}")]
    NotFound(PuzzleId),
    #[error("Duplicate puzzle id: {0}")]
    DuplicateId(PuzzleId),
    #[error("Catalog contains no puzzles")]
    Empty,
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    puzzles: Vec<Puzzle>,
}

/// Immutable mapping from puzzle id to puzzle
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    /// Ids in declaration order
    order: Vec<PuzzleId>,
    puzzles: HashMap<PuzzleId, Puzzle>,
}

impl PuzzleCatalog {
    pub fn new(puzzles: impl IntoIterator<Item = Puzzle>) -> Result<Self, CatalogError> {
        let mut order = Vec::new();
        let mut by_id = HashMap::new();
        for puzzle in puzzles {
            if by_id.contains_key(&puzzle.id) {
                return Err(CatalogError::DuplicateId(puzzle.id));
            }
            order.push(puzzle.id.clone());
            by_id.insert(puzzle.id.clone(), puzzle);
        }
        if order.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self {
            order,
            puzzles: by_id,
        })
    }

    /// Load a catalog from a JSON file of the form `{"puzzles": [{"id", "prompt", "answer"}]}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.puzzles)
    }

    /// The three puzzles the bot ships with
    pub fn builtin() -> Self {
        let puzzles = [
            Puzzle::new("p1", "Сколько будет 2 + 2 * 2?", "6"),
            Puzzle::new(
                "p2",
                "Назови язык программирования, совпадающий с названием змеи",
                "python",
            ),
            Puzzle::new("p3", "Чему равен остаток от деления 10 на 3?", "1"),
        ];
        let order = puzzles.iter().map(|p| p.id.clone()).collect();
        let puzzles = puzzles.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self { order, puzzles }
    }

    pub fn lookup(&self, id: &PuzzleId) -> Result<&Puzzle, CatalogError> {
        self.puzzles
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    pub fn all_ids(&self) -> &[PuzzleId] {
        &self.order
    }

    pub fn size(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, id: &PuzzleId) -> bool {
        self.puzzles.contains_key(id)
    }
}
