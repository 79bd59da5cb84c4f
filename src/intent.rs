//! Intent classification for incoming chat text
//!
//! Vocabularies are plain word tables compiled into whole-word,
//! case-insensitive regexes. What gets checked first depends on what the
//! chat is currently waiting for.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix that marks a command token
pub const COMMAND_PREFIX: char = '/';

/// Commands understood when no puzzle is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Help,
    Stats,
    Tip,
    Puzzle,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Start,
        Command::Help,
        Command::Stats,
        Command::Tip,
        Command::Puzzle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Stats => "stats",
            Command::Tip => "tip",
            Command::Puzzle => "puzzle",
        }
    }

    /// Parse `/name`, `/NAME args` or `/name@botname`
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(COMMAND_PREFIX)?;
        let token = rest.split_whitespace().next()?;
        let name = token.split('@').next().unwrap_or(token).to_lowercase();
        Self::ALL.into_iter().find(|cmd| cmd.name() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COMMAND_PREFIX}{}", self.name())
    }
}

/// Classified meaning of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Affirmative,
    Negative,
    Skip,
    Command(Command),
    /// Anything else: an answer attempt or unrecognized input
    FreeText(String),
}

impl Intent {
    /// Short label for logs and audit records
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Affirmative => "affirmative",
            Intent::Negative => "negative",
            Intent::Skip => "skip",
            Intent::Command(_) => "command",
            Intent::FreeText(_) => "free_text",
        }
    }
}

/// What the chat is waiting for, which decides classification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expecting {
    /// A yes/no reply (continue or restart prompts)
    Confirmation,
    /// An answer to the active puzzle
    Answer,
    /// Nothing in particular; commands are the main input
    Command,
}

/// Word tables for each vocabulary-driven intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub affirmative: Vec<String>,
    pub negative: Vec<String>,
    pub skip: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            affirmative: words(&[
                "да",
                "давай",
                "ok",
                "ок",
                "окей",
                "согласен",
                "договорились",
                "yes",
            ]),
            negative: words(&["нет", "не хочу", "неа", "no"]),
            skip: words(&["skip", "пропусти"]),
        }
    }
}

#[derive(Error, Debug)]
#[error("Invalid vocabulary pattern: {0}")]
pub struct VocabularyError(#[from] regex::Error);

/// Compiled classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    affirmative: Option<Regex>,
    negative: Option<Regex>,
    skip: Option<Regex>,
}

impl IntentClassifier {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, VocabularyError> {
        Ok(Self {
            affirmative: whole_word_pattern(&vocabulary.affirmative)?,
            negative: whole_word_pattern(&vocabulary.negative)?,
            skip: whole_word_pattern(&vocabulary.skip)?,
        })
    }

    pub fn classify(&self, text: &str, expecting: Expecting) -> Intent {
        let text = text.trim();
        match expecting {
            Expecting::Confirmation => {
                if matches(self.affirmative.as_ref(), text) {
                    Intent::Affirmative
                } else if matches(self.negative.as_ref(), text) {
                    Intent::Negative
                } else {
                    command_or_text(text)
                }
            }
            Expecting::Answer => {
                if matches(self.skip.as_ref(), text) {
                    Intent::Skip
                } else {
                    Intent::FreeText(text.to_string())
                }
            }
            // Skip only means something while a puzzle is active
            Expecting::Command => command_or_text(text),
        }
    }
}

fn command_or_text(text: &str) -> Intent {
    Command::parse(text).map_or_else(|| Intent::FreeText(text.to_string()), Intent::Command)
}

fn matches(pattern: Option<&Regex>, text: &str) -> bool {
    pattern.is_some_and(|re| re.is_match(text))
}

/// Case-insensitive alternation bounded by non-word characters, or `None`
/// for an empty table. Words may start or end with punctuation (`c++`).
fn whole_word_pattern(words: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!(
        r"(?i)(?:^|\W)(?:{})(?:\W|$)",
        alternatives.join("|")
    ))
    .map(Some)
}
