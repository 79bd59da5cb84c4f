//! Process configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8000;

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    /// JSON catalog file; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Seed for reproducible puzzle order; thread RNG when unset
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = get("PUZZLE_BOT_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".puzzle-bot").join("audit.db")
            },
            PathBuf::from,
        );

        Self {
            port: parse_var("PUZZLE_BOT_PORT", get("PUZZLE_BOT_PORT")).unwrap_or(DEFAULT_PORT),
            db_path,
            catalog_path: get("PUZZLE_BOT_CATALOG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            rng_seed: parse_var("PUZZLE_BOT_SEED", get("PUZZLE_BOT_SEED")),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    if let Ok(value) = raw.trim().parse() {
        Some(value)
    } else {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
        None
    }
}
