/// Configuration for the document tree engine
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;

/// Upper bound for the SQLite busy timeout (one minute)
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

/// How `NodeService` answers "would this move create a cycle?"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleCheckStrategy {
    /// Build the owner's forest and walk it in memory
    #[default]
    InMemory,
    /// Ask the store for the transitive closure (`NodeStore::is_descendant`)
    StoreClosure,
}

impl FromStr for CycleCheckStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::InMemory),
            "store" | "store_closure" => Ok(Self::StoreClosure),
            other => Err(format!(
                "unknown cycle check strategy '{}' (expected 'memory' or 'store')",
                other
            )),
        }
    }
}

impl fmt::Display for CycleCheckStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => f.write_str("memory"),
            Self::StoreClosure => f.write_str("store"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTreeConfig {
    /// libsql database file
    pub database_path: PathBuf,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout_ms: u64,

    /// Cycle check used by moves
    pub cycle_check: CycleCheckStrategy,
}

impl Default for DocTreeConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            cycle_check: CycleCheckStrategy::default(),
        }
    }
}

/// `~/.doctree/database/doctree.db`, or relative to the working directory
/// when no home directory can be determined.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".doctree")
        .join("database")
        .join("doctree.db")
}

impl DocTreeConfig {
    /// Build a configuration from the process environment.
    ///
    /// - `DOCTREE_DB_PATH`: database file
    /// - `DOCTREE_BUSY_TIMEOUT_MS`: busy timeout in milliseconds
    /// - `DOCTREE_CYCLE_CHECK`: `memory` or `store`
    ///
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("DOCTREE_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(timeout) = lookup("DOCTREE_BUSY_TIMEOUT_MS") {
            config.busy_timeout_ms = timeout.trim().parse().map_err(|e| {
                anyhow::anyhow!("Invalid DOCTREE_BUSY_TIMEOUT_MS '{}': {}", timeout, e)
            })?;
        }

        if let Some(strategy) = lookup("DOCTREE_CYCLE_CHECK") {
            config.cycle_check = strategy
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid DOCTREE_CYCLE_CHECK: {}", e))?;
        }

        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("database_path cannot be empty".to_string());
        }

        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(format!(
                "busy_timeout_ms cannot exceed {}",
                MAX_BUSY_TIMEOUT_MS
            ));
        }

        Ok(())
    }
}
