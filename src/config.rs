/// Storage configuration
///
/// Which backend is active and where it keeps its data. The binary fills this
/// in from command line arguments; library users build it directly.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// SQLite database file
    #[default]
    Relational,
    /// JSON key-value store file
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Relational => f.write_str("relational"),
            BackendKind::Local => f.write_str("local"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relational" | "sqlite" => Ok(BackendKind::Relational),
            "local" | "kv" => Ok(BackendKind::Local),
            other => Err(format!(
                "Invalid backend '{}'. Valid options: relational, local",
                other
            )),
        }
    }
}

/// Everything needed to open a storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// SQLite file used by the relational backend
    pub database_path: PathBuf,
    /// JSON file used by the key-value backend
    pub local_store_path: PathBuf,
    /// Create the `demo`/`password` account in the key-value backend
    pub seed_demo_user: bool,
}

impl StorageConfig {
    /// Default file locations inside `data_dir`
    pub fn in_dir(backend: BackendKind, data_dir: PathBuf) -> Self {
        Self {
            backend,
            database_path: data_dir.join("habits.db"),
            local_store_path: data_dir.join("local_store.json"),
            seed_demo_user: false,
        }
    }
}

/// Find a writable data directory
///
/// Tries the home directory, then the platform data and config directories,
/// then the working directory, and finally the system temp directory.
pub fn default_data_dir() -> std::io::Result<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|p| p.join(".quest_tracker")),
        dirs::data_dir().map(|p| p.join("quest_tracker")),
        dirs::config_dir().map(|p| p.join("quest_tracker")),
        std::env::current_dir().ok().map(|p| p.join(".quest_tracker")),
    ];

    for candidate in candidates.iter().flatten() {
        if std::fs::create_dir_all(candidate).is_ok() && is_writable(candidate) {
            return Ok(candidate.clone());
        }
    }

    let fallback = std::env::temp_dir().join("quest_tracker");
    std::fs::create_dir_all(&fallback)?;
    tracing::warn!("Using temporary directory for data: {}", fallback.display());
    Ok(fallback)
}

fn is_writable(dir: &std::path::Path) -> bool {
    let probe = dir.join(".write_test");
    if std::fs::write(&probe, b"ok").is_err() {
        return false;
    }
    let _ = std::fs::remove_file(&probe);
    true
}
