//! ratchet configuration
//!
//! ```toml
//! [database]
//! project = "my-project"
//! instance = "my-instance"
//! database = "my-db"
//!
//! [plan]
//! mode = "batch"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RatchetError, RatchetResult};
use crate::sink::ApplyMode;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "ratchet.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub plan: PlanSection,
}

/// Database coordinates. Any field may be left to flags or environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DatabaseSection {
    pub project: Option<String>,
    pub instance: Option<String>,
    pub database: Option<String>,
}

/// Planner and sink settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanSection {
    #[serde(default)]
    pub mode: ApplyMode,
}

/// A fully resolved database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

impl Config {
    pub fn from_toml(content: &str) -> RatchetResult<Self> {
        toml::from_str(content).map_err(|e| RatchetError::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the first of
    /// [`Config::default_paths`] that exists is used, falling back to defaults.
    pub fn load(path: Option<&Path>) -> RatchetResult<Self> {
        if let Some(path) = path {
            return Self::read(path);
        }
        match Self::default_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> RatchetResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RatchetError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    /// `./ratchet.toml`, then `<config dir>/ratchet/config.toml`.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("ratchet").join("config.toml"));
        }
        paths
    }

    /// Resolve the target database, preferring `overrides` over the file.
    ///
    /// Returns `None` when nothing is configured at all.
    pub fn database_target(
        &self,
        overrides: &DatabaseSection,
    ) -> RatchetResult<Option<DatabaseTarget>> {
        let pick = |flag: &Option<String>, file: &Option<String>| {
            let set = |v: &&String| !v.is_empty();
            flag.as_ref()
                .filter(set)
                .or_else(|| file.as_ref().filter(set))
                .cloned()
        };
        let project = pick(&overrides.project, &self.database.project);
        let instance = pick(&overrides.instance, &self.database.instance);
        let database = pick(&overrides.database, &self.database.database);

        match (project, instance, database) {
            (None, None, None) => Ok(None),
            (Some(project), Some(instance), Some(database)) => Ok(Some(DatabaseTarget {
                project,
                instance,
                database,
            })),
            (None, _, _) => Err(missing("project", "-p, --project", "SPANNER_PROJECT_ID")),
            (_, None, _) => Err(missing("instance", "-i, --instance", "SPANNER_INSTANCE_ID")),
            (_, _, None) => Err(missing("database", "-d, --database", "SPANNER_DATABASE_ID")),
        }
    }
}

fn missing(what: &str, flags: &str, env: &str) -> RatchetError {
    RatchetError::Config(format!("Please specify {} by {} or {}", what, flags, env))
}
