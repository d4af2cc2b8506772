//! Engine configuration DTO

use crate::domain::services::DEFAULT_MAX_VERSION_FILE_SIZE;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const ENV_SYSTEM_DIR: &str = "DELPHI_SYSTEM_DIR";
pub const ENV_LOCAL_DIR: &str = "DELPHI_LOCAL_DIR";
pub const ENV_USER_DIR: &str = "DELPHI_USER_DIR";
pub const ENV_DB_PATH: &str = "DELPHI_DB_PATH";

const DEFAULT_SYSTEM_DIR: &str = "/usr/share/delphi/db";
const DEFAULT_LOCAL_DIR: &str = "/etc/delphi/db";

/// Options for building an identification engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Database sources in load order; later sources override earlier ones
    pub database_paths: Vec<PathBuf>,
    /// Start from the definitions compiled into the binary
    pub builtin_signatures: bool,
    /// Cap on bytes read from each version file
    pub max_version_file_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_paths: default_database_paths(),
            builtin_signatures: true,
            max_version_file_size: DEFAULT_MAX_VERSION_FILE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Configuration from the process environment
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Replaces the database search path
    pub fn with_database_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.database_paths = paths;
        self
    }

    pub fn with_builtin_signatures(mut self, enabled: bool) -> Self {
        self.builtin_signatures = enabled;
        self
    }

    pub fn with_max_version_file_size(mut self, size: usize) -> Self {
        self.max_version_file_size = size;
        self
    }

    /// Search path entries that exist on disk
    pub fn existing_database_paths(&self) -> Vec<PathBuf> {
        self.database_paths
            .iter()
            .filter(|path| path.exists())
            .cloned()
            .collect()
    }
}

/// The default database search path read from the environment.
pub fn default_database_paths() -> Vec<PathBuf> {
    database_paths_from(|key| env::var(key).ok())
}

/// Builds the search path from a variable lookup.
///
/// `DELPHI_DB_PATH` (colon separated) replaces the whole list; otherwise
/// the system, local and user directories are used in that order.
pub fn database_paths_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(list) = lookup(ENV_DB_PATH) {
        return env::split_paths(&list).collect();
    }

    let mut paths = vec![
        lookup(ENV_SYSTEM_DIR).map_or_else(|| PathBuf::from(DEFAULT_SYSTEM_DIR), PathBuf::from),
        lookup(ENV_LOCAL_DIR).map_or_else(|| PathBuf::from(DEFAULT_LOCAL_DIR), PathBuf::from),
    ];

    let user_dir = lookup(ENV_USER_DIR).map(PathBuf::from).or_else(|| {
        lookup("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| lookup("HOME").map(|home| PathBuf::from(home).join(".config")))
            .map(|config| config.join("delphi").join("db"))
    });
    paths.extend(user_dir);

    paths
}
