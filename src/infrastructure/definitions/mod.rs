//! Signature definition files
//!
//! JSON schema types, compilation into domain entities and the
//! file/directory loader for `Database`.

mod loader;
mod schema;

pub use loader::{BUILTIN_DEFINITIONS, definition_files, read_source};
pub use schema::{MatchDefinition, SCHEMA_VERSION, SignatureDefinition, SignatureSchema};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from signature loading
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON parse error{}: {source}", display_path(.path))]
    Json {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported schema version {found}, expected <= {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid signature: {0}")]
    Invalid(String),

    #[error("Invalid regex pattern '{pattern}': {error}")]
    InvalidRegex { pattern: String, error: String },
}

impl From<serde_json::Error> for LoadError {
    fn from(source: serde_json::Error) -> Self {
        LoadError::Json { path: None, source }
    }
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attaches the definition file a parse or validation error came from.
    pub(crate) fn in_file(self, file: &Path) -> Self {
        match self {
            LoadError::Json { path: None, source } => LoadError::Json {
                path: Some(file.to_path_buf()),
                source,
            },
            LoadError::Invalid(message) => {
                LoadError::Invalid(format!("{}: {}", file.display(), message))
            }
            other => other,
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}
