//! Fingerprint entity
//!
//! Identifying evidence pulled off a medium: labels, marker files and
//! version strings.

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Fingerprint {
    pub volume_label: String,
    /// Normalised relative paths of the marker files found
    pub marker_files: BTreeSet<String>,
    /// Lines read from version files, in probe order
    pub version_strings: Vec<String>,
    pub system_id: String,
    pub publisher_id: String,
    pub application_id: String,
}

impl Fingerprint {
    pub fn new(volume_label: impl Into<String>) -> Self {
        Self {
            volume_label: volume_label.into(),
            ..Default::default()
        }
    }

    pub fn add_marker(&mut self, path: &str) {
        self.marker_files.insert(normalize_marker(path));
    }

    /// Case-insensitive, separator-agnostic marker lookup
    pub fn has_marker(&self, path: &str) -> bool {
        self.marker_files.contains(&normalize_marker(path))
    }
}

/// Lowercases, converts `\` to `/` and strips leading/trailing separators.
pub fn normalize_marker(path: &str) -> String {
    path.replace('\\', "/")
        .trim_matches('/')
        .to_lowercase()
}
