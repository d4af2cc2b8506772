//! Versioned JSON definition schema
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "signatures": [
//!     {
//!       "os_id": "win10",
//!       "family": "winnt",
//!       "version": "10",
//!       "match": {
//!         "volume_label": "^(J_)?(CCSN?A|C?CCOMA)_X64FREE?_",
//!         "marker_files": ["sources/install.wim"],
//!         "boot_mechanism": "el_torito"
//!       }
//!     }
//!   ]
//! }
//! ```

use super::LoadError;
use crate::domain::entities::{BootMechanism, MatchRule, SignatureEntry};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Highest schema version this build understands
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSchema {
    pub schema_version: u32,

    #[serde(default)]
    pub signatures: Vec<SignatureDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureDefinition {
    pub os_id: String,
    pub family: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "match")]
    pub rules: MatchDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marker_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_mechanism: Option<BootMechanism>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl SignatureSchema {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let schema: SignatureSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: self.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    /// Compiles every definition, failing on the first bad one.
    pub fn compile(&self) -> Result<Vec<SignatureEntry>, LoadError> {
        self.signatures
            .iter()
            .map(SignatureDefinition::compile)
            .collect()
    }
}

impl SignatureDefinition {
    pub fn compile(&self) -> Result<SignatureEntry, LoadError> {
        if self.os_id.trim().is_empty() {
            return Err(LoadError::Invalid("os_id cannot be empty".into()));
        }
        if self.family.trim().is_empty() {
            return Err(LoadError::Invalid(format!(
                "{}: family cannot be empty",
                self.os_id
            )));
        }

        let rules = self.rules.compile()?;
        if rules.is_empty() {
            return Err(LoadError::Invalid(format!(
                "{}: at least one match predicate is required",
                self.os_id
            )));
        }

        let mut entry = SignatureEntry::new(&self.os_id, &self.family);
        if let Some(version) = &self.version {
            entry = entry.with_version(version);
        }
        if let Some(name) = &self.name {
            entry = entry.with_name(name);
        }
        Ok(rules.into_iter().fold(entry, SignatureEntry::with_rule))
    }
}

impl MatchDefinition {
    fn compile(&self) -> Result<Vec<MatchRule>, LoadError> {
        let mut rules = Vec::new();

        if let Some(pattern) = &self.volume_label {
            rules.push(MatchRule::VolumeLabel(compile_regex(pattern)?));
        }
        for path in &self.marker_files {
            if path.trim_matches(['/', '\\']).is_empty() {
                return Err(LoadError::Invalid("marker file path cannot be empty".into()));
            }
            rules.push(MatchRule::MarkerFile(path.clone()));
        }
        if let Some(kind) = self.boot_mechanism {
            rules.push(MatchRule::BootMechanism(kind));
        }
        if let Some(pattern) = &self.version_string {
            rules.push(MatchRule::VersionString(compile_regex(pattern)?));
        }
        if let Some(pattern) = &self.system_id {
            rules.push(MatchRule::SystemId(compile_regex(pattern)?));
        }
        if let Some(pattern) = &self.publisher_id {
            rules.push(MatchRule::PublisherId(compile_regex(pattern)?));
        }
        if let Some(pattern) = &self.application_id {
            rules.push(MatchRule::ApplicationId(compile_regex(pattern)?));
        }

        Ok(rules)
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, LoadError> {
    Regex::new(pattern).map_err(|e| LoadError::InvalidRegex {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })
}
