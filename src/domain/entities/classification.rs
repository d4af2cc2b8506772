//! Classification result
//!
//! The outcome of one identification request. Expected negative outcomes
//! are variants here, never errors.

use serde::Serialize;
use std::fmt;

/// Why a medium could not be classified at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidMediaReason {
    /// The source could not be opened or read
    Unreadable(String),
    /// The bytes carry no structure any probe recognises
    UnrecognizedFormat,
}

impl fmt::Display for InvalidMediaReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMediaReason::Unreadable(detail) => write!(f, "unreadable: {}", detail),
            InvalidMediaReason::UnrecognizedFormat => write!(f, "unrecognized format"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ClassificationResult {
    Identified {
        family: String,
        os_id: String,
        version: Option<String>,
    },
    BootableUnknown,
    NotBootable,
    InvalidMedia {
        reason: InvalidMediaReason,
    },
}

impl ClassificationResult {
    pub fn is_identified(&self) -> bool {
        matches!(self, ClassificationResult::Identified { .. })
    }

    pub fn family(&self) -> Option<&str> {
        match self {
            ClassificationResult::Identified { family, .. } => Some(family),
            _ => None,
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationResult::Identified {
                family,
                os_id,
                version: Some(version),
            } => write!(f, "{} ({} {})", family, os_id, version),
            ClassificationResult::Identified { family, os_id, .. } => {
                write!(f, "{} ({})", family, os_id)
            }
            ClassificationResult::BootableUnknown => write!(f, "bootable, unknown OS"),
            ClassificationResult::NotBootable => write!(f, "not bootable"),
            ClassificationResult::InvalidMedia { reason } => write!(f, "invalid media: {}", reason),
        }
    }
}
