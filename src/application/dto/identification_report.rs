//! Identification report DTO

use crate::domain::entities::{
    BootEvidence, ClassificationResult, Fingerprint, MediaFormat, SignatureEntry,
};
use serde::Serialize;
use std::path::PathBuf;

/// A matching signature, as listed in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
    pub os_id: String,
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub predicates: usize,
}

impl From<&SignatureEntry> for CandidateSummary {
    fn from(entry: &SignatureEntry) -> Self {
        Self {
            os_id: entry.os_id().to_string(),
            family: entry.family().to_string(),
            version: entry.version().map(str::to_string),
            name: entry.name().map(str::to_string),
            predicates: entry.predicate_count(),
        }
    }
}

/// Everything learned while identifying one source
///
/// Stages that did not run leave their fields empty: an unopenable source
/// has no format, a non-bootable one no fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct IdentificationReport {
    pub source_path: PathBuf,
    pub result: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<MediaFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<BootEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateSummary>,
}

impl IdentificationReport {
    pub fn new(source_path: impl Into<PathBuf>, result: ClassificationResult) -> Self {
        Self {
            source_path: source_path.into(),
            result,
            format: None,
            size_bytes: None,
            evidence: None,
            fingerprint: None,
            candidates: Vec::new(),
        }
    }
}
