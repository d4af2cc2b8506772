//! Identify media use case
//!
//! Orchestrates one identification request: open the medium, analyze its
//! boot structures, extract a fingerprint and match it against the
//! signature database.

use crate::application::dto::{CandidateSummary, EngineConfig, IdentificationReport};
use crate::domain::entities::{
    BootEvidence, ClassificationResult, Fingerprint, InvalidMediaReason, SignatureEntry,
};
use crate::domain::repositories::{MediaError, MediaSource};
use crate::domain::services::{BootAnalyzer, Database, FingerprintExtractor};
use crate::infrastructure::media;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Operational failures after a medium was opened successfully
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("Media read failed: {0}")]
    Media(#[from] MediaError),
}

/// Outcome of the stages that run against an opened medium
struct Examination<'db> {
    evidence: BootEvidence,
    fingerprint: Option<Fingerprint>,
    candidates: Vec<&'db SignatureEntry>,
}

impl Examination<'_> {
    fn result(&self) -> ClassificationResult {
        if !self.evidence.is_bootable {
            return ClassificationResult::NotBootable;
        }
        match self.candidates.first() {
            Some(entry) => ClassificationResult::Identified {
                family: entry.family().to_string(),
                os_id: entry.os_id().to_string(),
                version: entry.version().map(str::to_string),
            },
            None => ClassificationResult::BootableUnknown,
        }
    }
}

/// Identification engine
///
/// Borrows a caller-built database; one engine can serve any number of
/// requests, sequentially or in parallel.
///
/// # Example
///
/// ```no_run
/// use delphi::application::Identifier;
/// use delphi::domain::services::Database;
///
/// let db = Database::load("/usr/share/delphi/db")?;
/// let result = Identifier::new(&db).identify("install.iso")?;
/// println!("{}", result);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Identifier<'db> {
    database: &'db Database,
    analyzer: BootAnalyzer,
    extractor: FingerprintExtractor,
}

impl<'db> Identifier<'db> {
    pub fn new(database: &'db Database) -> Self {
        Self {
            database,
            analyzer: BootAnalyzer::new(),
            extractor: FingerprintExtractor::new(),
        }
    }

    pub fn with_config(database: &'db Database, config: &EngineConfig) -> Self {
        Self {
            database,
            analyzer: BootAnalyzer::new(),
            extractor: FingerprintExtractor::new()
                .with_max_version_file_size(config.max_version_file_size),
        }
    }

    /// Classifies the medium at `path`.
    ///
    /// Media that cannot be opened or recognised is `InvalidMedia`; only a
    /// read failure after a successful open is an error.
    pub fn identify(&self, path: impl AsRef<Path>) -> Result<ClassificationResult, IdentifyError> {
        self.identify_detailed(path).map(|report| report.result)
    }

    /// Classifies an already opened medium.
    pub fn identify_media(
        &self,
        source: &dyn MediaSource,
    ) -> Result<ClassificationResult, IdentifyError> {
        Ok(self.examine(source)?.result())
    }

    /// Classifies the medium at `path` and keeps the intermediate evidence.
    pub fn identify_detailed(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<IdentificationReport, IdentifyError> {
        let path = path.as_ref();
        tracing::debug!("Identifying {}", path.display());

        let handle = match media::open(path) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!("Open failed for {}: {}", path.display(), e);
                let reason = invalid_reason(e);
                return Ok(IdentificationReport::new(
                    path,
                    ClassificationResult::InvalidMedia { reason },
                ));
            }
        };

        let examination = self.examine(&handle)?;
        let result = examination.result();
        tracing::debug!("{}: {}", path.display(), result);

        let mut report = IdentificationReport::new(path, result);
        report.format = Some(handle.format());
        report.size_bytes = Some(handle.size_bytes());
        report.candidates = examination
            .candidates
            .iter()
            .map(|entry| CandidateSummary::from(*entry))
            .collect();
        report.evidence = Some(examination.evidence);
        report.fingerprint = examination.fingerprint;

        handle.close();
        Ok(report)
    }

    /// Classifies several media in parallel, results in input order.
    pub fn identify_many<P>(
        &self,
        paths: &[P],
    ) -> Vec<(PathBuf, Result<ClassificationResult, IdentifyError>)>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                (path.to_path_buf(), self.identify(path))
            })
            .collect()
    }

    fn examine(&self, source: &dyn MediaSource) -> Result<Examination<'db>, IdentifyError> {
        let evidence = self.analyzer.analyze(source)?;
        tracing::debug!(
            "Boot evidence: bootable={} mechanism={}",
            evidence.is_bootable,
            evidence.boot_mechanism
        );

        if !evidence.is_bootable {
            return Ok(Examination {
                evidence,
                fingerprint: None,
                candidates: Vec::new(),
            });
        }

        let fingerprint = self.extractor.extract(source)?;
        let candidates = self.database.candidates(&evidence, &fingerprint);
        tracing::debug!(
            "{} of {} signature(s) matched",
            candidates.len(),
            self.database.len()
        );

        Ok(Examination {
            evidence,
            fingerprint: Some(fingerprint),
            candidates,
        })
    }
}

fn invalid_reason(error: MediaError) -> InvalidMediaReason {
    match error {
        MediaError::Unreadable(detail) => InvalidMediaReason::Unreadable(detail),
        MediaError::NotFound(path) => {
            InvalidMediaReason::Unreadable(format!("not found: {}", path))
        }
        MediaError::UnrecognizedFormat | MediaError::OutOfRange { .. } => {
            InvalidMediaReason::UnrecognizedFormat
        }
    }
}
