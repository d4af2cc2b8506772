//! Result rendering

use crate::application::dto::IdentificationReport;
use crate::domain::entities::ClassificationResult;
use std::path::Path;

pub const TOKEN_INVALID: &str = "Invalid";
pub const TOKEN_UNKNOWN: &str = "Unknown";

/// The single token the CLI prints for a result.
pub fn token(result: &ClassificationResult) -> &str {
    match result {
        ClassificationResult::Identified { family, .. } => family.as_str(),
        ClassificationResult::BootableUnknown => TOKEN_UNKNOWN,
        ClassificationResult::NotBootable | ClassificationResult::InvalidMedia { .. } => {
            TOKEN_INVALID
        }
    }
}

/// One `path<TAB>token` line for batch output
pub fn batch_line(path: &Path, result: &ClassificationResult) -> String {
    format!("{}\t{}", path.display(), token(result))
}

pub fn report_json(reports: &[IdentificationReport]) -> serde_json::Result<String> {
    match reports {
        [single] => serde_json::to_string_pretty(single),
        many => serde_json::to_string_pretty(many),
    }
}
