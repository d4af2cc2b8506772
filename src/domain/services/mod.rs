//! Domain services
//!
//! Analysis and matching logic that operates on domain entities through
//! the repository traits.

mod boot_analyzer;
mod fingerprint_extractor;
mod signature_database;

pub use boot_analyzer::BootAnalyzer;
pub use fingerprint_extractor::{
    DEFAULT_MAX_VERSION_FILE_SIZE, FingerprintExtractor, MARKER_FILES, VERSION_FILES,
    version_lines,
};
pub use signature_database::Database;
