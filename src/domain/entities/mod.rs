//! Domain entities
//!
//! Core objects of the identification domain: what a medium is, how it
//! boots, what it carries and what it was classified as.

mod boot_evidence;
mod classification;
mod fingerprint;
mod media_format;
mod signature_entry;

pub use boot_evidence::{BootEvidence, BootMechanism, BootPlatform};
pub use classification::{ClassificationResult, InvalidMediaReason};
pub use fingerprint::{Fingerprint, normalize_marker};
pub use media_format::MediaFormat;
pub use signature_entry::{MatchRule, SignatureEntry};
