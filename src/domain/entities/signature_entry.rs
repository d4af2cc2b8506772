//! Signature entry entity
//!
//! One recognisable OS/media combination and the structural predicates
//! that must all hold for a medium to be identified as it.

use super::{BootEvidence, BootMechanism, Fingerprint};
use regex::Regex;
use std::fmt;

/// A single structural predicate
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Volume label must match
    VolumeLabel(Regex),
    /// Relative path that must exist on the medium
    MarkerFile(String),
    /// Boot mechanism that must have been detected
    BootMechanism(BootMechanism),
    /// At least one extracted version string must match
    VersionString(Regex),
    SystemId(Regex),
    PublisherId(Regex),
    ApplicationId(Regex),
}

impl MatchRule {
    pub fn is_satisfied(&self, evidence: &BootEvidence, fingerprint: &Fingerprint) -> bool {
        match self {
            MatchRule::VolumeLabel(re) => re.is_match(&fingerprint.volume_label),
            MatchRule::MarkerFile(path) => fingerprint.has_marker(path),
            MatchRule::BootMechanism(kind) => evidence.boot_mechanism == *kind,
            MatchRule::VersionString(re) => {
                fingerprint.version_strings.iter().any(|line| re.is_match(line))
            }
            MatchRule::SystemId(re) => re.is_match(&fingerprint.system_id),
            MatchRule::PublisherId(re) => re.is_match(&fingerprint.publisher_id),
            MatchRule::ApplicationId(re) => re.is_match(&fingerprint.application_id),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::VolumeLabel(re) => write!(f, "volume_label ~ /{}/", re.as_str()),
            MatchRule::MarkerFile(path) => write!(f, "marker_file {}", path),
            MatchRule::BootMechanism(kind) => write!(f, "boot_mechanism = {}", kind),
            MatchRule::VersionString(re) => write!(f, "version_string ~ /{}/", re.as_str()),
            MatchRule::SystemId(re) => write!(f, "system_id ~ /{}/", re.as_str()),
            MatchRule::PublisherId(re) => write!(f, "publisher_id ~ /{}/", re.as_str()),
            MatchRule::ApplicationId(re) => write!(f, "application_id ~ /{}/", re.as_str()),
        }
    }
}

/// A known operating system signature
///
/// Immutable once loaded; owned by the signature database.
#[derive(Debug, Clone)]
pub struct SignatureEntry {
    os_id: String,
    family: String,
    version: Option<String>,
    name: Option<String>,
    match_rules: Vec<MatchRule>,
}

impl SignatureEntry {
    pub fn new(os_id: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            os_id: os_id.into(),
            family: family.into(),
            version: None,
            name: None,
            match_rules: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.match_rules.push(rule);
        self
    }

    pub fn os_id(&self) -> &str {
        &self.os_id
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn match_rules(&self) -> &[MatchRule] {
        &self.match_rules
    }

    pub fn predicate_count(&self) -> usize {
        self.match_rules.len()
    }

    /// True when the entry carries a non-empty version
    pub fn has_version(&self) -> bool {
        self.version.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// An entry matches when every predicate holds.
    pub fn matches(&self, evidence: &BootEvidence, fingerprint: &Fingerprint) -> bool {
        !self.match_rules.is_empty()
            && self
                .match_rules
                .iter()
                .all(|rule| rule.is_satisfied(evidence, fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win10() -> SignatureEntry {
        SignatureEntry::new("win10", "winnt")
            .with_version("10")
            .with_rule(MatchRule::VolumeLabel(Regex::new("^WIN10$").unwrap()))
            .with_rule(MatchRule::BootMechanism(BootMechanism::ElTorito))
    }

    #[test]
    fn test_all_rules_must_hold() {
        let evidence = BootEvidence::bootable(BootMechanism::ElTorito);
        let entry = win10();

        assert!(entry.matches(&evidence, &Fingerprint::new("WIN10")));
        assert!(!entry.matches(&evidence, &Fingerprint::new("UBUNTU")));
        assert!(!entry.matches(
            &BootEvidence::bootable(BootMechanism::HybridMbr),
            &Fingerprint::new("WIN10")
        ));
    }

    #[test]
    fn test_entry_without_rules_never_matches() {
        let entry = SignatureEntry::new("empty", "linux");
        assert!(!entry.matches(&BootEvidence::default(), &Fingerprint::default()));
    }

    #[test]
    fn test_version_string_rule() {
        let rule = MatchRule::VersionString(Regex::new("^Ubuntu 22\\.04").unwrap());
        let mut fp = Fingerprint::default();
        fp.version_strings.push("Ubuntu 22.04.3 LTS \"Jammy Jellyfish\"".into());
        assert!(rule.is_satisfied(&BootEvidence::default(), &fp));
    }

    #[test]
    fn test_has_version_ignores_empty() {
        assert!(win10().has_version());
        assert!(!SignatureEntry::new("x", "y").with_version("").has_version());
    }
}
