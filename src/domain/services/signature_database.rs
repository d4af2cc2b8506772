//! Signature database service
//!
//! In-memory, immutable-after-load collection of OS signatures. Entries
//! are kept in load order; `os_id` keys are unique.

use crate::domain::entities::{BootEvidence, Fingerprint, SignatureEntry};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Queryable collection of known OS/media signatures
///
/// # Example
///
/// ```
/// use delphi::domain::entities::{
///     BootEvidence, BootMechanism, Fingerprint, MatchRule, SignatureEntry,
/// };
/// use delphi::domain::services::Database;
/// use regex::Regex;
///
/// let mut db = Database::new();
/// db.merge(vec![SignatureEntry::new("win10", "winnt")
///     .with_version("10")
///     .with_rule(MatchRule::VolumeLabel(Regex::new("^WIN10$").unwrap()))]);
///
/// let evidence = BootEvidence::bootable(BootMechanism::ElTorito);
/// let entry = db.find_match(&evidence, &Fingerprint::new("WIN10")).unwrap();
/// assert_eq!(entry.family(), "winnt");
/// ```
#[derive(Debug, Default)]
pub struct Database {
    entries: Vec<SignatureEntry>,
    index: HashMap<String, usize>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entries in order.
    ///
    /// An entry whose `os_id` is already present replaces the earlier one
    /// in place, keeping the earlier load position.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = SignatureEntry>) {
        for entry in entries {
            match self.index.get(entry.os_id()) {
                Some(&position) => {
                    tracing::debug!("Signature {} overridden by later definition", entry.os_id());
                    self.entries[position] = entry;
                }
                None => {
                    self.index.insert(entry.os_id().to_string(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
    }

    pub fn get(&self, os_id: &str) -> Option<&SignatureEntry> {
        self.index.get(os_id).map(|&i| &self.entries[i])
    }

    /// Entries in load order
    pub fn entries(&self) -> impl Iterator<Item = &SignatureEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every fully matching entry, best first.
    ///
    /// Ranking: a non-empty version beats none, then more predicates win,
    /// then the entry loaded first wins.
    pub fn candidates(
        &self,
        evidence: &BootEvidence,
        fingerprint: &Fingerprint,
    ) -> Vec<&SignatureEntry> {
        let mut matched: Vec<&SignatureEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.matches(evidence, fingerprint))
            .collect();

        // Stable sort keeps load order among equals
        matched.sort_by_key(|entry| {
            (
                Reverse(entry.has_version()),
                Reverse(entry.predicate_count()),
            )
        });
        matched
    }

    /// The single best matching entry, if any.
    pub fn find_match(
        &self,
        evidence: &BootEvidence,
        fingerprint: &Fingerprint,
    ) -> Option<&SignatureEntry> {
        self.candidates(evidence, fingerprint).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{BootMechanism, MatchRule};
    use regex::Regex;
    use rstest::{fixture, rstest};

    fn label(pattern: &str) -> MatchRule {
        MatchRule::VolumeLabel(Regex::new(pattern).unwrap())
    }

    #[fixture]
    fn evidence() -> BootEvidence {
        BootEvidence::bootable(BootMechanism::ElTorito)
    }

    #[rstest]
    fn test_merge_keeps_position_on_override(evidence: BootEvidence) {
        let mut db = Database::new();
        db.merge(vec![
            SignatureEntry::new("a", "linux").with_rule(label("^A$")),
            SignatureEntry::new("b", "linux").with_rule(label("^B$")),
        ]);
        db.merge(vec![SignatureEntry::new("a", "bsd").with_rule(label("^A$"))]);

        assert_eq!(db.len(), 2);
        let ids: Vec<_> = db.entries().map(|e| e.os_id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(db.get("a").unwrap().family(), "bsd");
        assert_eq!(
            db.find_match(&evidence, &Fingerprint::new("A")).unwrap().family(),
            "bsd"
        );
    }

    #[rstest]
    fn test_versioned_entry_wins(evidence: BootEvidence) {
        let mut db = Database::new();
        db.merge(vec![
            SignatureEntry::new("generic", "winnt")
                .with_rule(label("^WIN"))
                .with_rule(MatchRule::BootMechanism(BootMechanism::ElTorito)),
            SignatureEntry::new("win10", "winnt")
                .with_version("10")
                .with_rule(label("^WIN")),
        ]);

        let best = db.find_match(&evidence, &Fingerprint::new("WIN10")).unwrap();
        assert_eq!(best.os_id(), "win10");
    }

    #[rstest]
    fn test_more_predicates_then_load_order(evidence: BootEvidence) {
        let mut db = Database::new();
        db.merge(vec![
            SignatureEntry::new("first", "linux").with_rule(label("^LIVE")),
            SignatureEntry::new("second", "linux").with_rule(label("^LIVE")),
            SignatureEntry::new("specific", "linux")
                .with_rule(label("^LIVE"))
                .with_rule(MatchRule::BootMechanism(BootMechanism::ElTorito)),
        ]);

        let ranked: Vec<_> = db
            .candidates(&evidence, &Fingerprint::new("LIVE"))
            .into_iter()
            .map(|e| e.os_id())
            .collect();
        assert_eq!(ranked, vec!["specific", "first", "second"]);
    }

    #[rstest]
    fn test_no_match(evidence: BootEvidence) {
        let mut db = Database::new();
        db.merge(vec![SignatureEntry::new("a", "linux").with_rule(label("^A$"))]);
        assert!(db.find_match(&evidence, &Fingerprint::new("Z")).is_none());
        assert!(Database::new().is_empty());
    }
}
