//! The signature table: known failure substrings and what to do about them.
//!
//! The table document is a JSON object whose keys are [`ErrorSignature`]s and
//! whose values are [`RemediationRule`]s:
//!
//! ```json
//! {
//!   "SkuNotAvailable": {
//!     "update_tfvars": { "vm_size": "Standard_D4s_v5" },
//!     "warn": "Requested VM size unavailable, fell back to Standard_D4s_v5"
//!   },
//!   "RetryableError": {}
//! }
//! ```
//!
//! Matching is first-match in document order. The table keeps that order
//! explicitly instead of relying on map iteration order, so precedence between
//! overlapping signatures is deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ErrorSignature, FailureClass, Variables};

// ---------------------------------------------------------------------------
// Remediation
// ---------------------------------------------------------------------------

/// Corrective action attached to a recognised failure.
///
/// Both parts are optional; an empty rule simply means "retry as-is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemediationRule {
    /// Variables to merge into the variable store before the next attempt.
    #[serde(default, rename = "update_tfvars", skip_serializing_if = "Option::is_none")]
    pub update: Option<Variables>,

    /// Warning surfaced once the command eventually succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<String>,
}

impl RemediationRule {
    /// Returns the variable updates, if the rule carries any non-empty set.
    pub fn updates(&self) -> Option<&Variables> {
        self.update.as_ref().filter(|u| !u.is_empty())
    }

    /// Returns the warning text, if the rule carries a non-empty one.
    pub fn warning(&self) -> Option<&str> {
        self.warn.as_deref().filter(|w| !w.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Problems found while parsing a signature table document.
#[derive(Debug, Error)]
pub enum TableError {
    /// The document is not a JSON object of remediation rules.
    #[error("malformed signature table: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A key is the empty string, which would match every failure.
    #[error("signature table contains an empty error signature")]
    EmptySignature,
}

/// Ordered mapping from [`ErrorSignature`] to [`RemediationRule`].
///
/// Immutable once built. Signatures are unique; inserting an existing
/// signature replaces its rule but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureTable {
    entries: IndexMap<ErrorSignature, RemediationRule>,
}

impl SignatureTable {
    /// Builds a table from `(signature, rule)` pairs, preserving their order.
    pub fn from_entries(entries: impl IntoIterator<Item = (ErrorSignature, RemediationRule)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parses a table document, keeping the key order of the document.
    pub fn from_json_str(document: &str) -> Result<Self, TableError> {
        let raw: IndexMap<String, RemediationRule> = serde_json::from_str(document)?;
        let entries = raw
            .into_iter()
            .map(|(key, rule)| {
                ErrorSignature::new(key)
                    .map(|sig| (sig, rule))
                    .ok_or(TableError::EmptySignature)
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;
        Ok(Self { entries })
    }

    /// Number of signatures in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no signatures; every failure is then terminal.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in match-precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (&ErrorSignature, &RemediationRule)> {
        self.entries.iter()
    }

    /// Classifies a failed run by its captured stderr.
    ///
    /// Returns the first entry, in table order, whose signature occurs in
    /// `stderr`. Only that one rule is acted upon even when several match.
    pub fn classify(&self, stderr: &str) -> FailureClass<'_> {
        self.entries
            .iter()
            .find(|(signature, _)| signature.matches(stderr))
            .map_or(FailureClass::NonRetryable, |(signature, rule)| {
                FailureClass::Retryable { signature, rule }
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sig(s: &str) -> ErrorSignature {
        ErrorSignature::new(s).unwrap()
    }

    #[test]
    fn parses_rules_in_document_order() {
        let table = SignatureTable::from_json_str(
            r#"{
                "zeta": {"warn": "last letter"},
                "alpha": {"update_tfvars": {"vm_size": "Standard_D4"}},
                "mid": {}
            }"#,
        )
        .unwrap();

        let keys: Vec<_> = table.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let (_, alpha) = table.iter().nth(1).unwrap();
        assert_eq!(alpha.updates().unwrap().get("vm_size"), Some(&json!("Standard_D4")));
        assert!(alpha.warning().is_none());
    }

    #[test]
    fn first_matching_signature_wins() {
        let table = SignatureTable::from_entries([
            (sig("timeout"), RemediationRule { warn: Some("first".into()), update: None }),
            (sig("connection timeout"), RemediationRule { warn: Some("second".into()), update: None }),
        ]);

        match table.classify("Error: connection timeout while polling") {
            FailureClass::Retryable { signature, rule } => {
                assert_eq!(signature.as_str(), "timeout");
                assert_eq!(rule.warning(), Some("first"));
            }
            FailureClass::NonRetryable => panic!("expected a match"),
        }
    }

    #[test]
    fn unmatched_stderr_is_not_retryable() {
        let table = SignatureTable::from_entries([(sig("disk full"), RemediationRule::default())]);
        assert_eq!(table.classify("permission denied"), FailureClass::NonRetryable);
    }

    #[test]
    fn empty_table_never_retries() {
        let table = SignatureTable::default();
        assert!(table.is_empty());
        assert!(!table.classify("anything at all").is_retryable());
    }

    #[test]
    fn empty_signature_key_is_rejected() {
        let err = SignatureTable::from_json_str(r#"{"": {"warn": "x"}}"#).unwrap_err();
        assert!(matches!(err, TableError::EmptySignature));
    }

    #[test]
    fn non_object_document_is_malformed() {
        let err = SignatureTable::from_json_str(r#"["disk full"]"#).unwrap_err();
        assert!(matches!(err, TableError::Malformed(_)));
    }

    #[test]
    fn blank_rule_parts_are_treated_as_absent() {
        let rule: RemediationRule =
            serde_json::from_value(json!({"update_tfvars": {}, "warn": ""})).unwrap();
        assert!(rule.updates().is_none());
        assert!(rule.warning().is_none());
    }
}
