//! Structured, non-fatal findings collected during encode and decode.
//!
//! Every codec takes a `&mut Diagnostics` and pushes an entry whenever it
//! clamps, corrects, skips or merely notices something. The caller decides
//! what to do with the list; nothing here prints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Bad hex digit, short buffer, wrong fixed length. The affected bytes
    /// were skipped.
    MalformedInput,
    /// Code or numeric value outside its valid range; clamped.
    RangeViolation,
    /// Contradictory fields; corrected on encode, reported on decode.
    PolicyInconsistency,
    /// Unrecognized subelement ID; payload skipped.
    UnknownSubelement,
    /// Field combination that makes a known consumer (Android
    /// `ResponderLocation`) withhold location data. Advisory only.
    ConsumerIncompatibility,
}

impl DiagnosticKind {
    /// Short lowercase name, used in log fields and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed-input",
            Self::RangeViolation => "range-violation",
            Self::PolicyInconsistency => "policy-inconsistency",
            Self::UnknownSubelement => "unknown-subelement",
            Self::ConsumerIncompatibility => "consumer-incompatibility",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Subelement ID the finding belongs to, if any.
    pub subelement: Option<u8>,
    /// Human-readable context.
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subelement {
            Some(id) => write!(f, "{} (subelement {id}): {}", self.kind, self.context),
            None => write!(f, "{}: {}", self.kind, self.context),
        }
    }
}

/// Ordered list of findings for one call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding that is not tied to a subelement.
    pub fn report(&mut self, kind: DiagnosticKind, context: impl Into<String>) {
        self.push(kind, None, context.into());
    }

    /// Record a finding for subelement `id`.
    pub fn report_in(&mut self, id: u8, kind: DiagnosticKind, context: impl Into<String>) {
        self.push(kind, Some(id), context.into());
    }

    fn push(&mut self, kind: DiagnosticKind, subelement: Option<u8>, context: String) {
        tracing::debug!(kind = kind.as_str(), subelement, "{context}");
        self.entries.push(Diagnostic {
            kind,
            subelement,
            context,
        });
    }

    /// All findings, in the order they were reported.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any finding of `kind` was reported.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    /// Number of findings of `kind`.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Append all findings from `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_and_query() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.report(DiagnosticKind::MalformedInput, "bad header");
        diags.report_in(4, DiagnosticKind::RangeViolation, "code 30 > 24");
        diags.report_in(4, DiagnosticKind::RangeViolation, "floor clamped");

        assert_eq!(diags.len(), 3);
        assert!(diags.has(DiagnosticKind::MalformedInput));
        assert!(!diags.has(DiagnosticKind::UnknownSubelement));
        assert_eq!(diags.count(DiagnosticKind::RangeViolation), 2);
        assert_eq!(diags.entries()[1].subelement, Some(4));
    }

    #[test]
    fn test_display() {
        let mut diags = Diagnostics::new();
        diags.report_in(7, DiagnosticKind::MalformedInput, "invalid BSSID");
        diags.report(DiagnosticKind::ConsumerIncompatibility, "expiration set");

        let lines: Vec<String> = diags.iter().map(ToString::to_string).collect();
        assert_eq!(lines[0], "malformed-input (subelement 7): invalid BSSID");
        assert_eq!(lines[1], "consumer-incompatibility: expiration set");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut a = Diagnostics::new();
        a.report(DiagnosticKind::RangeViolation, "first");
        let mut b = Diagnostics::new();
        b.report(DiagnosticKind::PolicyInconsistency, "second");

        a.extend(b);
        let contexts: Vec<&str> = a.iter().map(|d| d.context.as_str()).collect();
        assert_eq!(contexts, ["first", "second"]);
    }
}
