//! Per-line and per-record problems collected during a document sweep.

use extrato_core::{IncompleteRecord, MalformedAmount};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub page: usize,
    pub line: usize,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A tier matched the line's shape but an amount would not normalize.
    MalformedAmount { tier: String, error: MalformedAmount },
    /// A date-shaped token that is not a calendar day.
    InvalidDate { token: String },
    /// A closed record failed validation and was dropped.
    IncompleteRecord { reason: IncompleteRecord },
    /// Same (date, description, operation id, value) as an earlier record.
    Duplicate { description: String },
    /// Text before any date marker with no record to attach to.
    OrphanLine { text: String },
    /// An amount-only line with no description lines in front of it.
    OrphanAmount { text: String },
    /// Description lines that never got an amount.
    DanglingFragments { text: String },
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedAmount { .. } => "malformed_amount",
            DiagnosticKind::InvalidDate { .. } => "invalid_date",
            DiagnosticKind::IncompleteRecord { .. } => "incomplete_record",
            DiagnosticKind::Duplicate { .. } => "duplicate",
            DiagnosticKind::OrphanLine { .. } => "orphan_line",
            DiagnosticKind::OrphanAmount { .. } => "orphan_amount",
            DiagnosticKind::DanglingFragments { .. } => "dangling_fragments",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} line {}: ", self.page + 1, self.line + 1)?;
        match &self.kind {
            DiagnosticKind::MalformedAmount { tier, error } => write!(f, "[{tier}] {error}"),
            DiagnosticKind::InvalidDate { token } => write!(f, "invalid date {token:?}"),
            DiagnosticKind::IncompleteRecord { reason } => write!(f, "record dropped: {reason}"),
            DiagnosticKind::Duplicate { description } => {
                write!(f, "duplicate record skipped: {description:?}")
            }
            DiagnosticKind::OrphanLine { text } => write!(f, "unattached line {text:?}"),
            DiagnosticKind::OrphanAmount { text } => {
                write!(f, "amount without description {text:?}")
            }
            DiagnosticKind::DanglingFragments { text } => {
                write!(f, "description without amount {text:?}")
            }
        }
    }
}

/// Line and diagnostic counts for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub lines: usize,
    pub noise_lines: usize,
    pub transaction_lines: usize,
    pub records: usize,
    pub dropped: BTreeMap<&'static str, usize>,
}

impl Summary {
    pub(crate) fn count_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        self.dropped.clear();
        for d in diagnostics {
            *self.dropped.entry(d.kind.label()).or_default() += 1;
        }
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records from {} lines ({} noise, {} transaction lines)",
            self.records, self.lines, self.noise_lines, self.transaction_lines
        )?;
        if !self.dropped.is_empty() {
            let parts: Vec<String> = self
                .dropped
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "; unparsed: {}", parts.join(", "))?;
        }
        Ok(())
    }
}
