//! Record assembly over one document.
//!
//! Two layouts are handled by the same state machine:
//!
//! * single-line records (`10-01-2024 PIX ... R$ 1,00`), optionally followed
//!   by wrapped description lines that extend the still-open record;
//! * date-marker blocks (`15-02-2024` on its own line), where description
//!   lines come first and an amount-only line completes the record.

use chrono::NaiveDate;
use extrato_core::{IncompleteRecord, RawLine, RecordKey, TransactionRecord};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::classifier::{Classifier, LineClass, LineIssue};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Summary};
use crate::tiers::{ExtractedFields, Rejection};

/// Where a line or record came from, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Origin {
    page: usize,
    line: usize,
}

impl From<&RawLine> for Origin {
    fn from(raw: &RawLine) -> Self {
        Self {
            page: raw.page,
            line: raw.line,
        }
    }
}

#[derive(Debug)]
struct OpenRecord {
    record: TransactionRecord,
    origin: Origin,
}

/// Description lines waiting for their amount.
#[derive(Debug, Default)]
struct Pending {
    fragments: Vec<String>,
    origin: Option<Origin>,
}

impl Pending {
    fn push(&mut self, text: &str, origin: Origin) {
        self.origin.get_or_insert(origin);
        self.fragments.push(text.to_string());
    }

    fn take(&mut self) -> Option<(String, Origin)> {
        let origin = self.origin.take()?;
        let text = std::mem::take(&mut self.fragments).join(" ");
        Some((text, origin))
    }
}

/// Records and diagnostics for one document, in extraction order.
#[derive(Debug, Default)]
pub struct Assembled {
    pub records: Vec<TransactionRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}

/// Per-document assembly context. Create one per statement and feed it every
/// line in page order; nothing carries over between documents.
#[derive(Debug)]
pub struct Assembler<'a> {
    classifier: &'a Classifier,
    date_context: Option<NaiveDate>,
    open: Option<OpenRecord>,
    pending: Pending,
    seen: HashSet<RecordKey>,
    out: Assembled,
}

impl<'a> Assembler<'a> {
    pub fn new(classifier: &'a Classifier) -> Self {
        Self {
            classifier,
            date_context: None,
            open: None,
            pending: Pending::default(),
            seen: HashSet::new(),
            out: Assembled::default(),
        }
    }

    pub fn date_context(&self) -> Option<NaiveDate> {
        self.date_context
    }

    pub fn push(&mut self, raw: &RawLine) {
        let origin = Origin::from(raw);
        let classified = self.classifier.classify(&raw.text, self.date_context.is_some());
        debug!(
            page = raw.page,
            line = raw.line,
            class = classified.class.label(),
            "classified line"
        );

        self.out.summary.lines += 1;
        for issue in classified.issues {
            self.report_issue(issue, origin);
        }

        match classified.class {
            LineClass::Noise => self.out.summary.noise_lines += 1,
            LineClass::DateMarker { date, text } => {
                self.close_open();
                self.flush_pending();
                self.date_context = Some(date);
                if let Some(text) = text {
                    self.pending.push(&text, origin);
                }
            }
            LineClass::Transaction { fields } => {
                self.out.summary.transaction_lines += 1;
                self.open_transaction(fields, origin);
            }
            LineClass::AmountOnly { value, balance } => {
                self.out.summary.transaction_lines += 1;
                match (self.pending.take(), self.date_context) {
                    (Some((description, first)), Some(date)) => {
                        self.close_open();
                        let mut record = TransactionRecord::new(date, description, value);
                        record.balance = balance;
                        self.finalize(record, first);
                    }
                    (pending, _) => {
                        if let Some((text, first)) = pending {
                            self.diagnose(first, DiagnosticKind::DanglingFragments { text });
                        }
                        self.diagnose(
                            origin,
                            DiagnosticKind::OrphanAmount {
                                text: raw.text.trim().to_string(),
                            },
                        );
                    }
                }
            }
            LineClass::Continuation { text } => {
                if let Some(open) = self.open.as_mut() {
                    open.record.append_description(&text);
                } else if self.date_context.is_some() {
                    self.pending.push(&text, origin);
                } else {
                    self.diagnose(origin, DiagnosticKind::OrphanLine { text });
                }
            }
        }
    }

    /// Close whatever is still open and hand back the results.
    pub fn finish(mut self) -> Assembled {
        self.close_open();
        self.flush_pending();
        let mut out = self.out;
        out.summary.count_diagnostics(&out.diagnostics);
        out.summary.records = out.records.len();
        out
    }

    fn open_transaction(&mut self, fields: ExtractedFields, origin: Origin) {
        self.close_open();
        // Fragments belong to the previous date block, not to a line that
        // brings its own date.
        if fields.date.is_some() {
            self.flush_pending();
        }

        let date = match fields.date {
            Some(date) => {
                self.date_context = Some(date);
                date
            }
            None => match self.date_context {
                Some(date) => date,
                None => {
                    self.drop_record(origin, IncompleteRecord::MissingDate);
                    return;
                }
            },
        };

        let mut record = TransactionRecord::new(date, String::new(), fields.value);
        if let Some((prefix, _)) = self.pending.take() {
            record.append_description(&prefix);
        }
        record.append_description(&fields.description);
        record.operation_id = fields.operation_id;
        record.balance = fields.balance;

        self.open = Some(OpenRecord { record, origin });
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.finalize(open.record, open.origin);
        }
    }

    fn finalize(&mut self, mut record: TransactionRecord, origin: Origin) {
        if let Err(reason) = record.validate() {
            self.drop_record(origin, reason);
            return;
        }

        if !self.seen.insert(record.key()) {
            debug!(
                page = origin.page,
                line = origin.line,
                description = %record.description,
                "duplicate record skipped"
            );
            self.diagnose(
                origin,
                DiagnosticKind::Duplicate {
                    description: record.description,
                },
            );
            return;
        }

        self.out.records.push(record);
    }

    fn flush_pending(&mut self) {
        if let Some((text, origin)) = self.pending.take() {
            self.diagnose(origin, DiagnosticKind::DanglingFragments { text });
        }
    }

    fn drop_record(&mut self, origin: Origin, reason: IncompleteRecord) {
        warn!(page = origin.page, line = origin.line, %reason, "record dropped");
        self.diagnose(origin, DiagnosticKind::IncompleteRecord { reason });
    }

    fn report_issue(&mut self, issue: LineIssue, origin: Origin) {
        let kind = match issue {
            LineIssue::Rejected {
                tier,
                reason: Rejection::MalformedAmount(error),
            } => {
                warn!(page = origin.page, line = origin.line, %tier, %error, "amount rejected");
                DiagnosticKind::MalformedAmount { tier, error }
            }
            LineIssue::Rejected {
                reason: Rejection::InvalidDate(token),
                ..
            }
            | LineIssue::InvalidDateMarker(token) => DiagnosticKind::InvalidDate { token },
        };
        self.diagnose(origin, kind);
    }

    fn diagnose(&mut self, origin: Origin, kind: DiagnosticKind) {
        self.out.diagnostics.push(Diagnostic {
            page: origin.page,
            line: origin.line,
            kind,
        });
    }
}
