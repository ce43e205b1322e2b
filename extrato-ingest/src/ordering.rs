//! Final ordering and document-level validation.

use extrato_core::TransactionRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::Assembled;
use crate::diagnostics::{Diagnostic, Summary};
use crate::error::ExtractError;

/// A successful extraction: ordered records plus whatever was dropped.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub records: Vec<TransactionRecord>,
    pub diagnostics: Vec<Diagnostic>,
    summary: Summary,
}

impl Extraction {
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn has_balance(&self) -> bool {
        self.records.iter().any(|r| r.balance.is_some())
    }

    pub fn has_operation_id(&self) -> bool {
        self.records.iter().any(|r| r.operation_id.is_some())
    }
}

/// Sort by date, keeping statement order within a day.
pub fn order_records(records: &mut [TransactionRecord]) {
    // sort_by_key is stable
    records.sort_by_key(|r| r.date);
}

/// Turn an assembled document into the final result, or fail when nothing
/// usable came out of it.
pub fn finalize(assembled: Assembled) -> Result<Extraction, ExtractError> {
    let Assembled {
        mut records,
        diagnostics,
        summary,
    } = assembled;

    if records.is_empty() {
        if summary.lines == 0 {
            warn!("document has no text lines");
            return Err(ExtractError::EmptyExtraction {
                lines: 0,
                diagnostics,
            });
        }
        if summary.transaction_lines == 0 {
            warn!(lines = summary.lines, "no line matched a transaction pattern");
            return Err(ExtractError::UnrecognizedLayout {
                lines: summary.lines,
            });
        }
        warn!(
            lines = summary.lines,
            dropped = diagnostics.len(),
            "every transaction candidate was dropped"
        );
        return Err(ExtractError::EmptyExtraction {
            lines: summary.lines,
            diagnostics,
        });
    }

    order_records(&mut records);
    info!("{summary}");

    Ok(Extraction {
        records,
        diagnostics,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn rec(day: u32, desc: &str) -> TransactionRecord {
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            desc,
            Decimal::new(100, 2),
        )
    }

    #[test]
    fn test_stable_sort_within_a_day() {
        let mut records = vec![
            rec(5, "late-a"),
            rec(1, "first"),
            rec(5, "late-b"),
            rec(3, "middle"),
            rec(5, "late-c"),
        ];
        order_records(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(names, vec!["first", "middle", "late-a", "late-b", "late-c"]);
    }

    #[test]
    fn test_empty_documents_fail() {
        let err = finalize(Assembled::default()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyExtraction { lines: 0, .. }));

        let mut unrecognized = Assembled::default();
        unrecognized.summary.lines = 4;
        let err = finalize(unrecognized).unwrap_err();
        assert!(matches!(err, ExtractError::UnrecognizedLayout { lines: 4 }));
        assert!(err.is_empty_extraction());

        let mut all_dropped = Assembled::default();
        all_dropped.summary.lines = 4;
        all_dropped.summary.transaction_lines = 1;
        let err = finalize(all_dropped).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyExtraction { lines: 4, .. }));
    }
}
