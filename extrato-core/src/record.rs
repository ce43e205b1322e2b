//! Statement lines and the transaction records built from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IncompleteRecord;

/// Length of the operation id printed by statements that carry one.
pub const OPERATION_ID_LEN: usize = 11;

/// One line of PDF text, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// 0-based page index
    pub page: usize,
    /// 0-based line index within the page
    pub line: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(page: usize, line: usize, text: impl Into<String>) -> Self {
        Self {
            page,
            line,
            text: text.into(),
        }
    }
}

/// A single statement movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub description: String,
    pub operation_id: Option<String>,
    /// Negative = debit, positive = credit
    pub value: Decimal,
    /// Running balance after this movement, when the statement prints it
    pub balance: Option<Decimal>,
}

/// Identity used for duplicate suppression.
pub type RecordKey = (NaiveDate, String, Option<String>, Decimal);

impl TransactionRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, value: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            operation_id: None,
            value,
            balance: None,
        }
    }

    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Some(balance);
        self
    }

    /// Append a wrapped description fragment, separated by one space.
    pub fn append_description(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(fragment);
    }

    /// Check the record invariants. Trims the description in place.
    pub fn validate(&mut self) -> Result<(), IncompleteRecord> {
        let trimmed = self.description.trim();
        if trimmed.len() != self.description.len() {
            self.description = trimmed.to_string();
        }
        if self.description.is_empty() {
            return Err(IncompleteRecord::EmptyDescription);
        }
        if let Some(id) = &self.operation_id {
            if id.len() != OPERATION_ID_LEN || !id.bytes().all(|b| b.is_ascii_digit()) {
                return Err(IncompleteRecord::BadOperationId(id.clone()));
            }
        }
        if self.value.normalize().scale() > 2 {
            return Err(IncompleteRecord::ValuePrecision(self.value));
        }
        if let Some(balance) = self.balance {
            if balance.normalize().scale() > 2 {
                return Err(IncompleteRecord::BalancePrecision(balance));
            }
        }
        Ok(())
    }

    pub fn key(&self) -> RecordKey {
        (
            self.date,
            self.description.clone(),
            self.operation_id.clone(),
            self.value,
        )
    }

    pub fn is_debit(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_append_description() {
        let mut r = TransactionRecord::new(date(), "PIX", Decimal::new(100, 2));
        r.append_description("  FULANO  ");
        r.append_description("");
        r.append_description("DE TAL");
        assert_eq!(r.description, "PIX FULANO DE TAL");
    }

    #[test]
    fn test_validate_trims_and_accepts() {
        let mut r = TransactionRecord::new(date(), "  PIX  ", Decimal::new(100, 2))
            .with_operation_id("12345678901")
            .with_balance(Decimal::new(5, 0));
        assert!(r.validate().is_ok());
        assert_eq!(r.description, "PIX");
    }

    #[test]
    fn test_validate_rejects() {
        let mut empty = TransactionRecord::new(date(), "   ", Decimal::new(1, 0));
        assert_eq!(empty.validate(), Err(IncompleteRecord::EmptyDescription));

        let mut short_id =
            TransactionRecord::new(date(), "X", Decimal::new(1, 0)).with_operation_id("1234");
        assert!(matches!(
            short_id.validate(),
            Err(IncompleteRecord::BadOperationId(_))
        ));

        let mut precise = TransactionRecord::new(date(), "X", Decimal::new(1234, 3));
        assert!(matches!(
            precise.validate(),
            Err(IncompleteRecord::ValuePrecision(_))
        ));
    }

    #[test]
    fn test_trailing_zero_scale_is_fine() {
        // 1.500 has scale 3 but only 1 significant fractional digit
        let mut r = TransactionRecord::new(date(), "X", Decimal::new(1500, 3));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_serializes_amounts_as_strings() {
        let r = TransactionRecord::new(date(), "PIX", Decimal::new(-35000, 2));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["date"], "2024-01-10");
        assert_eq!(json["value"], "-350.00");
        assert!(r.is_debit());
    }
}
