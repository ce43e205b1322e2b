//! Error kinds local to a single token or a single record.
//!
//! Neither of these ever aborts a document: the ingest pipeline folds them
//! into diagnostics and moves on to the next tier or the next line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A numeric token that could not be normalized into a 2-decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("malformed amount {token:?}: {reason}")]
pub struct MalformedAmount {
    pub token: String,
    pub reason: String,
}

impl MalformedAmount {
    pub(crate) fn new(token: &str, reason: impl Into<String>) -> Self {
        Self {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a closed record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IncompleteRecord {
    #[error("description is empty")]
    EmptyDescription,

    #[error("operation id {0:?} is not exactly 11 digits")]
    BadOperationId(String),

    #[error("value {0} has more than 2 fractional digits")]
    ValuePrecision(Decimal),

    #[error("balance {0} has more than 2 fractional digits")]
    BalancePrecision(Decimal),

    #[error("no date on the line and no date marker seen yet")]
    MissingDate,
}
