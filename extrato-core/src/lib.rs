//! extrato-core: record types, amount normalization and date tokens shared by
//! the statement ingest and export crates.

pub mod amount;
pub mod date;
pub mod error;
pub mod record;

pub use amount::{format_amount, format_amount_with_prefix, parse_amount, CURRENCY_PREFIX};
pub use date::{DateHit, DateScanner, DEFAULT_YEAR_BASE};
pub use error::{IncompleteRecord, MalformedAmount};
pub use record::{RawLine, RecordKey, TransactionRecord, OPERATION_ID_LEN};
