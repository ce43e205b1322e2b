use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// A tier definition that cannot be used.
#[derive(Debug, Error)]
pub enum TierError {
    #[error("tier {tier:?}: invalid pattern: {source}")]
    Pattern {
        tier: String,
        #[source]
        source: regex::Error,
    },

    #[error("tier {tier:?}: pattern has no named group `{group}`")]
    MissingGroup { tier: String, group: &'static str },

    #[error("tier {tier:?}: pattern has no `date` group and does not use the date context")]
    Undated { tier: String },

    #[error("built-in pattern failed to compile: {0}")]
    Builtin(#[from] regex::Error),
}

/// Document-level extraction failure. Nothing should be emitted for it.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document produced lines, some of them looked like transactions,
    /// but every candidate was dropped. Also used for documents with no
    /// text at all.
    #[error("no valid transactions in {lines} lines ({} dropped)", diagnostics.len())]
    EmptyExtraction {
        lines: usize,
        diagnostics: Vec<Diagnostic>,
    },

    /// Not a single line matched any transaction tier.
    #[error("statement layout not recognized: none of {lines} lines matched a transaction pattern")]
    UnrecognizedLayout { lines: usize },

    #[error(transparent)]
    Tiers(#[from] TierError),
}

impl ExtractError {
    /// True for both flavours of "nothing came out".
    pub fn is_empty_extraction(&self) -> bool {
        matches!(
            self,
            ExtractError::EmptyExtraction { .. } | ExtractError::UnrecognizedLayout { .. }
        )
    }
}
