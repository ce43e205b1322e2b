//! extrato-ingest: statement text -> ordered transaction records.
//!
//! Lines flow through noise filtering, the date/tier classifier and the
//! per-document assembler, then get ordered and checked for emptiness.

pub mod assembler;
pub mod classifier;
pub mod diagnostics;
pub mod error;
pub mod noise;
pub mod ordering;
pub mod pdf;
pub mod tiers;

pub use assembler::{Assembled, Assembler};
pub use classifier::{Classified, Classifier, LineClass};
pub use diagnostics::{Diagnostic, DiagnosticKind, Summary};
pub use error::{ExtractError, TierError};
pub use ordering::{order_records, Extraction};
pub use tiers::{builtin_tiers, TierSpec};

use extrato_core::{RawLine, DEFAULT_YEAR_BASE};
use serde::{Deserialize, Serialize};

/// Parser knobs, usually coming from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub extra_noise_markers: Vec<String>,
    /// Appended after the built-in tiers.
    pub custom_tiers: Vec<TierSpec>,
    pub two_digit_year_base: i32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            extra_noise_markers: Vec::new(),
            custom_tiers: Vec::new(),
            two_digit_year_base: DEFAULT_YEAR_BASE,
        }
    }
}

/// Compiled parser. Stateless between documents, so one instance can be
/// shared by any number of concurrent extractions.
#[derive(Debug, Clone)]
pub struct StatementParser {
    classifier: Classifier,
}

/// One line and how it was classified, for layout debugging.
#[derive(Debug, Clone, Serialize)]
pub struct InspectedLine {
    pub line: RawLine,
    pub class: LineClass,
}

impl StatementParser {
    pub fn new(options: &ParserOptions) -> Result<Self, TierError> {
        let mut tiers = builtin_tiers();
        tiers.extend(options.custom_tiers.iter().cloned());
        let classifier = Classifier::new(
            &options.extra_noise_markers,
            &tiers,
            options.two_digit_year_base,
        )?;
        Ok(Self { classifier })
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.classifier.extractor().tier_names().collect()
    }

    /// Run one document through assembly, ordering and validation.
    pub fn extract<I>(&self, lines: I) -> Result<Extraction, ExtractError>
    where
        I: IntoIterator<Item = RawLine>,
    {
        let mut assembler = Assembler::new(&self.classifier);
        for line in lines {
            assembler.push(&line);
        }
        ordering::finalize(assembler.finish())
    }

    /// Classify each line the way `extract` would, without assembling.
    pub fn inspect<I>(&self, lines: I) -> Vec<InspectedLine>
    where
        I: IntoIterator<Item = RawLine>,
    {
        let mut date_context_open = false;
        lines
            .into_iter()
            .map(|line| {
                let class = self.classifier.classify(&line.text, date_context_open).class;
                match &class {
                    LineClass::DateMarker { .. } => date_context_open = true,
                    LineClass::Transaction { fields } if fields.date.is_some() => {
                        date_context_open = true
                    }
                    _ => {}
                }
                InspectedLine { line, class }
            })
            .collect()
    }
}

/// Extract with the default parser.
pub fn extract_statement<I>(lines: I) -> Result<Extraction, ExtractError>
where
    I: IntoIterator<Item = RawLine>,
{
    StatementParser::new(&ParserOptions::default())?.extract(lines)
}

/// Convenience for callers holding plain strings (one page).
pub fn raw_lines<S: AsRef<str>>(texts: &[S]) -> Vec<RawLine> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| RawLine::new(0, i, t.as_ref()))
        .collect()
}
