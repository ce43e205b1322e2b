//! Field extraction tiers.
//!
//! Each tier is one regex over a trimmed line, tried in order; the first one
//! that yields a usable description and amount wins. Statement revisions
//! differ in whether the operation id and the running balance are printed, so
//! the most specific layouts come first:
//!
//!   full             10-01-2024 PIX RECEBIDO 12345678901 R$ 1.234,56 R$ 5.000,00
//!   id_value         10-01-2024 PIX RECEBIDO 12345678901 R$ 1.234,56
//!   value_balance    10-01-2024 PIX RECEBIDO R$ 1.234,56 R$ 5.000,00
//!   no_id            10-01-2024 PIX RECEBIDO 1.234,56
//!   context_balance  PIX RECEBIDO R$ -350,00 R$ 650,00
//!   dated_context    PIX RECEBIDO -350,00
//!
//! The two context tiers take their date from an earlier marker line.
//!
//! The balance tiers only take `R$`-prefixed amounts, so a bare number inside
//! a description is never mistaken for the value.
//!
//! New layouts are added as new tiers, either here or from configuration.

use chrono::NaiveDate;
use extrato_core::{parse_amount, DateScanner, MalformedAmount};
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TierError;

const DATE: &str = r"(?P<date>\d{2}-\d{2}-(?:\d{4}|\d{2}))";
const AMOUNT: &str = r"-?(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}";
const OP_ID: &str = r"(?P<id>\d{11})";

/// `R$ 1.234,56`, `R$ -1,00`, `- R$ 1,00`
pub(crate) fn currency_amount() -> String {
    format!(r"(?:-\s*)?R\$\s*{AMOUNT}")
}

/// Same as `currency_amount` but the `R$` is optional.
pub(crate) fn loose_amount() -> String {
    format!(r"(?:(?:-\s*)?R\$\s*)?{AMOUNT}")
}

/// Serializable tier definition, as written in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    /// Regex with named groups `desc` and `value`; `date`, `id` and
    /// `balance` are optional.
    pub pattern: String,
    /// Tier applies to date-less lines under an earlier date marker.
    #[serde(default)]
    pub needs_date_context: bool,
}

impl TierSpec {
    pub fn new(name: &str, pattern: impl Into<String>, needs_date_context: bool) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.into(),
            needs_date_context,
        }
    }
}

/// The built-in tiers, most specific first.
pub fn builtin_tiers() -> Vec<TierSpec> {
    let cur = currency_amount();
    let loose = loose_amount();
    vec![
        TierSpec::new(
            "full",
            format!(
                r"^{DATE}\s+(?P<desc>.*?)\s+{OP_ID}\s+(?P<value>{cur})\s+(?P<balance>{cur})$"
            ),
            false,
        ),
        TierSpec::new(
            "id_value",
            format!(r"^{DATE}\s+(?P<desc>.*?)\s+{OP_ID}\s+(?P<value>{cur})$"),
            false,
        ),
        TierSpec::new(
            "value_balance",
            format!(r"^{DATE}\s+(?P<desc>.*?)\s+(?P<value>{cur})\s+(?P<balance>{cur})$"),
            false,
        ),
        TierSpec::new(
            "no_id",
            format!(r"^{DATE}\s+(?P<desc>.*?)\s+(?P<value>{loose})$"),
            false,
        ),
        TierSpec::new(
            "context_balance",
            format!(r"^(?P<desc>.*?)\s+(?P<value>{cur})\s+(?P<balance>{cur})$"),
            true,
        ),
        TierSpec::new(
            "dated_context",
            format!(r"^(?P<desc>.*?)\s+(?P<value>{loose})$"),
            true,
        ),
    ]
}

/// Fields pulled out of one transaction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub tier: String,
    /// `None` when the line relies on the date context
    pub date: Option<NaiveDate>,
    pub description: String,
    pub operation_id: Option<String>,
    pub value: Decimal,
    pub balance: Option<Decimal>,
}

/// Why a tier that matched the line's shape was still refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MalformedAmount(MalformedAmount),
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRejection {
    pub tier: String,
    pub reason: Rejection,
}

/// What the extractor knows about the line besides its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineContext {
    pub date_context_open: bool,
    pub line_has_date: bool,
}

#[derive(Debug, Clone)]
struct Tier {
    name: String,
    pattern: Regex,
    needs_date_context: bool,
}

impl Tier {
    fn compile(spec: &TierSpec) -> Result<Self, TierError> {
        let pattern = Regex::new(&spec.pattern).map_err(|source| TierError::Pattern {
            tier: spec.name.clone(),
            source,
        })?;

        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        for required in ["desc", "value"] {
            if !names.contains(&required) {
                return Err(TierError::MissingGroup {
                    tier: spec.name.clone(),
                    group: required,
                });
            }
        }
        if !spec.needs_date_context && !names.contains(&"date") {
            return Err(TierError::Undated {
                tier: spec.name.clone(),
            });
        }

        Ok(Self {
            name: spec.name.clone(),
            pattern,
            needs_date_context: spec.needs_date_context,
        })
    }

    fn applies(&self, ctx: LineContext) -> bool {
        !self.needs_date_context || (ctx.date_context_open && !ctx.line_has_date)
    }
}

/// Ordered list of tiers; first usable match wins.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    tiers: Vec<Tier>,
    dates: DateScanner,
}

impl FieldExtractor {
    pub fn new(specs: &[TierSpec], dates: DateScanner) -> Result<Self, TierError> {
        let tiers = specs.iter().map(Tier::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tiers, dates })
    }

    pub fn tier_names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|t| t.name.as_str())
    }

    /// Try every applicable tier on `text`. Refusals of tiers whose shape
    /// matched are pushed onto `rejections`.
    pub fn extract(
        &self,
        text: &str,
        ctx: LineContext,
        rejections: &mut Vec<TierRejection>,
    ) -> Option<ExtractedFields> {
        let text = text.trim();
        for tier in self.tiers.iter().filter(|t| t.applies(ctx)) {
            let Some(caps) = tier.pattern.captures(text) else {
                continue;
            };
            match self.fields_from(tier, &caps) {
                Ok(Some(fields)) => return Some(fields),
                Ok(None) => continue,
                Err(reason) => rejections.push(TierRejection {
                    tier: tier.name.clone(),
                    reason,
                }),
            }
        }
        None
    }

    /// `Ok(None)` means the description came out empty.
    fn fields_from(
        &self,
        tier: &Tier,
        caps: &Captures<'_>,
    ) -> Result<Option<ExtractedFields>, Rejection> {
        let description = caps
            .name("desc")
            .map(|m| clean_description(m.as_str()))
            .unwrap_or_default();
        if description.is_empty() {
            return Ok(None);
        }

        let date = match caps.name("date") {
            Some(m) => Some(
                self.dates
                    .parse_token(m.as_str())
                    .ok_or_else(|| Rejection::InvalidDate(m.as_str().to_string()))?,
            ),
            None => None,
        };

        let value = match caps.name("value") {
            Some(m) => parse_amount(m.as_str()).map_err(Rejection::MalformedAmount)?,
            None => return Ok(None),
        };
        let balance = caps
            .name("balance")
            .map(|m| parse_amount(m.as_str()))
            .transpose()
            .map_err(Rejection::MalformedAmount)?;

        Ok(Some(ExtractedFields {
            tier: tier.name.clone(),
            date,
            description: description.to_string(),
            operation_id: caps.name("id").map(|m| m.as_str().to_string()),
            value,
            balance,
        }))
    }
}

/// Trim the description and drop a dangling sign or currency marker left
/// behind when the lazy description stops just before an amount.
fn clean_description(raw: &str) -> &str {
    let s = raw.trim().trim_end_matches(|c: char| c == '-' || c.is_whitespace());
    s.strip_suffix("R$").unwrap_or(s).trim_end()
}
