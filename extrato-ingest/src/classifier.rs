//! Line classification: noise, date marker, transaction line, amount-only
//! line, or continuation text.

use chrono::NaiveDate;
use extrato_core::{parse_amount, DateScanner};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::TierError;
use crate::noise::NoiseFilter;
use crate::tiers::{loose_amount, ExtractedFields, FieldExtractor, LineContext, Rejection, TierSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum LineClass {
    Noise,
    /// A date with no transaction fields on the same line. Any other text on
    /// the line is kept as the start of the next description.
    DateMarker {
        date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Transaction { fields: ExtractedFields },
    /// Just an amount (and maybe a balance); closes a multi-line record.
    AmountOnly {
        value: Decimal,
        balance: Option<Decimal>,
    },
    Continuation { text: String },
}

impl LineClass {
    pub fn label(&self) -> &'static str {
        match self {
            LineClass::Noise => "noise",
            LineClass::DateMarker { .. } => "date",
            LineClass::Transaction { .. } => "transaction",
            LineClass::AmountOnly { .. } => "amount",
            LineClass::Continuation { .. } => "continuation",
        }
    }
}

/// Problems noticed while classifying a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineIssue {
    Rejected { tier: String, reason: Rejection },
    InvalidDateMarker(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub class: LineClass,
    pub issues: Vec<LineIssue>,
}

impl Classified {
    fn clean(class: LineClass) -> Self {
        Self {
            class,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    noise: NoiseFilter,
    dates: DateScanner,
    extractor: FieldExtractor,
    amount_only: Regex,
}

impl Classifier {
    pub fn new(
        extra_noise: &[String],
        tiers: &[TierSpec],
        year_base: i32,
    ) -> Result<Self, TierError> {
        let dates = DateScanner::new(year_base)?;
        let loose = loose_amount();
        Ok(Self {
            noise: NoiseFilter::new(extra_noise)?,
            extractor: FieldExtractor::new(tiers, dates.clone())?,
            dates,
            amount_only: Regex::new(&format!(
                r"^(?P<value>{loose})(?:\s+(?P<balance>{loose}))?$"
            ))?,
        })
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Classify one line. `date_context_open` tells whether a date has been
    /// seen earlier in the document.
    pub fn classify(&self, text: &str, date_context_open: bool) -> Classified {
        let text = text.trim();
        if self.noise.is_noise(text) {
            return Classified::clean(LineClass::Noise);
        }

        let date_hit = self.dates.find(text);
        let ctx = LineContext {
            date_context_open,
            line_has_date: date_hit.is_some(),
        };

        let mut issues = Vec::new();

        // Before the tiers: the context tier would read "R$ 10,00 R$ 20,00"
        // as description + value.
        if date_hit.is_none() {
            if let Some(caps) = self.amount_only.captures(text) {
                let value = parse_amount(&caps["value"]);
                let balance = caps.name("balance").map(|m| parse_amount(m.as_str())).transpose();
                match (value, balance) {
                    (Ok(value), Ok(balance)) => {
                        return Classified::clean(LineClass::AmountOnly { value, balance });
                    }
                    (Err(e), _) | (_, Err(e)) => issues.push(LineIssue::Rejected {
                        tier: "amount_only".to_string(),
                        reason: Rejection::MalformedAmount(e),
                    }),
                }
            }
        }

        let mut rejections = Vec::new();
        let fields = self.extractor.extract(text, ctx, &mut rejections);
        issues.extend(rejections.into_iter().map(|r| LineIssue::Rejected {
            tier: r.tier,
            reason: r.reason,
        }));

        if let Some(fields) = fields {
            return Classified {
                class: LineClass::Transaction { fields },
                issues,
            };
        }

        if let Some(hit) = date_hit {
            match hit.date {
                Some(date) => {
                    let rest = format!("{} {}", &text[..hit.span.start], &text[hit.span.end..]);
                    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
                    return Classified {
                        class: LineClass::DateMarker {
                            date,
                            text: (!rest.is_empty()).then_some(rest),
                        },
                        issues,
                    };
                }
                None => issues.push(LineIssue::InvalidDateMarker(text[hit.span].to_string())),
            }
        }

        Classified {
            class: LineClass::Continuation {
                text: text.to_string(),
            },
            issues,
        }
    }
}
