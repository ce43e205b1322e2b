//! Boilerplate lines that never carry transaction data.
//!
//! Typical statement text around the movement table:
//!   EXTRATO DE CONTA CORRENTE
//!   DETALHE DOS MOVIMENTOS
//!   Data        Descrição              ID da operação   Valor      Saldo
//!   Saldo anterior                                               R$ 3.765,44
//!   Data de geração: 2024-01-15 10:31
//!   Página 1 de 3

use regex::Regex;

/// Substrings (case-insensitive) that mark a whole line as noise.
pub const DEFAULT_NOISE_MARKERS: &[&str] = &[
    "detalhe dos movimentos",
    "data de geração",
    "data de geracao",
    "saldo anterior",
    "saldo inicial",
    "saldo final",
    "saldo do dia",
    "saldo disponível",
    "saldo disponivel",
    "ouvidoria",
    "central de atendimento",
    "baixe o app",
    "acesse o app",
];

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    markers: Vec<String>,
    title: Regex,
    header_date: Regex,
    header_description: Regex,
    page_number: Regex,
}

impl NoiseFilter {
    /// Built-in markers plus `extra` ones from configuration.
    pub fn new(extra: &[String]) -> Result<Self, regex::Error> {
        let markers = DEFAULT_NOISE_MARKERS
            .iter()
            .map(|m| m.to_string())
            .chain(extra.iter().map(|m| m.trim().to_lowercase()))
            .filter(|m| !m.is_empty())
            .collect();

        Ok(Self {
            markers,
            title: Regex::new(r"(?i)^extrato(\s|$)")?,
            header_date: Regex::new(r"(?i)\bdata\b")?,
            header_description: Regex::new(r"(?i)\bdescri[çc][ãa]o\b")?,
            page_number: Regex::new(r"(?i)^(p[áa]g(ina)?\.?\s*)?\d{1,3}(\s*(de|/)\s*\d{1,3})?$")?,
        })
    }

    pub fn is_noise(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }

        let lower = text.to_lowercase();
        if self.markers.iter().any(|m| lower.contains(m.as_str())) {
            return true;
        }

        self.title.is_match(text)
            || self.page_number.is_match(text)
            || (self.header_date.is_match(text) && self.header_description.is_match(text))
    }
}
