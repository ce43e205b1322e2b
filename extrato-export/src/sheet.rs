//! Spreadsheet output options and the delimited (CSV) writer.
//!
//! The default output is an `.xlsx` workbook (see `workbook`). The CSV form is
//! semicolon-separated by default so a pt-BR Excel opens it with the columns
//! split, and the comma inside amounts left alone.

use anyhow::{bail, Context, Result};
use extrato_core::{format_amount_with_prefix, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::columns::{layout, Column, ColumnPolicy};
use crate::workbook::write_workbook;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SheetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub format: SheetFormat,
    /// CSV only.
    pub delimiter: char,
    pub include_operation_id: ColumnPolicy,
    pub include_balance: ColumnPolicy,
    /// Printed in front of every amount, e.g. `"R$ "`. Empty for bare numbers.
    pub currency_prefix: String,
    /// CSV only. Lets Excel detect UTF-8 (`Descrição`).
    pub utf8_bom: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            format: SheetFormat::Xlsx,
            delimiter: ';',
            include_operation_id: ColumnPolicy::Auto,
            include_balance: ColumnPolicy::Auto,
            currency_prefix: "R$ ".to_string(),
            utf8_bom: true,
        }
    }
}

impl SheetOptions {
    fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            bail!("unsupported delimiter {:?}", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }
}

pub(crate) fn cell(record: &TransactionRecord, column: Column, prefix: &str) -> String {
    match column {
        Column::Date => record.date.format(DATE_FORMAT).to_string(),
        Column::Description => record.description.clone(),
        Column::OperationId => record.operation_id.clone().unwrap_or_default(),
        Column::Value => format_amount_with_prefix(record.value, prefix),
        Column::Balance => record
            .balance
            .map(|b| format_amount_with_prefix(b, prefix))
            .unwrap_or_default(),
    }
}

/// Write header + one row per record. Returns the number of rows written.
pub fn write_records<W: Write>(
    records: &[TransactionRecord],
    options: &SheetOptions,
    mut writer: W,
) -> Result<usize> {
    if options.utf8_bom {
        writer.write_all(UTF8_BOM).context("write BOM")?;
    }

    let columns = layout(records, options.include_operation_id, options.include_balance);
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .from_writer(writer);

    wtr.write_record(columns.iter().map(|c| c.header()))
        .context("write header")?;
    for record in records {
        wtr.write_record(
            columns
                .iter()
                .map(|&c| cell(record, c, &options.currency_prefix)),
        )
        .with_context(|| format!("write row for {:?}", record.description))?;
    }
    wtr.flush().context("flush sheet")?;

    Ok(records.len())
}

/// Write the sheet to `path` in `options.format`. Refuses an empty record
/// list: a failed extraction must not leave a header-only file behind.
pub fn write_sheet(path: &Path, records: &[TransactionRecord], options: &SheetOptions) -> Result<()> {
    if records.is_empty() {
        bail!("no records to write to {}", path.display());
    }

    let rows = match options.format {
        SheetFormat::Xlsx => write_workbook(path, records, options)?,
        SheetFormat::Csv => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_records(records, options, BufWriter::new(file))
                .with_context(|| format!("write {}", path.display()))?
        }
    };

    info!(rows, format = options.format.extension(), path = %path.display(), "spreadsheet written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn records() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new(
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                "PIX RECEIVED",
                Decimal::new(123456, 2),
            )
            .with_operation_id("12345678901")
            .with_balance(Decimal::new(500000, 2)),
            TransactionRecord::new(
                NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                "PAYMENT; SUPPLIER",
                Decimal::new(-35000, 2),
            ),
        ]
    }

    fn render(records: &[TransactionRecord], options: &SheetOptions) -> String {
        let mut buf = Vec::new();
        write_records(records, options, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let out = render(&records(), &SheetOptions::default());
        let body = out.strip_prefix('\u{FEFF}').unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines[0], "Data;Descrição;ID da operação;Valor;Saldo");
        assert_eq!(lines[1], "10-01-2024;PIX RECEIVED;12345678901;R$ 1.234,56;R$ 5.000,00");
        assert_eq!(lines[2], "15-02-2024;\"PAYMENT; SUPPLIER\";;R$ -350,00;");
    }

    #[test]
    fn test_bare_amounts_and_comma_delimiter() {
        let options = SheetOptions {
            format: SheetFormat::Csv,
            delimiter: ',',
            currency_prefix: String::new(),
            utf8_bom: false,
            include_balance: ColumnPolicy::Never,
            include_operation_id: ColumnPolicy::Never,
        };
        let out = render(&records()[1..], &options);
        assert_eq!(out, "Data,Descrição,Valor\n15-02-2024,PAYMENT; SUPPLIER,\"-350,00\"\n");
    }

    #[test]
    fn test_rejects_bad_delimiter() {
        let options = SheetOptions {
            delimiter: 'ç',
            ..SheetOptions::default()
        };
        assert!(write_records(&records(), &options, Vec::new()).is_err());
    }
}
