//! `.xlsx` output: one `Extrato` worksheet, header row plus one row per
//! record, columns sized to their longest cell.

use anyhow::{Context, Result};
use extrato_core::TransactionRecord;
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::columns::{layout, Column};
use crate::sheet::{cell, SheetOptions};

pub const SHEET_NAME: &str = "Extrato";

/// Extra characters added to each column's content width.
const WIDTH_PADDING: usize = 2;

/// Rendered text of every row, header first.
fn rows(records: &[TransactionRecord], columns: &[Column], prefix: &str) -> Vec<Vec<String>> {
    let header: Vec<String> = columns.iter().map(|c| c.header().to_string()).collect();
    std::iter::once(header)
        .chain(records.iter().map(|r| {
            columns
                .iter()
                .map(|&c| cell(r, c, prefix))
                .collect::<Vec<_>>()
        }))
        .collect()
}

/// Width of each column in characters: longest cell (header included) plus
/// padding.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let ncols = rows.first().map_or(0, Vec::len);
    (0..ncols)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
                + WIDTH_PADDING
        })
        .collect()
}

/// Build the workbook and save it to `path`. The caller has already checked
/// that there is something to write.
pub(crate) fn write_workbook(
    path: &Path,
    records: &[TransactionRecord],
    options: &SheetOptions,
) -> Result<usize> {
    let columns = layout(records, options.include_operation_id, options.include_balance);
    let rows = rows(records, &columns, &options.currency_prefix);
    let widths = column_widths(&rows);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).context("name worksheet")?;

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).context("too many rows for a worksheet")?;
        for (c, text) in row.iter().enumerate() {
            // at most five columns
            worksheet
                .write_string(r, c as u16, text.as_str())
                .with_context(|| format!("write cell ({r}, {c})"))?;
        }
    }
    for (c, width) in widths.iter().enumerate() {
        worksheet
            .set_column_width(c as u16, *width as f64)
            .with_context(|| format!("size column {c}"))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_widths_follow_longest_cell() {
        let records = vec![
            TransactionRecord::new(
                NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                "PAGAMENTO FORNECEDOR",
                Decimal::new(-123456, 2),
            ),
            TransactionRecord::new(
                NaiveDate::from_ymd_opt(2024, 2, 16).unwrap(),
                "PIX",
                Decimal::new(500, 2),
            ),
        ];
        let columns = [Column::Date, Column::Description, Column::Value];
        let rows = rows(&records, &columns, "R$ ");

        assert_eq!(rows[0], vec!["Data", "Descrição", "Valor"]);
        assert_eq!(rows[1][2], "R$ -1.234,56");
        // "15-02-2024", "PAGAMENTO FORNECEDOR", "R$ -1.234,56"
        assert_eq!(column_widths(&rows), vec![12, 22, 14]);
    }

    #[test]
    fn test_widths_count_characters_not_bytes() {
        let rows = vec![vec!["Descrição".to_string()]];
        assert_eq!(column_widths(&rows), vec![9 + WIDTH_PADDING]);
    }
}
