//! extrato-export: spreadsheet rendering of extracted statement records.

pub mod columns;
pub mod sheet;
pub mod workbook;

pub use columns::{layout, Column, ColumnPolicy};
pub use sheet::{write_records, write_sheet, SheetFormat, SheetOptions};
pub use workbook::SHEET_NAME;
