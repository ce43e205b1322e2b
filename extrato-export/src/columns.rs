//! Which columns the sheet gets, and in what order.

use extrato_core::TransactionRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Date,
    Description,
    OperationId,
    Value,
    Balance,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Date => "Data",
            Column::Description => "Descrição",
            Column::OperationId => "ID da operação",
            Column::Value => "Valor",
            Column::Balance => "Saldo",
        }
    }
}

/// Whether an optional column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// Only when at least one record has the field
    #[default]
    Auto,
    Always,
    Never,
}

impl ColumnPolicy {
    fn include(self, any_present: bool) -> bool {
        match self {
            ColumnPolicy::Auto => any_present,
            ColumnPolicy::Always => true,
            ColumnPolicy::Never => false,
        }
    }
}

/// Data, Descrição, [ID da operação], Valor, [Saldo]
pub fn layout(
    records: &[TransactionRecord],
    operation_id: ColumnPolicy,
    balance: ColumnPolicy,
) -> Vec<Column> {
    let mut cols = vec![Column::Date, Column::Description];
    if operation_id.include(records.iter().any(|r| r.operation_id.is_some())) {
        cols.push(Column::OperationId);
    }
    cols.push(Column::Value);
    if balance.include(records.iter().any(|r| r.balance.is_some())) {
        cols.push(Column::Balance);
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn plain() -> TransactionRecord {
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            "PAYMENT",
            Decimal::new(-35000, 2),
        )
    }

    #[test]
    fn test_auto_layout_follows_data() {
        let cols = layout(&[plain()], ColumnPolicy::Auto, ColumnPolicy::Auto);
        assert_eq!(cols, vec![Column::Date, Column::Description, Column::Value]);

        let full = plain()
            .with_operation_id("12345678901")
            .with_balance(Decimal::new(1, 0));
        let cols = layout(&[plain(), full], ColumnPolicy::Auto, ColumnPolicy::Auto);
        assert_eq!(
            cols,
            vec![
                Column::Date,
                Column::Description,
                Column::OperationId,
                Column::Value,
                Column::Balance
            ]
        );
    }

    #[test]
    fn test_forced_policies() {
        let cols = layout(&[plain()], ColumnPolicy::Always, ColumnPolicy::Never);
        let headers: Vec<_> = cols.iter().map(|c| c.header()).collect();
        assert_eq!(headers, vec!["Data", "Descrição", "ID da operação", "Valor"]);
    }
}
