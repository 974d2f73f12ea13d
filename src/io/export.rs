use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

use crate::application::Ledger;
use crate::domain::{format_amount, Expense, RoommateShare};
use crate::storage::KeyValueStore;

/// Ledger snapshot for full export
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,
    pub expense_count: usize,
    pub expenses: Vec<Expense>,
    /// Ordered by amount owed, largest first
    pub balances: Vec<RoommateShare>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a, S: KeyValueStore> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: KeyValueStore> Exporter<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Export expenses to CSV format, in insertion order
    pub fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "id",
            "date_added",
            "description",
            "amount",
            "paid_by",
            "split_among",
            "amount_per_person",
        ])?;

        let mut count = 0;
        for expense in self.ledger.expenses() {
            csv_writer.write_record(&[
                expense.id.to_string(),
                expense.date_added.format("%Y-%m-%d").to_string(),
                expense.description.clone(),
                expense.amount.to_string(),
                expense.paid_by.clone(),
                expense.split_among.to_string(),
                expense.amount_per_person.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export balances to CSV format, rounded to cents for display
    pub fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let shares = self.ledger.shares();
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["name", "paid", "owes", "balance"])?;

        let mut count = 0;
        for share in shares.by_owes_desc() {
            csv_writer.write_record(&[
                share.name.clone(),
                format_amount(share.paid),
                format_amount(share.owes),
                format_amount(share.balance),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the whole ledger plus derived balances as a JSON snapshot
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            total_amount: self.ledger.total_amount(),
            expense_count: self.ledger.expense_count(),
            expenses: self.ledger.expenses().to_vec(),
            balances: self
                .ledger
                .shares()
                .by_owes_desc()
                .into_iter()
                .cloned()
                .collect(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
