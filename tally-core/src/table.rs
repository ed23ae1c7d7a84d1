//! The normalized table: parsed transactions plus their calendar buckets.

use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, warn};

use crate::buckets::{Quarter, YearMonth};
use crate::dates::DateParser;
use crate::transaction::{Direction, RawTransaction, Transaction, parse_amount};

/// A transaction with its derived calendar fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub txn: Transaction,
    pub year: i32,
    pub month: u32,
    pub year_month: YearMonth,
    pub quarter: Quarter,
}

impl LedgerRow {
    /// Derive the bucket fields. Pure function of `txn.date`.
    pub fn derive(txn: Transaction) -> Self {
        let date = txn.date;
        Self {
            year: date.year(),
            month: date.month(),
            year_month: YearMonth::from_date(date),
            quarter: Quarter::from_date(date),
            txn,
        }
    }
}

/// Rows that survived date parsing, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    rows: Vec<LedgerRow>,
    dropped: usize,
}

impl NormalizedTable {
    pub fn from_rows(rows: Vec<LedgerRow>) -> Self {
        Self { rows, dropped: 0 }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of input rows excluded because their date did not parse
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Parse dates, drop the rows that fail, and derive bucket fields.
///
/// Never fails: a file with no parseable dates yields an empty table.
pub fn normalize<I>(raw_rows: I, parser: &DateParser) -> NormalizedTable
where
    I: IntoIterator<Item = RawTransaction>,
{
    let mut rows = Vec::new();
    let mut dropped = 0;

    for (line, raw) in raw_rows.into_iter().enumerate() {
        let Some(date) = parser.parse(&raw.date) else {
            debug!(row = line + 1, date = %raw.date, "dropping row with unparseable date");
            dropped += 1;
            continue;
        };

        let amount = parse_amount(&raw.amount).unwrap_or_else(|| {
            warn!(row = line + 1, amount = %raw.amount, "unreadable amount, counting as 0");
            0.0
        });

        let txn = Transaction::new(
            date,
            Direction::parse(&raw.direction),
            raw.category,
            raw.mode,
            amount,
        );
        rows.push(LedgerRow::derive(txn));
    }

    if dropped > 0 {
        debug!(kept = rows.len(), dropped, "normalized ledger");
    }

    NormalizedTable { rows, dropped }
}
