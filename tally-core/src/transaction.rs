//! Transaction record types for the household ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the ledger export. These are a contract with the data
/// source; nothing else in the workspace spells them out.
pub mod schema {
    pub const DATE: &str = "Date";
    pub const DIRECTION: &str = "Income/Expense";
    pub const CATEGORY: &str = "Category";
    pub const MODE: &str = "Mode";
    pub const AMOUNT: &str = "Amount";

    /// Every column the loader requires, in record order.
    pub const REQUIRED: [&str; 5] = [DATE, DIRECTION, CATEGORY, MODE, AMOUNT];
}

/// One row exactly as it appears in the file, before any coercion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Free-text date, parsed tolerantly during normalization
    pub date: String,
    pub direction: String,
    pub category: String,
    /// Payment channel (Cash, Card, Bank Account, ...)
    pub mode: String,
    pub amount: String,
}

impl RawTransaction {
    pub fn new(
        date: impl Into<String>,
        direction: impl Into<String>,
        category: impl Into<String>,
        mode: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            direction: direction.into(),
            category: category.into(),
            mode: mode.into(),
            amount: amount.into(),
        }
    }
}

/// Whether money came in or went out
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
    /// Anything else the source writes in the column (e.g. "Transfer-Out").
    /// Kept verbatim: it never matches the expense filter but still counts
    /// in unfiltered totals.
    #[serde(rename = "other")]
    Other(String),
}

impl Direction {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Income" => Direction::Income,
            "Expense" => Direction::Expense,
            other => Direction::Other(other.to_string()),
        }
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, Direction::Expense)
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Direction::Income)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::Income => "Income",
            Direction::Expense => "Expense",
            Direction::Other(s) => s,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry with a parsed date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub direction: Direction,
    pub category: String,
    pub mode: String,
    /// Passed through as written; the source records outflows as positive numbers
    pub amount: f64,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        direction: Direction,
        category: impl Into<String>,
        mode: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            date,
            direction,
            category: category.into(),
            mode: mode.into(),
            amount,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.direction.is_expense()
    }
}

/// Parse an amount cell, tolerating padding and thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("Expense"), Direction::Expense);
        assert_eq!(Direction::parse("  Income "), Direction::Income);
        assert_eq!(
            Direction::parse("Transfer-Out"),
            Direction::Other("Transfer-Out".to_string())
        );
        // Exact match only: the source compares case-sensitively
        assert!(!Direction::parse("expense").is_expense());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), Some(100.0));
        assert_eq!(parse_amount(" 1,250.50 "), Some(1250.5));
        assert_eq!(parse_amount("10_000"), Some(10000.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
    }
}
