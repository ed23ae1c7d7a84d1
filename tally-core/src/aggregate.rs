//! Group-by + sum for every report definition.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use crate::buckets::{MONTH_ABBREVIATIONS, YearMonth};
use crate::reports::{GroupKey, ReportDef, SeriesOrder};
use crate::table::{LedgerRow, NormalizedTable};

/// One labelled total of a one-dimensional report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// A fully materialized 2-D aggregate; absent combinations hold 0.0
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DenseGrid {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<f64>>,
}

impl DenseGrid {
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn max_cell(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Aggregate {
    Series(Vec<SeriesPoint>),
    Grid(DenseGrid),
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        match self {
            Aggregate::Series(points) => points.is_empty(),
            Aggregate::Grid(grid) => grid.is_empty(),
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            Aggregate::Series(points) => points.iter().map(|p| p.value).sum(),
            Aggregate::Grid(grid) => grid.cells.iter().flatten().sum(),
        }
    }

    pub fn as_series(&self) -> Option<&[SeriesPoint]> {
        match self {
            Aggregate::Series(points) => Some(points),
            Aggregate::Grid(_) => None,
        }
    }

    pub fn as_grid(&self) -> Option<&DenseGrid> {
        match self {
            Aggregate::Grid(grid) => Some(grid),
            Aggregate::Series(_) => None,
        }
    }

    /// Label -> value lookup for series aggregates
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.as_series()?
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.value)
    }
}

/// Filter, group and sum `table` the way `def` describes.
pub fn aggregate(table: &NormalizedTable, def: &ReportDef) -> Aggregate {
    let rows: Vec<&LedgerRow> = table
        .rows()
        .iter()
        .filter(|row| def.filter.accepts(row))
        .collect();

    match def.key {
        GroupKey::Category => series(&rows, |r| r.txn.category.clone(), def.order),
        GroupKey::Mode => series(&rows, |r| r.txn.mode.clone(), def.order),
        GroupKey::Year => series(&rows, |r| r.year, def.order),
        GroupKey::YearMonth => series(&rows, |r| r.year_month, def.order),
        GroupKey::Quarter => series(&rows, |r| r.quarter, def.order),
        GroupKey::YearByMonth => Aggregate::Grid(year_by_month(&rows)),
        GroupKey::YearMonthByCategory => Aggregate::Grid(year_month_by_category(&rows)),
    }
}

/// Sum amounts per key, keeping keys in first-seen order.
pub fn group_sum<K, F>(rows: &[&LedgerRow], key: F) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&LedgerRow) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64)> = Vec::new();

    for &row in rows {
        let k = key(row);
        match index.get(&k) {
            Some(&i) => groups[i].1 += row.txn.amount,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, row.txn.amount));
            }
        }
    }

    groups
}

fn series<K, F>(rows: &[&LedgerRow], key: F, order: SeriesOrder) -> Aggregate
where
    K: Eq + Hash + Clone + Ord + Display,
    F: Fn(&LedgerRow) -> K,
{
    let mut groups = group_sum(rows, key);

    // All sorts are stable, so equal keys/totals keep first-seen order
    match order {
        SeriesOrder::FirstSeen => {}
        SeriesOrder::Chronological => groups.sort_by(|a, b| a.0.cmp(&b.0)),
        SeriesOrder::DescendingTotal => groups.sort_by(|a, b| b.1.total_cmp(&a.1)),
        SeriesOrder::Alphabetical => groups.sort_by_key(|g| g.0.to_string()),
    }

    Aggregate::Series(
        groups
            .into_iter()
            .map(|(k, value)| SeriesPoint {
                label: k.to_string(),
                value,
            })
            .collect(),
    )
}

/// Years with expenses x months Jan..Dec.
fn year_by_month(rows: &[&LedgerRow]) -> DenseGrid {
    let columns: Vec<String> = MONTH_ABBREVIATIONS.iter().map(|m| m.to_string()).collect();
    if rows.is_empty() {
        return DenseGrid {
            rows: Vec::new(),
            columns,
            cells: Vec::new(),
        };
    }

    let years: Vec<i32> = rows
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let year_index: HashMap<i32, usize> = years.iter().enumerate().map(|(i, y)| (*y, i)).collect();

    let mut cells = vec![vec![0.0; 12]; years.len()];
    for row in rows {
        cells[year_index[&row.year]][row.month as usize - 1] += row.txn.amount;
    }

    DenseGrid {
        rows: years.iter().map(|y| y.to_string()).collect(),
        columns,
        cells,
    }
}

/// Year-months with expenses x categories in alphabetical order.
fn year_month_by_category(rows: &[&LedgerRow]) -> DenseGrid {
    if rows.is_empty() {
        return DenseGrid::default();
    }

    let months: Vec<YearMonth> = rows
        .iter()
        .map(|r| r.year_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let month_index: HashMap<YearMonth, usize> =
        months.iter().enumerate().map(|(i, ym)| (*ym, i)).collect();

    let categories: Vec<String> = rows
        .iter()
        .map(|r| r.txn.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let category_index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut cells = vec![vec![0.0; categories.len()]; months.len()];
    for row in rows {
        let m = month_index[&row.year_month];
        let c = category_index[row.txn.category.as_str()];
        cells[m][c] += row.txn.amount;
    }

    DenseGrid {
        rows: months.iter().map(|ym| ym.to_string()).collect(),
        columns: categories,
        cells,
    }
}
