//! The fixed set of report definitions.
//!
//! Every chart on the dashboard is described here as data: which rows it
//! keeps, how it groups them, how the groups are ordered, and how it is
//! drawn. One aggregation function and one renderer consume these.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::table::LedgerRow;

/// Stable report identifiers (also the keys used by the web page)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportId {
    MonthlyTrends,
    CategoryBreakdown,
    PaymentModes,
    SpendingHeatmap,
    CategoryPie,
    YearlySpending,
    QuarterlySpending,
    CategoryOverTime,
}

impl ReportId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportId::MonthlyTrends => "monthly_trends",
            ReportId::CategoryBreakdown => "category_breakdown",
            ReportId::PaymentModes => "payment_modes",
            ReportId::SpendingHeatmap => "spending_heatmap",
            ReportId::CategoryPie => "category_pie",
            ReportId::YearlySpending => "yearly_spending",
            ReportId::QuarterlySpending => "quarterly_spending",
            ReportId::CategoryOverTime => "category_over_time",
        }
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match REPORTS.iter().find(|def| def.id.as_str() == s.trim()) {
            Some(def) => Ok(def.id),
            None => {
                let known: Vec<_> = REPORTS.iter().map(|d| d.id.as_str()).collect();
                bail!("unknown report '{s}' (expected one of: {})", known.join(", "))
            }
        }
    }
}

/// Which rows a report looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
    Expenses,
    All,
}

impl RowFilter {
    pub fn accepts(&self, row: &LedgerRow) -> bool {
        match self {
            RowFilter::Expenses => row.txn.is_expense(),
            RowFilter::All => true,
        }
    }
}

/// Partition key(s) for the sum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Category,
    Mode,
    Year,
    YearMonth,
    Quarter,
    /// Dense year x month grid
    YearByMonth,
    /// Dense year-month x category grid
    YearMonthByCategory,
}

impl GroupKey {
    pub fn is_grid(&self) -> bool {
        matches!(self, GroupKey::YearByMonth | GroupKey::YearMonthByCategory)
    }
}

/// How the groups of a one-dimensional report are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesOrder {
    /// Largest total first; ties keep first-seen order
    DescendingTotal,
    /// Ascending bucket order
    Chronological,
    /// Order in which each key first appears in the ledger
    FirstSeen,
    Alphabetical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    HorizontalBar,
    Bar,
    Heatmap,
    Donut,
    StackedArea,
}

/// Static description of one dashboard chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportDef {
    pub id: ReportId,
    pub title: &'static str,
    pub filter: RowFilter,
    pub key: GroupKey,
    pub order: SeriesOrder,
    pub chart: ChartKind,
    /// Written into the output directory; stable across runs
    pub file_name: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// Canvas size in pixels
    pub size: (u32, u32),
}

pub const REPORTS: [ReportDef; 8] = [
    ReportDef {
        id: ReportId::MonthlyTrends,
        title: "Monthly Spending Trends",
        filter: RowFilter::Expenses,
        key: GroupKey::YearMonth,
        order: SeriesOrder::Chronological,
        chart: ChartKind::Line,
        file_name: "monthly_spending_trends.png",
        x_label: "Month",
        y_label: "Total Spending (INR)",
        size: (1000, 500),
    },
    ReportDef {
        id: ReportId::CategoryBreakdown,
        title: "Category-Wise Breakdown of Expenses",
        filter: RowFilter::Expenses,
        key: GroupKey::Category,
        order: SeriesOrder::DescendingTotal,
        chart: ChartKind::HorizontalBar,
        file_name: "category_breakdown.png",
        x_label: "Total Spending (INR)",
        y_label: "Category",
        size: (900, 600),
    },
    ReportDef {
        id: ReportId::PaymentModes,
        title: "Payment Mode Distribution",
        filter: RowFilter::All,
        key: GroupKey::Mode,
        order: SeriesOrder::FirstSeen,
        chart: ChartKind::HorizontalBar,
        file_name: "payment_mode_analysis.png",
        x_label: "Total Amount (INR)",
        y_label: "Mode",
        size: (900, 500),
    },
    ReportDef {
        id: ReportId::SpendingHeatmap,
        title: "Heatmap of Monthly Spending by Year",
        filter: RowFilter::Expenses,
        key: GroupKey::YearByMonth,
        order: SeriesOrder::Chronological,
        chart: ChartKind::Heatmap,
        file_name: "spending_heatmap.png",
        x_label: "Month",
        y_label: "Year",
        size: (1000, 600),
    },
    ReportDef {
        id: ReportId::CategoryPie,
        title: "Category-Wise Spending Distribution",
        filter: RowFilter::Expenses,
        key: GroupKey::Category,
        order: SeriesOrder::FirstSeen,
        chart: ChartKind::Donut,
        file_name: "category_pie_chart.png",
        x_label: "",
        y_label: "",
        size: (800, 800),
    },
    ReportDef {
        id: ReportId::YearlySpending,
        title: "Yearly Spending Analysis",
        filter: RowFilter::Expenses,
        key: GroupKey::Year,
        order: SeriesOrder::Chronological,
        chart: ChartKind::Bar,
        file_name: "yearly_spending.png",
        x_label: "Year",
        y_label: "Total Spending",
        size: (800, 500),
    },
    ReportDef {
        id: ReportId::QuarterlySpending,
        title: "Quarterly Spending Analysis",
        filter: RowFilter::Expenses,
        key: GroupKey::Quarter,
        order: SeriesOrder::Chronological,
        chart: ChartKind::Bar,
        file_name: "quarterly_spending.png",
        x_label: "Quarter",
        y_label: "Total Spending",
        size: (800, 500),
    },
    ReportDef {
        id: ReportId::CategoryOverTime,
        title: "Category-Wise Spending Over Time",
        filter: RowFilter::Expenses,
        key: GroupKey::YearMonthByCategory,
        order: SeriesOrder::Chronological,
        chart: ChartKind::StackedArea,
        file_name: "category_over_time.png",
        x_label: "Month",
        y_label: "Total Spending",
        size: (1200, 600),
    },
];

/// Ordering policy for reports whose groups have no natural order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub unordered_breakdown: SeriesOrder,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            unordered_breakdown: SeriesOrder::FirstSeen,
        }
    }
}

/// The eight report definitions with `settings` applied.
pub fn standard_reports(settings: &ReportSettings) -> Vec<ReportDef> {
    REPORTS
        .iter()
        .map(|def| {
            let mut def = *def;
            if def.order == SeriesOrder::FirstSeen {
                def.order = settings.unordered_breakdown;
            }
            def
        })
        .collect()
}

/// Look up a definition by id. `REPORTS` is laid out in `ReportId` order.
pub fn find_report(id: ReportId) -> &'static ReportDef {
    &REPORTS[id as usize]
}

/// True when `file_name` is one of the report outputs.
pub fn is_report_file(file_name: &str) -> bool {
    REPORTS.iter().any(|def| def.file_name == file_name)
}
