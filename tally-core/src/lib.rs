//! tally-core: ledger types, tolerant date parsing, report definitions and aggregation

pub mod aggregate;
pub mod buckets;
pub mod dates;
pub mod reports;
pub mod table;
pub mod transaction;

pub use aggregate::{Aggregate, DenseGrid, SeriesPoint, aggregate};
pub use buckets::{Quarter, YearMonth};
pub use dates::{DateParser, parse_timezone};
pub use reports::{
    ChartKind, GroupKey, REPORTS, ReportDef, ReportId, ReportSettings, RowFilter, SeriesOrder,
    find_report, is_report_file, standard_reports,
};
pub use table::{LedgerRow, NormalizedTable, normalize};
pub use transaction::{Direction, RawTransaction, Transaction, schema};
