//! tally-ingest: ledger file ingestion (delimited text -> raw rows -> normalized table).

pub mod csv_loader;

pub use csv_loader::{CsvOptions, load_ledger, read_raw_rows, read_raw_rows_from_reader};
