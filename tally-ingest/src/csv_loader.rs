//! Read household-ledger CSV exports into raw rows.
//!
//! Expected header (extra columns such as Subcategory/Note/Currency are ignored):
//! Date,Mode,Category,Subcategory,Note,Amount,Income/Expense,Currency

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tally_core::{DateParser, NormalizedTable, RawTransaction, normalize, schema};
use tracing::info;

/// Reader settings for the ledger file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Position of each required column in the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    date: usize,
    direction: usize,
    category: usize,
    mode: usize,
    amount: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .with_context(|| {
                    format!(
                        "missing column '{name}' (found: {})",
                        headers.iter().collect::<Vec<_>>().join(", ")
                    )
                })
        };

        Ok(Self {
            date: find(schema::DATE)?,
            direction: find(schema::DIRECTION)?,
            category: find(schema::CATEGORY)?,
            mode: find(schema::MODE)?,
            amount: find(schema::AMOUNT)?,
        })
    }

    fn extract(&self, record: &StringRecord) -> RawTransaction {
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        RawTransaction {
            date: field(self.date),
            direction: field(self.direction),
            category: field(self.category),
            mode: field(self.mode),
            amount: field(self.amount),
        }
    }
}

/// Read every data row of a ledger file. Dates are left as text.
pub fn read_raw_rows(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Vec<RawTransaction>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("ledger file not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_raw_rows_from_reader(file, options).with_context(|| format!("reading {}", path.display()))
}

/// Same as [`read_raw_rows`] for any byte source.
///
/// A completely empty input (no header) yields no rows rather than an error.
pub fn read_raw_rows_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Vec<RawTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading header row")?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(Vec::new());
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = result.with_context(|| format!("malformed record at line {}", i + 2))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(columns.extract(&record));
    }

    Ok(rows)
}

/// Read and normalize a ledger file in one step.
pub fn load_ledger(
    path: impl AsRef<Path>,
    options: &CsvOptions,
    parser: &DateParser,
) -> Result<NormalizedTable> {
    let path = path.as_ref();
    let raw = read_raw_rows(path, options)?;
    let total = raw.len();
    let table = normalize(raw, parser);

    info!(
        path = %path.display(),
        rows = total,
        kept = table.len(),
        dropped = table.dropped(),
        "loaded ledger"
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Date,Mode,Category,Subcategory,Note,Amount,Income/Expense,Currency
20/09/2018 12:04:08,Cash,Transportation,Train,2 Place 5 to Place 0,30,Expense,INR
20/09/2018 12:03:15,Cash,Food,snacks,Idli medu Vada mix 2 plates,60,Expense,INR
not-a-date,Saving Bank account 1,Salary,,September salary,\"50,000\",Income,INR
19/09/2018,Saving Bank account 1,subscription,Netflix,1 month subscription,199,Expense,INR
";

    #[test]
    fn test_reads_rows_by_header_name() {
        let rows = read_raw_rows_from_reader(SAMPLE.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, "20/09/2018 12:04:08");
        assert_eq!(rows[0].mode, "Cash");
        assert_eq!(rows[0].category, "Transportation");
        assert_eq!(rows[0].amount, "30");
        assert_eq!(rows[0].direction, "Expense");
        assert_eq!(rows[2].amount, "50,000");
    }

    #[test]
    fn test_normalizes_sample() {
        let rows = read_raw_rows_from_reader(SAMPLE.as_bytes(), &CsvOptions::default()).unwrap();
        let table = normalize(rows, &DateParser::new());
        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped(), 1);
        assert_eq!(
            table.rows()[2].txn.date,
            NaiveDate::from_ymd_opt(2018, 9, 19).unwrap()
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let input = "Date,Mode,Category,Income/Expense\n2024-01-05,Cash,Food,Expense\n";
        let err = read_raw_rows_from_reader(input.as_bytes(), &CsvOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("missing column 'Amount'"));
    }

    #[test]
    fn test_empty_input_has_no_rows() {
        let rows = read_raw_rows_from_reader("".as_bytes(), &CsvOptions::default()).unwrap();
        assert!(rows.is_empty());

        let header_only = "Date,Income/Expense,Category,Mode,Amount\n";
        let rows = read_raw_rows_from_reader(header_only.as_bytes(), &CsvOptions::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_semicolon_delimiter_and_padded_headers() {
        let input = " Date ; Income/Expense ;Category;Mode;Amount\n2024-01-05;Expense;Food;Cash;100\n";
        let options = CsvOptions { delimiter: b';' };
        let rows = read_raw_rows_from_reader(input.as_bytes(), &options).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].direction, "Expense");
        assert_eq!(rows[0].amount, "100");
    }

    #[test]
    fn test_missing_file() {
        let err = read_raw_rows("/definitely/not/here.csv", &CsvOptions::default()).unwrap_err();
        assert!(err.to_string().contains("ledger file not found"));
    }
}
