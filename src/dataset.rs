//! Loading and querying the electronic card transactions dataset.
//!
//! The dataset is parsed from CSV once at startup and never mutated
//! afterwards, so it can be shared by reference across request handlers.
//! All queries are bounded scans over the in-memory table.

use std::{collections::HashSet, fs::File, io::Read, path::Path};

use crate::{Error, selection::Selection};

/// The column holding the series identifier.
pub const SERIES_COLUMN: &str = "Series_reference";
/// The column holding the time period, a year or year-month integer.
pub const PERIOD_COLUMN: &str = "Period";
/// The column holding the measured value.
pub const VALUE_COLUMN: &str = "Data_value";

/// One row of the dataset.
///
/// Only the three columns named above are interpreted; every other column
/// passes through untouched in [TransactionRecord::fields] so exports can
/// reproduce the original table verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Identifier of the data series this row belongs to. Not unique across
    /// rows, there are many periods per series.
    pub series_reference: String,
    /// The time period this row was measured in.
    pub period: i64,
    /// The measured value for the series at this period.
    pub data_value: f64,
    /// The complete original row, all columns in file order.
    pub fields: Vec<String>,
}

/// The in-memory transactions table.
///
/// Constructed once with [Dataset::from_path] (or [Dataset::from_reader] in
/// tests) and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<TransactionRecord>,
    series_catalog: Vec<String>,
    period_bounds: (i64, i64),
}

impl Dataset {
    /// Load the dataset from a CSV file at `path`.
    ///
    /// # Errors
    /// Returns [Error::DatasetUnreadable] if the file cannot be opened, and
    /// any of the parse errors documented on [Dataset::from_reader].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|error| Error::DatasetUnreadable {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;

        Self::from_reader(file)
    }

    /// Parse the dataset from any reader producing CSV text.
    ///
    /// The first row must be a header row containing at least the
    /// `Series_reference`, `Period` and `Data_value` columns, in any order.
    ///
    /// # Errors
    /// - [Error::MissingColumn] if a required column is absent.
    /// - [Error::InvalidRow] if a row is malformed or a `Period`/`Data_value`
    ///   cell does not parse as a number.
    /// - [Error::EmptyDataset] if there are no data rows.
    pub fn from_reader(reader: impl Read) -> Result<Self, Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|error| Error::InvalidRow {
                row: 0,
                reason: error.to_string(),
            })?
            .iter()
            .map(str::to_owned)
            .collect();

        let series_column = find_column(&headers, SERIES_COLUMN)?;
        let period_column = find_column(&headers, PERIOD_COLUMN)?;
        let value_column = find_column(&headers, VALUE_COLUMN)?;

        let mut records = Vec::new();
        let mut series_catalog = Vec::new();
        let mut seen_series = HashSet::new();
        let mut period_bounds: Option<(i64, i64)> = None;

        for (index, row) in csv_reader.records().enumerate() {
            // Data rows are numbered from 1, the header row is not counted.
            let row_number = index + 1;
            let row = row.map_err(|error| Error::InvalidRow {
                row: row_number,
                reason: error.to_string(),
            })?;

            let record = parse_record(
                &row,
                row_number,
                series_column,
                period_column,
                value_column,
            )?;

            if seen_series.insert(record.series_reference.clone()) {
                series_catalog.push(record.series_reference.clone());
            }

            period_bounds = Some(match period_bounds {
                None => (record.period, record.period),
                Some((min, max)) => (min.min(record.period), max.max(record.period)),
            });

            records.push(record);
        }

        let period_bounds = period_bounds.ok_or(Error::EmptyDataset)?;

        Ok(Self {
            headers,
            records,
            series_catalog,
            period_bounds,
        })
    }

    /// The original column names, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The distinct series identifiers, in the order they first appear in the
    /// file. Computed once at load and immutable for the process lifetime.
    pub fn series_catalog(&self) -> &[String] {
        &self.series_catalog
    }

    /// The minimum and maximum period across the whole dataset, used to bound
    /// the period range selector.
    pub fn period_bounds(&self) -> (i64, i64) {
        self.period_bounds
    }

    /// The number of rows in the dataset.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows. Always false for a loaded dataset,
    /// since an empty file is rejected at load.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the records whose series is in the selection's series set and
    /// whose period lies within the selection's inclusive range, preserving
    /// the original row order.
    ///
    /// An empty series list or an empty range yields an empty vector, not an
    /// error. The selection's chart kind is ignored here.
    pub fn query(&self, selection: &Selection) -> Vec<&TransactionRecord> {
        let selected: HashSet<&str> = selection.series.iter().map(String::as_str).collect();

        self.records
            .iter()
            .filter(|record| {
                selected.contains(record.series_reference.as_str())
                    && selection.period_range.contains(&record.period)
            })
            .collect()
    }
}

fn find_column(headers: &[String], name: &'static str) -> Result<usize, Error> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or(Error::MissingColumn(name))
}

fn parse_record(
    row: &csv::StringRecord,
    row_number: usize,
    series_column: usize,
    period_column: usize,
    value_column: usize,
) -> Result<TransactionRecord, Error> {
    let cell = |column: usize, name: &str| {
        row.get(column).ok_or_else(|| Error::InvalidRow {
            row: row_number,
            reason: format!("missing cell for column \"{name}\""),
        })
    };

    let series_reference = cell(series_column, SERIES_COLUMN)?.to_owned();

    let period_text = cell(period_column, PERIOD_COLUMN)?;
    let period = period_text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidRow {
            row: row_number,
            reason: format!("\"{period_text}\" is not a valid period"),
        })?;

    let value_text = cell(value_column, VALUE_COLUMN)?;
    let data_value = value_text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidRow {
            row: row_number,
            reason: format!("\"{value_text}\" is not a valid data value"),
        })?;

    Ok(TransactionRecord {
        series_reference,
        period,
        data_value,
        fields: row.iter().map(str::to_owned).collect(),
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        selection::{ChartKind, Selection},
    };

    use super::Dataset;

    const TEST_CSV: &str = "\
Series_reference,Period,Data_value,Units,Group
A,2020,10.5,Dollars,Total
A,2021,11.25,Dollars,Total
B,2020,3.0,Dollars,Total
B,2022,4.75,Dollars,Total
A,2022,12.0,Dollars,Total
";

    fn test_dataset() -> Dataset {
        Dataset::from_reader(TEST_CSV.as_bytes()).unwrap()
    }

    fn selection(series: &[&str], range: std::ops::RangeInclusive<i64>) -> Selection {
        Selection {
            series: series.iter().map(|series| series.to_string()).collect(),
            period_range: range,
            chart_kind: ChartKind::Line,
        }
    }

    #[test]
    fn loads_records_catalog_and_bounds() {
        let dataset = test_dataset();

        assert_eq!(dataset.len(), 5);
        assert_eq!(
            dataset.headers(),
            ["Series_reference", "Period", "Data_value", "Units", "Group"]
        );
        assert_eq!(dataset.series_catalog(), ["A", "B"]);
        assert_eq!(dataset.period_bounds(), (2020, 2022));
    }

    #[test]
    fn series_catalog_is_in_first_seen_order() {
        let csv = "Series_reference,Period,Data_value\nZ,2020,1.0\nA,2020,2.0\nZ,2021,3.0\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.series_catalog(), ["Z", "A"]);
    }

    #[test]
    fn missing_required_column_is_a_load_error() {
        let csv = "Series_reference,Data_value\nA,1.0\n";
        let result = Dataset::from_reader(csv.as_bytes());

        assert_eq!(result.unwrap_err(), Error::MissingColumn("Period"));
    }

    #[test]
    fn unparseable_period_is_a_load_error_with_row_number() {
        let csv = "Series_reference,Period,Data_value\nA,2020,1.0\nA,March,2.0\n";
        let error = Dataset::from_reader(csv.as_bytes()).unwrap_err();

        assert_eq!(
            error,
            Error::InvalidRow {
                row: 2,
                reason: "\"March\" is not a valid period".to_owned()
            }
        );
    }

    #[test]
    fn unparseable_data_value_is_a_load_error() {
        let csv = "Series_reference,Period,Data_value\nA,2020,n/a\n";
        let error = Dataset::from_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(error, Error::InvalidRow { row: 1, .. }));
    }

    #[test]
    fn dataset_with_no_data_rows_is_rejected() {
        let csv = "Series_reference,Period,Data_value\n";
        let result = Dataset::from_reader(csv.as_bytes());

        assert_eq!(result.unwrap_err(), Error::EmptyDataset);
    }

    #[test]
    fn query_filters_by_series_and_inclusive_period_range() {
        let dataset = test_dataset();

        let records = dataset.query(&selection(&["A"], 2020..=2021));

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.series_reference == "A"));
        assert_eq!(records[0].period, 2020);
        assert_eq!(records[1].period, 2021);
    }

    #[test]
    fn query_includes_boundary_periods() {
        let dataset = test_dataset();

        let records = dataset.query(&selection(&["A", "B"], 2020..=2022));

        assert_eq!(records.len(), 5, "boundary periods must be included");
    }

    #[test]
    fn query_preserves_original_row_order() {
        let dataset = test_dataset();

        let records = dataset.query(&selection(&["A", "B"], 2020..=2022));
        let periods: Vec<i64> = records.iter().map(|record| record.period).collect();

        // File order, not sorted: A/2020, A/2021, B/2020, B/2022, A/2022.
        assert_eq!(periods, [2020, 2021, 2020, 2022, 2022]);
    }

    #[test]
    fn query_with_no_series_yields_empty() {
        let dataset = test_dataset();

        assert!(dataset.query(&selection(&[], 2020..=2022)).is_empty());
    }

    #[test]
    fn query_with_inverted_range_yields_empty() {
        let dataset = test_dataset();

        assert!(dataset.query(&selection(&["A"], 2022..=2020)).is_empty());
    }

    #[test]
    fn query_with_unknown_series_yields_empty() {
        let dataset = test_dataset();

        assert!(dataset.query(&selection(&["C"], 2020..=2022)).is_empty());
    }

    #[test]
    fn query_is_idempotent() {
        let dataset = test_dataset();
        let selection = selection(&["A", "B"], 2020..=2021);

        assert_eq!(dataset.query(&selection), dataset.query(&selection));
    }

    #[test]
    fn records_keep_all_original_columns() {
        let dataset = test_dataset();

        let records = dataset.query(&selection(&["B"], 2020..=2020));

        assert_eq!(records[0].fields, ["B", "2020", "3.0", "Dollars", "Total"]);
    }
}
