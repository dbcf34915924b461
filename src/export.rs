//! Turning filtered records into a downloadable CSV table.

use crate::{Error, dataset::TransactionRecord, selection::ChartKind};

/// The file name offered to the browser for the exported CSV.
pub const EXPORT_FILE_NAME: &str = "downloaded_data.csv";

/// The label column name of the pie-chart export.
pub const PIE_LABEL_COLUMN: &str = "Labels";
/// The value column name of the pie-chart export.
pub const PIE_VALUE_COLUMN: &str = "Values";

/// A flat table ready to be serialized as CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularExport {
    /// The header row.
    pub columns: Vec<String>,
    /// One row per exported record, cells matching `columns`.
    pub rows: Vec<Vec<String>>,
}

impl TabularExport {
    /// Serialize the table as UTF-8, comma-separated CSV with a header row
    /// and no index column.
    ///
    /// # Errors
    /// Returns [Error::CsvWrite] if serialization fails.
    pub fn to_csv(&self) -> Result<Vec<u8>, Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.columns)
            .map_err(|error| Error::CsvWrite(error.to_string()))?;

        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|error| Error::CsvWrite(error.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|error| Error::CsvWrite(error.to_string()))
    }
}

/// Build the export table for `records`, branching on `chart_kind`.
///
/// For non-pie kinds the filtered records are exported verbatim with all of
/// the dataset's original columns (`headers`). For the pie kind the export is
/// the two-column `(Labels, Values)` table derived exactly like the pie
/// payload: one row per record, duplicate labels allowed, no aggregation.
///
/// Call this with the same filtered record set used for
/// [build_chart](crate::build_chart) so that what the user sees and what they
/// download are always consistent.
pub fn build_export_table(
    records: &[&TransactionRecord],
    chart_kind: ChartKind,
    headers: &[String],
) -> TabularExport {
    match chart_kind {
        ChartKind::Pie => TabularExport {
            columns: vec![PIE_LABEL_COLUMN.to_owned(), PIE_VALUE_COLUMN.to_owned()],
            rows: records
                .iter()
                .map(|record| {
                    vec![
                        record.series_reference.clone(),
                        record.data_value.to_string(),
                    ]
                })
                .collect(),
        },
        _ => TabularExport {
            columns: headers.to_vec(),
            rows: records.iter().map(|record| record.fields.clone()).collect(),
        },
    }
}
