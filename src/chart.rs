//! Turning filtered records into a renderer-agnostic chart description.
//!
//! [build_chart] is a pure function of its inputs: the same filtered records
//! and selection always produce a deep-equal [ChartPayload]. Rendering the
//! payload with a concrete chart library happens in the presentation layer.

use crate::{dataset::TransactionRecord, selection::ChartKind};

/// The x-axis label for the period axis of non-pie charts.
pub const X_AXIS_LABEL: &str = "Period";
/// The y-axis label for the value axis of non-pie charts.
pub const Y_AXIS_LABEL: &str = "Data Value";

/// One renderable data series within a non-pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// The series identifier, shown in the chart legend.
    pub name: String,
    /// The series' `(period, data_value)` pairs in the records' native order.
    /// The table's order is trusted; no re-sorting is performed.
    pub points: Vec<(i64, f64)>,
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// The series identifier of the record this slice came from.
    pub label: String,
    /// The record's data value.
    pub value: f64,
}

/// The abstract, renderer-agnostic description of what to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPayload {
    /// One trace per selected series, for every kind except pie.
    Series {
        /// Which of the non-pie kinds to draw the traces as.
        kind: ChartKind,
        /// One entry per selected series, in selection order. A series with
        /// no matching records contributes an empty trace, not a missing one.
        traces: Vec<Trace>,
    },
    /// One slice per matching record.
    ///
    /// Per-series partitioning is ignored and no aggregation is performed: a
    /// series selected with several periods in range produces several slices
    /// with the same label. This mirrors the source data exactly.
    Pie {
        /// The `(label, value)` pairs, one per record, in record order.
        slices: Vec<Slice>,
    },
}

impl ChartPayload {
    /// The chart title for this payload.
    pub fn title(&self) -> &'static str {
        match self {
            ChartPayload::Series { kind, .. } => kind.title(),
            ChartPayload::Pie { .. } => ChartKind::Pie.title(),
        }
    }
}

/// Build the chart description for `records`, branching on `chart_kind`.
///
/// `records` must be the result of a [Dataset::query](crate::Dataset::query)
/// for `selected_series`; the export table must be built from the same
/// records so the chart and the download always agree.
pub fn build_chart(
    records: &[&TransactionRecord],
    chart_kind: ChartKind,
    selected_series: &[String],
) -> ChartPayload {
    match chart_kind {
        ChartKind::Pie => ChartPayload::Pie {
            slices: records
                .iter()
                .map(|record| Slice {
                    label: record.series_reference.clone(),
                    value: record.data_value,
                })
                .collect(),
        },
        kind => ChartPayload::Series {
            kind,
            traces: selected_series
                .iter()
                .map(|name| Trace {
                    name: name.clone(),
                    points: records
                        .iter()
                        .filter(|record| record.series_reference == *name)
                        .map(|record| (record.period, record.data_value))
                        .collect(),
                })
                .collect(),
        },
    }
}
