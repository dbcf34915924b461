//! The per-request selection: which series, which period range, which chart.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use crate::Error;

/// The supported chart types.
///
/// `Column` is a vertical-bar alias of `Bar`, kept as its own variant because
/// the selection dialog offers both, but rendered with the same bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// A line per series.
    Line,
    /// A bar group per series.
    Bar,
    /// Vertical bars, rendered identically to [ChartKind::Bar].
    Column,
    /// A line per series, filled down to the zero baseline.
    Area,
    /// Discrete markers per series, no connecting line.
    Scatter,
    /// A single pie of one slice per filtered record.
    Pie,
}

impl ChartKind {
    /// Every supported kind, in the order the selection dialog lists them.
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Column,
        ChartKind::Pie,
        ChartKind::Area,
        ChartKind::Scatter,
    ];

    /// The wire name of the kind, as submitted by the selection form.
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Column => "column",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
        }
    }

    /// The human-readable name shown in the selection dialog.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Column => "Column Chart",
            ChartKind::Area => "Area Chart",
            ChartKind::Scatter => "Scatter Chart",
            ChartKind::Pie => "Pie Chart",
        }
    }

    /// The chart title rendered above the plot.
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Pie => "Pie Chart of Electronic Card Transactions",
            _ => "Electronic Card Transactions Over Time",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = Error;

    /// Parse a chart kind from its wire name.
    ///
    /// This is the only place an out-of-set chart kind can occur: once a
    /// [ChartKind] exists, every variant is renderable.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "column" => Ok(ChartKind::Column),
            "area" => Ok(ChartKind::Area),
            "scatter" => Ok(ChartKind::Scatter),
            "pie" => Ok(ChartKind::Pie),
            other => Err(Error::UnsupportedChartKind(other.to_owned())),
        }
    }
}

/// What the user currently wants to see.
///
/// Constructed fresh from form input on every request and passed explicitly
/// into every query and build call; never stored anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The selected series, in selection order. Order determines trace order
    /// in the chart; membership tests treat this as a set.
    pub series: Vec<String>,
    /// The inclusive period range. A reversed range is simply empty.
    pub period_range: RangeInclusive<i64>,
    /// The chart type to render.
    pub chart_kind: ChartKind,
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::ChartKind;

    #[test]
    fn parses_all_supported_kinds() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.as_str().parse::<ChartKind>().unwrap(), kind);
        }
    }

    #[test]
    fn rejects_unsupported_kind() {
        let error = "heatmap".parse::<ChartKind>().unwrap_err();

        assert_eq!(error, Error::UnsupportedChartKind("heatmap".to_owned()));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Line".parse::<ChartKind>().is_err());
    }

    #[test]
    fn pie_has_its_own_title() {
        assert_eq!(
            ChartKind::Pie.title(),
            "Pie Chart of Electronic Card Transactions"
        );
        assert_eq!(
            ChartKind::Line.title(),
            "Electronic Card Transactions Over Time"
        );
        assert_eq!(ChartKind::Column.title(), ChartKind::Bar.title());
    }
}
