//! Chart rendering for the dashboard.
//!
//! Maps the renderer-agnostic [ChartPayload] onto an ECharts configuration
//! via charming, and provides the HTML container and the JavaScript that
//! initializes the chart in the browser.

use std::collections::{HashMap, HashSet};

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AreaStyle, AxisPointer, AxisPointerType, AxisType, Tooltip, Trigger},
    series::{Bar, Line, Pie, Scatter, Series},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    chart::{ChartPayload, Slice, Trace, X_AXIS_LABEL, Y_AXIS_LABEL},
    selection::ChartKind,
};

/// The HTML element ID of the dashboard chart container.
pub(super) const CHART_CONTAINER_ID: &str = "transactions-chart";

/// The dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl DashboardChart {
    pub(super) fn from_payload(payload: &ChartPayload) -> Self {
        Self {
            id: CHART_CONTAINER_ID,
            options: transactions_chart(payload).to_string(),
        }
    }
}

/// Renders the HTML container for the dashboard chart.
pub(super) fn chart_container(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[420px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// Generates the JavaScript that initializes the chart with dark mode support
/// and responsive resizing.
///
/// The script is emitted inline after the container so it runs both on the
/// initial page load (the echarts script tag precedes the body) and when HTMX
/// swaps the chart panel, which re-executes script tags in the new content.
/// Any previous ECharts instance on the container is disposed first.
pub(super) fn chart_script(chart: &DashboardChart) -> Markup {
    let script = format!(
        r#"(function() {{
            const chartDom = document.getElementById("{}");
            const previous = echarts.getInstanceByDom(chartDom);
            if (previous) {{
                previous.dispose();
            }}
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        chart.id, chart.options
    );

    html!( script { (PreEscaped(script)) } )
}

/// Build the ECharts configuration for `payload`.
pub(super) fn transactions_chart(payload: &ChartPayload) -> Chart {
    match payload {
        ChartPayload::Series { kind, traces } => series_chart(*kind, traces),
        ChartPayload::Pie { slices } => pie_chart(slices),
    }
}

fn series_chart(kind: ChartKind, traces: &[Trace]) -> Chart {
    let periods = distinct_periods(traces);
    let labels: Vec<String> = periods.iter().map(i64::to_string).collect();

    let mut chart = Chart::new()
        .title(Title::new().text(kind.title()))
        .legend(Legend::new())
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name(X_AXIS_LABEL)
                .data(labels),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name(Y_AXIS_LABEL));

    for trace in traces {
        chart = chart.series(trace_series(kind, trace, &periods));
    }

    chart
}

fn pie_chart(slices: &[Slice]) -> Chart {
    let data: Vec<(f64, &str)> = slices
        .iter()
        .map(|slice| (slice.value, slice.label.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text(ChartKind::Pie.title()))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new())
        .series(Pie::new().radius("55%").data(data))
}

fn trace_series(kind: ChartKind, trace: &Trace, periods: &[i64]) -> Series {
    let name = trace.name.clone();
    let values = align_to_periods(&trace.points, periods);

    match kind {
        ChartKind::Line => Line::new().name(name).data(values).into(),
        // Column is a vertical-bar alias of bar, not a distinct rendering.
        ChartKind::Bar | ChartKind::Column => Bar::new().name(name).data(values).into(),
        ChartKind::Area => Line::new()
            .name(name)
            .area_style(AreaStyle::new())
            .data(values)
            .into(),
        ChartKind::Scatter => Scatter::new().name(name).data(values).into(),
        // Pie payloads carry slices, not traces.
        ChartKind::Pie => unreachable!("pie charts are rendered from ChartPayload::Pie"),
    }
}

/// The distinct periods across all traces, in first-seen order. These become
/// the category axis of every non-pie chart.
fn distinct_periods(traces: &[Trace]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut periods = Vec::new();

    for trace in traces {
        for (period, _) in &trace.points {
            if seen.insert(*period) {
                periods.push(*period);
            }
        }
    }

    periods
}

/// A trace's values aligned to the category axis, `None` where the trace has
/// no point for a period.
fn align_to_periods(points: &[(i64, f64)], periods: &[i64]) -> Vec<Option<f64>> {
    let by_period: HashMap<i64, f64> = points.iter().copied().collect();

    periods
        .iter()
        .map(|period| by_period.get(period).copied())
        .collect()
}
