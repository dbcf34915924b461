//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard, re-rendering the chart for
//!   a new selection, and downloading the filtered rows as CSV
//! - HTML view functions for rendering the dashboard UI
//! - The form type the selection controls submit

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, Query};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    chart::build_chart,
    dashboard::charts::{DashboardChart, chart_container, chart_script},
    dataset::Dataset,
    endpoints,
    export::{EXPORT_FILE_NAME, build_export_table},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, base,
    },
    selection::{ChartKind, Selection},
    state::AppState,
};

/// The selection as submitted by the dashboard form, and as carried in the
/// download link's query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionForm {
    /// The checked series, in document order. Defaults to empty when no
    /// checkbox is checked, since browsers omit unchecked boxes entirely.
    #[serde(default)]
    pub series: Vec<String>,
    /// Lower bound of the period range, inclusive.
    pub period_min: i64,
    /// Upper bound of the period range, inclusive.
    pub period_max: i64,
    /// The wire name of the chart kind, e.g. "line".
    pub chart_kind: String,
}

impl SelectionForm {
    /// The selection shown on first page load: the first series in the
    /// catalog over the full period range, as a line chart.
    fn default_for(dataset: &Dataset) -> Self {
        let (period_min, period_max) = dataset.period_bounds();

        Self {
            series: dataset.series_catalog().iter().take(1).cloned().collect(),
            period_min,
            period_max,
            chart_kind: ChartKind::Line.as_str().to_owned(),
        }
    }

    /// Validate the form into a [Selection].
    ///
    /// # Errors
    /// - [Error::EmptySelection] if no series was checked.
    /// - [Error::UnsupportedChartKind] if the chart kind string is not one of
    ///   the six supported names.
    fn to_selection(&self) -> Result<Selection, Error> {
        if self.series.is_empty() {
            return Err(Error::EmptySelection);
        }

        Ok(Selection {
            series: self.series.clone(),
            period_range: self.period_min..=self.period_max,
            chart_kind: self.chart_kind.parse()?,
        })
    }

    /// The download URL carrying this selection as query parameters, so the
    /// export is always built from the same filtered rows as the chart.
    fn download_href(&self) -> String {
        match serde_html_form::to_string(self) {
            Ok(query) => format!("{}?{query}", endpoints::DOWNLOAD),
            Err(error) => {
                tracing::error!("could not encode the download query: {error}");
                endpoints::DOWNLOAD.to_owned()
            }
        }
    }
}

/// Display the dashboard with the default selection.
pub async fn get_dashboard_page(State(state): State<AppState>) -> Result<Response, Error> {
    let form = SelectionForm::default_for(&state.dataset);
    let chart = build_dashboard_chart(&state, &form.to_selection()?);

    Ok(dashboard_view(&state, &form, &chart).into_response())
}

/// Re-render the chart for a new selection.
///
/// HTMX requests get the chart panel partial; anything else (e.g. a plain
/// form post with scripting disabled) gets the full page re-rendered with the
/// submitted selection.
pub async fn update_chart(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Form(form): Form<SelectionForm>,
) -> Result<Response, Error> {
    let selection = form.to_selection()?;
    let chart = build_dashboard_chart(&state, &selection);

    if is_htmx {
        Ok(chart_panel(&chart, &form.download_href()).into_response())
    } else {
        Ok(dashboard_view(&state, &form, &chart).into_response())
    }
}

/// Download the currently filtered rows as a CSV attachment.
pub async fn download_data(
    State(state): State<AppState>,
    Query(form): Query<SelectionForm>,
) -> Result<Response, Error> {
    let selection = form.to_selection()?;
    let records = state.dataset.query(&selection);
    let table = build_export_table(&records, selection.chart_kind, state.dataset.headers());
    let body = table.to_csv()?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Query the dataset and build the chart for `selection`.
fn build_dashboard_chart(state: &AppState, selection: &Selection) -> DashboardChart {
    let records = state.dataset.query(selection);
    let payload = build_chart(&records, selection.chart_kind, &selection.series);

    DashboardChart::from_payload(&payload)
}

/// Renders the full dashboard page.
fn dashboard_view(state: &AppState, form: &SelectionForm, chart: &DashboardChart) -> Markup {
    let (min_period, max_period) = state.dataset.period_bounds();

    let content = html!(
        div class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
            max-w-screen-xl text-gray-900 dark:text-white"
        {
            h1 class="mb-6 text-2xl font-bold" { "Electronic Card Transactions Dashboard" }

            form
                hx-post=(endpoints::CHART)
                hx-target="#chart-panel"
                hx-swap="innerHTML"
                hx-trigger="change, submit"
                class="w-full mb-4 grid grid-cols-1 gap-4 rounded-lg bg-white p-4
                    shadow dark:bg-gray-800 lg:grid-cols-3"
            {
                div
                {
                    span class=(FORM_LABEL_STYLE) { "Select Series" }

                    div class="grid grid-cols-2 gap-2 md:grid-cols-3"
                    {
                        @for series in state.dataset.series_catalog() {
                            label class="flex items-center space-x-2 text-sm"
                            {
                                input
                                    type="checkbox"
                                    name="series"
                                    value=(series)
                                    checked[form.series.contains(series)]
                                    class="rounded-sm border-gray-300 text-blue-600
                                        shadow-xs focus:border-blue-300 focus:ring-3
                                        focus:ring-blue-200/50"
                                ;

                                span { (series) }
                            }
                        }
                    }
                }

                div
                {
                    label for="period_min" class=(FORM_LABEL_STYLE) { "From Period" }
                    input
                        type="number"
                        id="period_min"
                        name="period_min"
                        value=(form.period_min)
                        min=(min_period)
                        max=(max_period)
                        class=(FORM_TEXT_INPUT_STYLE)
                    ;

                    label for="period_max" class=(FORM_LABEL_STYLE) { "To Period" }
                    input
                        type="number"
                        id="period_max"
                        name="period_max"
                        value=(form.period_max)
                        min=(min_period)
                        max=(max_period)
                        class=(FORM_TEXT_INPUT_STYLE)
                    ;
                }

                (chart_kind_dialog(&form.chart_kind))
            }

            div id="chart-panel" class="w-full"
            {
                (chart_panel(chart, &form.download_href()))
            }
        }
    );

    let scripts = [HeadElement::ScriptLink(
        "/static/echarts.6.0.0.min.js".to_owned(),
    )];

    base("Dashboard", &scripts, &content)
}

/// The chart-kind selection dialog.
///
/// A `<details>` element standing in for a modal: closed until the "Graph
/// Type" summary is clicked, closed again by the Apply button. Checking a
/// radio fires the surrounding form's `change` trigger, so Apply only
/// dismisses the dialog.
fn chart_kind_dialog(current_kind: &str) -> Markup {
    html!(
        details class="relative"
        {
            summary
                class={ "cursor-pointer list-none text-center " (BUTTON_SECONDARY_STYLE) }
            {
                "Graph Type"
            }

            div class="absolute z-40 mt-2 w-64 rounded border border-gray-200
                bg-white p-4 shadow dark:border-gray-600 dark:bg-gray-800"
            {
                h3 class="mb-3 text-lg font-semibold" { "Select Graph Type" }

                div class="mb-3 flex flex-col gap-2"
                {
                    @for kind in ChartKind::ALL {
                        label class="flex items-center gap-2 text-sm"
                        {
                            input
                                type="radio"
                                name="chart_kind"
                                value=(kind)
                                checked[kind.as_str() == current_kind]
                                class="h-4 w-4 border-gray-300 text-blue-600
                                    focus:ring-blue-500"
                            ;

                            (kind.label())
                        }
                    }
                }

                button
                    type="button"
                    onclick="this.closest('details').removeAttribute('open')"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    "Apply"
                }
            }
        }
    )
}

/// Renders the chart panel: the chart container, its initialization script,
/// and the download link for the same selection. This is the HTMX swap target
/// so the chart and the download link always move together.
fn chart_panel(chart: &DashboardChart, download_href: &str) -> Markup {
    html!(
        (chart_container(chart))
        (chart_script(chart))

        div class="mt-4 flex justify-end"
        {
            a href=(download_href) download=(EXPORT_FILE_NAME)
            {
                button type="button" class=(BUTTON_SECONDARY_STYLE) { "Download Data" }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::CONTENT_DISPOSITION},
    };
    use axum_extra::extract::Form;
    use axum_htmx::HxRequest;
    use axum_test::TestServer;
    use scraper::{Html, Selector};

    use crate::{
        AppState, Error, build_router,
        dashboard::charts::CHART_CONTAINER_ID,
        dataset::Dataset,
        endpoints,
    };

    use super::{SelectionForm, get_dashboard_page, update_chart};

    const TEST_CSV: &str = "\
Series_reference,Period,Data_value,Units
A,2020,10.5,Dollars
A,2021,11.25,Dollars
A,2022,12.0,Dollars
B,2020,3.0,Dollars
B,2021,4.75,Dollars
";

    fn test_state() -> AppState {
        AppState::new(Dataset::from_reader(TEST_CSV.as_bytes()).unwrap())
    }

    fn line_form(series: &[&str], period_min: i64, period_max: i64) -> SelectionForm {
        SelectionForm {
            series: series.iter().map(|series| series.to_string()).collect(),
            period_min,
            period_max,
            chart_kind: "line".to_owned(),
        }
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_element_count(html: &Html, css_selector: &str, expected_count: usize) {
        let selector = Selector::parse(css_selector).unwrap();
        let count = html.select(&selector).count();
        assert_eq!(
            count, expected_count,
            "want {expected_count} elements matching '{css_selector}', got {count}"
        );
    }

    #[tokio::test]
    async fn dashboard_page_renders_selection_controls_and_chart() {
        let response = get_dashboard_page(State(test_state())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;

        // One checkbox per series in the catalog.
        assert_element_count(&html, "input[type='checkbox'][name='series']", 2);
        assert_element_count(&html, "input[type='number'][name='period_min']", 1);
        assert_element_count(&html, "input[type='number'][name='period_max']", 1);
        // One radio per chart kind.
        assert_element_count(&html, "input[type='radio'][name='chart_kind']", 6);
        assert_element_count(&html, &format!("#{CHART_CONTAINER_ID}"), 1);
        assert_element_count(&html, "a[download]", 1);
    }

    #[tokio::test]
    async fn dashboard_page_checks_the_first_series_by_default() {
        let response = get_dashboard_page(State(test_state())).await.unwrap();
        let html = parse_html(response).await;

        assert_element_count(&html, "input[name='series'][value='A'][checked]", 1);
        assert_element_count(&html, "input[name='series'][value='B'][checked]", 0);
    }

    #[tokio::test]
    async fn update_chart_returns_the_partial_for_htmx_requests() {
        let form = line_form(&["A", "B"], 2020, 2022);

        let response = update_chart(State(test_state()), HxRequest(true), Form(form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_element_count(&html, &format!("#{CHART_CONTAINER_ID}"), 1);
        assert_element_count(&html, "a[download]", 1);
        // The partial must not contain the full page chrome.
        assert_element_count(&html, "h1", 0);
    }

    #[tokio::test]
    async fn update_chart_renders_the_full_page_without_htmx() {
        let form = line_form(&["B"], 2020, 2021);

        let response = update_chart(State(test_state()), HxRequest(false), Form(form))
            .await
            .unwrap();

        let html = parse_html(response).await;
        assert_element_count(&html, "h1", 1);
        // The submitted selection is reflected in the re-rendered controls.
        assert_element_count(&html, "input[name='series'][value='B'][checked]", 1);
        assert_element_count(&html, "input[name='series'][value='A'][checked]", 0);
    }

    #[tokio::test]
    async fn update_chart_rejects_an_unsupported_chart_kind() {
        let mut form = line_form(&["A"], 2020, 2022);
        form.chart_kind = "heatmap".to_owned();

        let error = update_chart(State(test_state()), HxRequest(true), Form(form))
            .await
            .unwrap_err();

        assert_eq!(error, Error::UnsupportedChartKind("heatmap".to_owned()));
    }

    #[tokio::test]
    async fn update_chart_rejects_an_empty_series_selection() {
        let form = line_form(&[], 2020, 2022);

        let error = update_chart(State(test_state()), HxRequest(true), Form(form))
            .await
            .unwrap_err();

        assert_eq!(error, Error::EmptySelection);
    }

    #[tokio::test]
    async fn unsupported_chart_kind_leaves_the_previous_view_untouched() {
        let server = TestServer::new(build_router(test_state()));

        let response = server
            .post(endpoints::CHART)
            .text("series=A&period_min=2020&period_max=2022&chart_kind=heatmap")
            .content_type("application/x-www-form-urlencoded")
            .await;

        // 204 means HTMX performs no swap: the old chart stays rendered.
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn download_returns_the_filtered_rows_as_a_csv_attachment() {
        let server = TestServer::new(build_router(test_state()));

        let response = server
            .get(&format!(
                "{}?series=A&period_min=2020&period_max=2021&chart_kind=line",
                endpoints::DOWNLOAD
            ))
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"downloaded_data.csv\""
        );

        let body = response.text();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            [
                "Series_reference,Period,Data_value,Units",
                "A,2020,10.5,Dollars",
                "A,2021,11.25,Dollars",
            ]
        );
    }

    #[tokio::test]
    async fn pie_download_has_two_columns_and_one_row_per_record() {
        let server = TestServer::new(build_router(test_state()));

        let response = server
            .get(&format!(
                "{}?series=A&series=B&period_min=2020&period_max=2020&chart_kind=pie",
                endpoints::DOWNLOAD
            ))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.text();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines, ["Labels,Values", "A,10.5", "B,3"]);
    }

    #[tokio::test]
    async fn unknown_routes_fall_back_to_404() {
        let server = TestServer::new(build_router(test_state()));

        let response = server.get("/no/such/page").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    fn selection_form_handles_multiple_series_values() {
        let form: SelectionForm = serde_html_form::from_str(
            "series=A&series=B&period_min=2020&period_max=2022&chart_kind=line",
        )
        .unwrap();
        assert_eq!(form.series, ["A", "B"]);

        // No checkboxes checked: the field is omitted entirely.
        let form: SelectionForm =
            serde_html_form::from_str("period_min=2020&period_max=2022&chart_kind=line").unwrap();
        assert!(form.series.is_empty());
    }

    #[test]
    fn download_href_round_trips_through_the_query_string() {
        let form = SelectionForm {
            series: vec!["A".to_owned(), "B".to_owned()],
            period_min: 2020,
            period_max: 2022,
            chart_kind: "pie".to_owned(),
        };

        let href = form.download_href();
        let query = href.strip_prefix(&format!("{}?", endpoints::DOWNLOAD)).unwrap();
        let decoded: SelectionForm = serde_html_form::from_str(query).unwrap();

        assert_eq!(decoded, form);
    }
}
