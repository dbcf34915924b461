//! A web dashboard for exploring electronic card transaction statistics.
//!
//! The dataset is a CSV table of transaction statistics, loaded once at
//! startup and held read-only in memory. The dashboard lets the user filter
//! the table by data series and time-period range, render the filtered rows
//! as one of six chart types, and download the filtered rows as CSV.
//!
//! This library provides the dataset store, the chart/export transforms, and
//! a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod chart;
mod dashboard;
mod dataset;
mod endpoints;
mod export;
mod html;
mod internal_server_error;
mod logging;
mod not_found;
mod routing;
mod selection;
mod state;

pub use chart::{ChartPayload, Slice, Trace, X_AXIS_LABEL, Y_AXIS_LABEL, build_chart};
pub use dataset::{Dataset, TransactionRecord};
pub use export::{EXPORT_FILE_NAME, TabularExport, build_export_table};
pub use logging::logging_middleware;
pub use routing::build_router;
pub use selection::{ChartKind, Selection};
pub use state::AppState;

use crate::{internal_server_error::InternalServerError, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The dataset file could not be opened or read.
    ///
    /// Raised once at startup; the server refuses to start without a dataset.
    #[error("could not read the dataset file \"{path}\": {reason}")]
    DatasetUnreadable {
        /// The path that was given on the command line.
        path: String,
        /// The underlying I/O error as a string.
        reason: String,
    },

    /// The dataset header row is missing one of the required columns
    /// (`Series_reference`, `Period` or `Data_value`).
    #[error("the dataset is missing the required column \"{0}\"")]
    MissingColumn(&'static str),

    /// A dataset row could not be parsed, e.g. a `Period` cell that is not an
    /// integer or a `Data_value` cell that is not a number.
    ///
    /// `row` counts data rows from 1, excluding the header row.
    #[error("could not parse dataset row {row}: {reason}")]
    InvalidRow {
        /// The 1-based data row number.
        row: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// The dataset parsed but contains no data rows.
    ///
    /// An empty dataset has no period bounds to offer the range selector, so
    /// it is rejected at startup rather than served.
    #[error("the dataset contains no data rows")]
    EmptyDataset,

    /// The client submitted a chart kind outside the supported set.
    #[error("\"{0}\" is not a supported chart kind")]
    UnsupportedChartKind(String),

    /// The client submitted a selection with no data series checked.
    ///
    /// The handlers answer with 204 No Content so the previously rendered
    /// chart stays on screen untouched.
    #[error("no data series were selected")]
    EmptySelection,

    /// The export table could not be serialized as CSV.
    #[error("could not write the export CSV: {0}")]
    CsvWrite(String),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::UnsupportedChartKind(_) | Error::EmptySelection => {
                // Recoverable selection errors: skip the update and leave the
                // previous view in place. HTMX performs no swap on 204.
                tracing::warn!("ignoring selection: {self}");
                StatusCode::NO_CONTENT.into_response()
            }
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                InternalServerError::default().into_response()
            }
        }
    }
}
