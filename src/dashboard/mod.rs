//! The dashboard page: selection controls, the chart, and the CSV download.

mod charts;
mod handlers;

pub use handlers::{download_data, get_dashboard_page, update_chart};
