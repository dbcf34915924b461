//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use crate::dataset::Dataset;

/// The state of the REST server.
///
/// The dataset is loaded once before the server binds and is never mutated
/// afterwards, so it is shared by reference without a lock: concurrent reads
/// are safe and there is nothing to write.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The in-memory transactions table.
    pub dataset: Arc<Dataset>,
}

impl AppState {
    /// Create a new [AppState] holding `dataset`.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }
}
