//! API server state

use std::sync::Arc;

use crate::store::TodoStore;

/// API server state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    /// Process-wide todo store
    pub store: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}
