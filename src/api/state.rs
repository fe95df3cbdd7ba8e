use std::sync::Arc;

use crate::services::stores::{Catalog, InMemoryStore, LikeStore};

/// Shared application state
///
/// Holds the injected data-access capabilities; handlers never open
/// connections of their own.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub likes: Arc<dyn LikeStore>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, likes: Arc<dyn LikeStore>) -> Self {
        Self { catalog, likes }
    }

    /// State backed by one in-memory store for both capabilities
    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store)
    }
}
