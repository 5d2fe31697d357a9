use std::sync::Arc;

use crate::catalog::CatalogEngine;
use crate::config::AppConfig;
use crate::core::store::CatalogStore;
use crate::enrollment::EnrollmentEngine;
use crate::feedback::FeedbackEngine;

/// Shared state handed to every handler. Generic over the storage backend so
/// the same router runs against PostgreSQL or the in-memory store.
pub struct AppState<S> {
    pub config: AppConfig,
    pub store: S,
    pub catalog: CatalogEngine<S>,
    pub enrollment: EnrollmentEngine<S>,
    pub feedback: FeedbackEngine<S>,
}

impl<S: CatalogStore> AppState<S> {
    pub fn new(config: AppConfig, store: S) -> Arc<Self> {
        let catalog = CatalogEngine::new(store.clone(), config.catalog.slug_retry_attempts);
        let enrollment = EnrollmentEngine::new(store.clone());
        let feedback = FeedbackEngine::new(store.clone());
        Arc::new(Self {
            config,
            store,
            catalog,
            enrollment,
            feedback,
        })
    }
}
