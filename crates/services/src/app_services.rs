use std::sync::Arc;

use storage::{BackendConfig, Storage};

use crate::Clock;
use crate::analytics::ProgressAnalyticsService;
use crate::error::AppServicesError;
use crate::sessions::TestSessionService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<TestSessionService>,
    analytics: Arc<ProgressAnalyticsService>,
}

impl AppServices {
    /// Build services backed by the REST backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be constructed.
    pub fn new_http(config: &BackendConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::http(config)?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let sessions = Arc::new(TestSessionService::new(
            clock,
            Arc::clone(&storage.tests),
            Arc::clone(&storage.submissions),
            Arc::clone(&storage.progress),
        ));
        let analytics = Arc::new(ProgressAnalyticsService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.analytics),
            Arc::clone(&storage.modules),
        ));
        Self {
            sessions,
            analytics,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<TestSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<ProgressAnalyticsService> {
        Arc::clone(&self.analytics)
    }
}
