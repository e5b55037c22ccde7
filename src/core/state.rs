use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::collaborators::CollaboratorClient;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    collaborators: CollaboratorClient,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, collaborators: CollaboratorClient) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, collaborators }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn collaborators(&self) -> &CollaboratorClient {
        &self.inner.collaborators
    }
}
