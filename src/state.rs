use std::sync::Arc;

use tracing::warn;

use crate::api::BackendClient;
use crate::blob::{BlobRegistry, FileSaver};
use crate::error::AppError;
use crate::models::User;
use crate::services::{EnrollmentStore, SessionStore};
use crate::storage::LocalStorage;

/// Everything a view needs, handed to it by reference.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendClient>,
    pub session: Arc<SessionStore>,
    pub enrollments: Arc<EnrollmentStore>,
    pub blobs: BlobRegistry,
    pub saver: Arc<dyn FileSaver>,
}

impl AppState {
    pub async fn new(
        backend: Arc<dyn BackendClient>,
        storage: Arc<dyn LocalStorage>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let session = Arc::new(SessionStore::load(storage, backend.clone()).await);
        let enrollments = Arc::new(EnrollmentStore::new(backend.clone(), session.clone()));

        let state = Self {
            backend,
            session,
            enrollments,
            blobs: BlobRegistry::new(),
            saver,
        };
        state.refresh_enrollments().await;
        state
    }

    pub async fn login(&self, user: User, token: Option<&str>) -> Result<(), AppError> {
        self.session.login(user).await?;
        if let Some(token) = token {
            self.session.set_auth_token(token).await?;
        }
        self.refresh_enrollments().await;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.logout().await?;
        self.refresh_enrollments().await;
        Ok(())
    }

    /// The enrollment cache is derived data; failing to refresh it is logged, not fatal.
    async fn refresh_enrollments(&self) {
        if let Err(e) = self.enrollments.on_user_transition().await {
            warn!("enrollment refresh failed: {}", e);
        }
    }
}
