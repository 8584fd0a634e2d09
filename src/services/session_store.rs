use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::api::BackendClient;
use crate::error::AppError;
use crate::models::{User, UserPatch};
use crate::storage::{LocalStorage, TOKEN_KEY, USER_KEY};

/// Owns the signed-in user and keeps it mirrored in local storage.
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
    backend: Arc<dyn BackendClient>,
    user: RwLock<Option<User>>,
}

impl SessionStore {
    /// Restore the persisted user. A record that does not parse is removed
    /// and the session starts signed out; startup never fails on bad local data.
    pub async fn load(storage: Arc<dyn LocalStorage>, backend: Arc<dyn BackendClient>) -> Self {
        let user = match storage.get_item(USER_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!("restored session for user {}", user.id);
                    Some(user)
                }
                Err(e) => {
                    warn!("discarding unreadable persisted user: {}", e);
                    if let Err(e) = storage.remove_item(USER_KEY).await {
                        warn!("failed to remove persisted user: {}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("local storage unavailable, starting signed out: {}", e);
                None
            }
        };

        Self {
            storage,
            backend,
            user: RwLock::new(user),
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.user.read().await.as_ref().map(|user| user.id.clone())
    }

    pub async fn auth_token(&self) -> Option<String> {
        match self.storage.get_item(TOKEN_KEY).await {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!("failed to read auth token: {}", e);
                None
            }
        }
    }

    pub async fn set_auth_token(&self, token: &str) -> Result<(), AppError> {
        self.storage.set_item(TOKEN_KEY, token).await
    }

    /// Replace the current user as-is and persist it. A different user
    /// drops the stored token, which belongs to the previous one.
    pub async fn login(&self, user: User) -> Result<(), AppError> {
        let raw = serde_json::to_string(&user)?;
        info!("signing in user {}", user.id);
        let previous = self.user.write().await.replace(user.clone());
        if previous.as_ref().map(|previous| &previous.id) != Some(&user.id) {
            self.storage.remove_item(TOKEN_KEY).await?;
        }
        self.storage.set_item(USER_KEY, &raw).await
    }

    /// Both keys are always attempted; the first failure is returned.
    pub async fn logout(&self) -> Result<(), AppError> {
        if let Some(user) = self.user.write().await.take() {
            info!("signing out user {}", user.id);
        }
        let user_removed = self.storage.remove_item(USER_KEY).await;
        let token_removed = self.storage.remove_item(TOKEN_KEY).await;
        user_removed.and(token_removed)
    }

    /// Merge `patch` into the current user and persist. Does nothing while signed out.
    pub async fn update_local_user(&self, patch: &UserPatch) -> Result<(), AppError> {
        let updated = {
            let mut guard = self.user.write().await;
            match guard.as_mut() {
                Some(user) => {
                    user.merge(patch);
                    user.clone()
                }
                None => return Ok(()),
            }
        };
        self.persist(&updated).await
    }

    /// Apply `patch` immediately, then confirm it with the backend. If the
    /// backend call fails the exact pre-call user is restored and the error
    /// is handed back to the caller.
    pub async fn update_user(&self, patch: &UserPatch) -> Result<(), AppError> {
        let snapshot = self.current_user().await.ok_or(AppError::NotSignedIn)?;

        if let Err(e) = self.update_local_user(patch).await {
            self.restore(snapshot).await;
            return Err(e);
        }

        let token = self.auth_token().await;
        match self.backend.update_user(&snapshot.id, patch, token.as_deref()).await {
            Ok(()) => {
                info!("updated profile for user {}", snapshot.id);
                Ok(())
            }
            Err(e) => {
                warn!("profile update for user {} failed, reverting: {}", snapshot.id, e);
                self.restore(snapshot).await;
                Err(e)
            }
        }
    }

    async fn restore(&self, snapshot: User) {
        let mut guard = self.user.write().await;
        // A logout that raced the backend call wins.
        if guard.as_ref().map(|user| &user.id) != Some(&snapshot.id) {
            return;
        }
        *guard = Some(snapshot.clone());
        drop(guard);

        if let Err(e) = self.persist(&snapshot).await {
            error!("failed to persist reverted user {}: {}", snapshot.id, e);
        }
    }

    async fn persist(&self, user: &User) -> Result<(), AppError> {
        let raw = serde_json::to_string(user)?;
        self.storage.set_item(USER_KEY, &raw).await
    }
}
