use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::BackendClient;
use crate::error::AppError;
use crate::services::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentState {
    SignedOut,
    Loading,
    /// Enrolled course ids in the order the backend returned them, plus
    /// local appends. Duplicates are possible.
    Ready(Vec<String>),
}

struct Inner {
    /// User the cached ids belong to.
    user_id: Option<String>,
    state: EnrollmentState,
    /// Ids enrolled while a fetch was in flight; merged into its result.
    pending: Option<Vec<String>>,
}

/// Client-side cache of the course ids the signed-in user is enrolled in.
///
/// It is only as fresh as the last successful fetch or local append and is
/// rebuilt whenever the signed-in user changes.
pub struct EnrollmentStore {
    backend: Arc<dyn BackendClient>,
    session: Arc<SessionStore>,
    inner: RwLock<Inner>,
}

impl EnrollmentStore {
    pub fn new(backend: Arc<dyn BackendClient>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            inner: RwLock::new(Inner {
                user_id: None,
                state: EnrollmentState::SignedOut,
                pending: None,
            }),
        }
    }

    pub async fn state(&self) -> EnrollmentState {
        self.inner.read().await.state.clone()
    }

    pub async fn enrolled_course_ids(&self) -> Vec<String> {
        match &self.inner.read().await.state {
            EnrollmentState::Ready(ids) => ids.clone(),
            _ => Vec::new(),
        }
    }

    pub async fn is_enrolled(&self, course_id: &str) -> bool {
        match &self.inner.read().await.state {
            EnrollmentState::Ready(ids) => ids.iter().any(|id| id == course_id),
            _ => false,
        }
    }

    /// Call whenever the signed-in user may have changed. A different user
    /// triggers a refetch; signing out drops the previous user's ids.
    pub async fn on_user_transition(&self) -> Result<(), AppError> {
        let current = self.session.user_id().await;
        {
            let mut inner = self.inner.write().await;
            if inner.user_id == current && inner.state != EnrollmentState::SignedOut {
                return Ok(());
            }
            if current.is_none() {
                debug!("no signed-in user, clearing enrollments");
                inner.user_id = None;
                inner.state = EnrollmentState::SignedOut;
                inner.pending = None;
                return Ok(());
            }
        }
        self.fetch_enrollments().await
    }

    /// Replace the cached ids with the signed-in user's enrollments. Without
    /// a user this makes no network call.
    pub async fn fetch_enrollments(&self) -> Result<(), AppError> {
        let Some(user_id) = self.session.user_id().await else {
            let mut inner = self.inner.write().await;
            inner.user_id = None;
            inner.state = EnrollmentState::SignedOut;
            inner.pending = None;
            return Ok(());
        };

        let previous = {
            let mut inner = self.inner.write().await;
            let same_user = inner.user_id.as_deref() == Some(user_id.as_str());
            let previous = if same_user {
                inner.state.clone()
            } else {
                EnrollmentState::SignedOut
            };
            if !same_user || inner.pending.is_none() {
                inner.pending = Some(Vec::new());
            }
            inner.user_id = Some(user_id.clone());
            inner.state = EnrollmentState::Loading;
            previous
        };

        let token = self.session.auth_token().await;
        let result = self.backend.fetch_user_courses(&user_id, token.as_deref()).await;

        let mut inner = self.inner.write().await;
        if inner.user_id.as_deref() != Some(user_id.as_str()) {
            debug!("discarding enrollments fetched for stale user {}", user_id);
            return Ok(());
        }
        let pending = inner.pending.take().unwrap_or_default();
        match result {
            Ok(courses) => {
                let mut ids: Vec<String> = courses.into_iter().map(|course| course.id).collect();
                info!("user {} is enrolled in {} courses", user_id, ids.len());
                for id in pending {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                inner.state = EnrollmentState::Ready(ids);
                Ok(())
            }
            Err(e) => {
                warn!("failed to fetch enrollments for user {}: {}", user_id, e);
                inner.state = match previous {
                    EnrollmentState::Ready(mut ids) => {
                        ids.extend(pending);
                        EnrollmentState::Ready(ids)
                    }
                    _ if !pending.is_empty() => EnrollmentState::Ready(pending),
                    previous => previous,
                };
                Err(e)
            }
        }
    }

    /// Enroll `user_id` in `course_id`. On success the id is appended locally
    /// without waiting for a refetch; on failure nothing changes. The cache
    /// only takes the id when it belongs to `user_id`.
    pub async fn enroll_in_course(&self, user_id: &str, course_id: &str) -> Result<(), AppError> {
        let token = self.session.auth_token().await;
        self.backend.enroll(user_id, course_id, token.as_deref()).await?;
        info!("user {} enrolled in course {}", user_id, course_id);

        let mut inner = self.inner.write().await;
        match inner.user_id.as_deref() {
            Some(current) if current != user_id => {
                debug!("not caching enrollment of user {}, cache belongs to {}", user_id, current);
                return Ok(());
            }
            Some(_) => {}
            None => inner.user_id = Some(user_id.to_string()),
        }
        if let Some(pending) = inner.pending.as_mut() {
            pending.push(course_id.to_string());
        }
        match &mut inner.state {
            EnrollmentState::Ready(ids) => ids.push(course_id.to_string()),
            state => *state = EnrollmentState::Ready(vec![course_id.to_string()]),
        }
        Ok(())
    }

    pub async fn unenroll_from_course(&self, user_id: &str, course_id: &str) -> Result<(), AppError> {
        let token = self.session.auth_token().await;
        self.backend.unenroll(user_id, course_id, token.as_deref()).await?;
        info!("user {} unenrolled from course {}", user_id, course_id);

        if let EnrollmentState::Ready(ids) = &mut self.inner.write().await.state {
            ids.retain(|id| id != course_id);
        }
        Ok(())
    }
}
