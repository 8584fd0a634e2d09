use chrono::Utc;
use tracing::{info, warn};

use crate::blob::ObjectUrl;
use crate::models::{LocalFile, User, UserPatch};
use crate::state::AppState;
use crate::views::Notice;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl ProfileForm {
    fn from_user(user: Option<&User>) -> Self {
        match user {
            Some(user) => Self {
                username: user.username.clone(),
                email: user.email.clone(),
                password: String::new(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Username,
    Email,
    Password,
}

/// Profile page: shows the user, edits username/email/password and
/// uploads a new profile photo.
///
/// The local photo preview is an [`ObjectUrl`], so replacing it or dropping
/// the editor releases it.
pub struct ProfileEditor {
    editing: bool,
    form: ProfileForm,
    preview: Option<ObjectUrl>,
    uploading: bool,
    notice: Option<Notice>,
}

impl ProfileEditor {
    pub async fn new(state: &AppState) -> Self {
        let user = state.session.current_user().await;
        Self {
            editing: false,
            form: ProfileForm::from_user(user.as_ref()),
            preview: None,
            uploading: false,
            notice: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(ObjectUrl::as_str)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Reload the form after the session user changed elsewhere.
    pub async fn sync_from_user(&mut self, state: &AppState) {
        let user = state.session.current_user().await;
        self.form = ProfileForm::from_user(user.as_ref());
        self.preview = None;
    }

    pub fn start_editing(&mut self) {
        self.editing = true;
    }

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProfileField::Username => self.form.username = value,
            ProfileField::Email => self.form.email = value,
            ProfileField::Password => self.form.password = value,
        }
    }

    pub async fn cancel(&mut self, state: &AppState) {
        self.editing = false;
        let user = state.session.current_user().await;
        self.form = ProfileForm::from_user(user.as_ref());
    }

    /// Persist the changed fields through the session store. Leaves edit
    /// mode only when the backend accepted the change.
    pub async fn save(&mut self, state: &AppState) {
        let Some(user) = state.session.current_user().await else {
            self.notice = Some(Notice::error("Please login to edit your profile"));
            return;
        };

        let patch = UserPatch {
            username: Some(self.form.username.clone()).filter(|name| *name != user.username),
            email: Some(self.form.email.clone()).filter(|email| *email != user.email),
            password: Some(self.form.password.clone()).filter(|password| !password.is_empty()),
            profile_image: None,
        };
        if patch.is_empty() {
            self.editing = false;
            return;
        }

        match state.session.update_user(&patch).await {
            Ok(()) => {
                self.editing = false;
                self.form.password.clear();
                self.notice = Some(Notice::info("Profile updated"));
            }
            Err(e) => {
                self.notice = Some(Notice::error(format!("Failed to update profile: {}", e)));
            }
        }
    }

    /// Show `file` as a preview right away, upload it, and on success point
    /// the session user at the new image with a cache-busting query.
    pub async fn change_photo(&mut self, state: &AppState, file: LocalFile) {
        if self.uploading {
            return;
        }
        let Some(user_id) = state.session.user_id().await else {
            return;
        };

        self.preview = Some(state.blobs.create_object_url(file.bytes.clone()));
        self.uploading = true;

        let token = state.session.auth_token().await;
        let result = state
            .backend
            .upload_profile_image(&user_id, file, token.as_deref())
            .await;

        match result {
            Ok(Some(image_url)) => {
                let fresh = cache_busted(&image_url, Utc::now().timestamp_millis());
                match state.session.update_local_user(&UserPatch::profile_image(fresh)).await {
                    Ok(()) => {
                        info!("profile image for user {} updated", user_id);
                        self.preview = None;
                    }
                    Err(e) => {
                        warn!("failed to store new profile image: {}", e);
                        self.notice = Some(Notice::error("Failed to upload profile image."));
                    }
                }
            }
            Ok(None) => {
                warn!("profile image upload for user {} returned no url", user_id);
            }
            Err(e) => {
                warn!("profile image upload for user {} failed: {}", user_id, e);
                self.notice = Some(Notice::error("Failed to upload profile image."));
            }
        }
        self.uploading = false;
    }

    pub async fn display_url(&self, state: &AppState) -> Option<String> {
        if let Some(preview) = &self.preview {
            return Some(preview.as_str().to_string());
        }
        state
            .session
            .current_user()
            .await
            .and_then(|user| user.profile_image)
    }

    pub async fn render(&self, state: &AppState) -> String {
        let Some(user) = state.session.current_user().await else {
            return "Loading user data...".to_string();
        };

        let photo = match self.display_url(state).await {
            Some(url) => format!("Photo: {}", url),
            None => "Photo: (placeholder)".to_string(),
        };
        let photo_action = if self.uploading {
            "[Uploading...]"
        } else {
            "[Change Photo]"
        };

        let mut lines = vec!["Profile Details".to_string(), photo, photo_action.to_string()];
        if self.editing {
            lines.push(format!("Username: [{}]", self.form.username));
            lines.push(format!("Email: [{}]", self.form.email));
            lines.push(format!(
                "Password: [{}]",
                if self.form.password.is_empty() { "Enter new password" } else { "••••••••" }
            ));
            lines.push("[Save] [Cancel]".to_string());
        } else {
            lines.push(format!("Username: {}", non_empty_or_na(&user.username)));
            lines.push(format!("Email: {}", non_empty_or_na(&user.email)));
            lines.push("Password: •••••••• [Change Password]".to_string());
            lines.push("[Edit Profile]".to_string());
        }
        lines.join("\n")
    }
}

fn non_empty_or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// Append a timestamp query so a cached image at the same address is refetched.
pub fn cache_busted(url: &str, timestamp_millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, separator, timestamp_millis)
}
