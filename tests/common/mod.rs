#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use brightpath::api::BackendClient;
use brightpath::blob::{BlobRegistry, DirectorySaver, FileSaver, ObjectUrl};
use brightpath::error::AppError;
use brightpath::models::{Course, LocalFile, NewCourseForm, User, UserPatch};
use brightpath::state::AppState;
use brightpath::storage::MemoryStorage;

/// Scripted in-process backend that records what the client asked for.
#[derive(Default)]
pub struct FakeBackend {
    pub catalog: Mutex<Vec<Course>>,
    pub user_courses: Mutex<HashMap<String, Vec<Course>>>,
    pub resource: Mutex<Vec<u8>>,
    pub image_url: Mutex<Option<String>>,
    pub create_error: Mutex<Option<String>>,
    pub created: Mutex<Vec<NewCourseForm>>,
    pub user_updates: Mutex<Vec<(String, UserPatch)>>,
    pub tokens: Mutex<Vec<Option<String>>>,
    pub fail_enroll: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_update_user: AtomicBool,
    pub fail_download: AtomicBool,
    pub fail_upload: AtomicBool,
    /// Delay before a user-courses response is delivered. The response is
    /// taken before the delay, so it can be stale by the time it arrives.
    pub fetch_delay_ms: AtomicU64,
    pub fetch_calls: AtomicUsize,
    pub enroll_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_catalog(courses: Vec<Course>) -> Arc<Self> {
        let backend = Self::default();
        *backend.catalog.lock().unwrap() = courses;
        Arc::new(backend)
    }

    pub fn set_user_courses(&self, user_id: &str, courses: Vec<Course>) {
        self.user_courses
            .lock()
            .unwrap()
            .insert(user_id.to_string(), courses);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn record_token(&self, token: Option<&str>) {
        self.tokens.lock().unwrap().push(token.map(str::to_string));
    }

    fn rejected(message: &str) -> AppError {
        AppError::Api {
            status: 500,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn login(&self, username: &str, _password: &str) -> Result<(User, Option<String>), AppError> {
        Ok((User::new("42", username, format!("{}@example.com", username)), Some("tok-42".to_string())))
    }

    async fn fetch_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn fetch_user_courses(&self, user_id: &str, token: Option<&str>) -> Result<Vec<Course>, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.record_token(token);
        let fail = self.fail_fetch.load(Ordering::SeqCst);
        let courses = self
            .user_courses
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if fail {
            return Err(Self::rejected("Failed to fetch courses: 500"));
        }
        Ok(courses)
    }

    async fn enroll(&self, user_id: &str, course_id: &str, token: Option<&str>) -> Result<(), AppError> {
        self.enroll_calls.fetch_add(1, Ordering::SeqCst);
        self.record_token(token);
        if self.fail_enroll.load(Ordering::SeqCst) {
            return Err(AppError::EnrollmentFailed);
        }
        let course = self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .find(|course| course.id == course_id)
            .cloned()
            .unwrap_or_else(|| course(course_id, "Enrolled course", 0.0));
        self.user_courses
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(course);
        Ok(())
    }

    async fn unenroll(&self, user_id: &str, course_id: &str, _token: Option<&str>) -> Result<(), AppError> {
        if let Some(courses) = self.user_courses.lock().unwrap().get_mut(user_id) {
            courses.retain(|course| course.id != course_id);
        }
        Ok(())
    }

    async fn download_resource(&self, _course_id: &str, token: Option<&str>) -> Result<Vec<u8>, AppError> {
        self.record_token(token);
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(Self::rejected("Failed to fetch resource"));
        }
        Ok(self.resource.lock().unwrap().clone())
    }

    async fn create_course(&self, form: NewCourseForm, token: Option<&str>) -> Result<Option<Course>, AppError> {
        self.record_token(token);
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(Self::rejected(&message));
        }
        let created = course("99", &form.name, form.price.parse().unwrap_or(0.0));
        self.created.lock().unwrap().push(form);
        Ok(Some(created))
    }

    async fn update_user(&self, user_id: &str, patch: &UserPatch, _token: Option<&str>) -> Result<(), AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update_user.load(Ordering::SeqCst) {
            return Err(Self::rejected("User not found"));
        }
        self.user_updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), patch.clone()));
        Ok(())
    }

    async fn upload_profile_image(
        &self,
        _user_id: &str,
        _image: LocalFile,
        _token: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(Self::rejected("No image uploaded"));
        }
        Ok(self.image_url.lock().unwrap().clone())
    }
}

/// Saver that always fails after the object URL has been created.
pub struct FailingSaver;

#[async_trait]
impl FileSaver for FailingSaver {
    async fn save_as(&self, _blobs: &BlobRegistry, _url: &ObjectUrl, _file_name: &str) -> Result<PathBuf, AppError> {
        Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only download folder",
        )))
    }
}

pub fn course(id: &str, name: &str, price: f64) -> Course {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "description": format!("About {}", name),
        "price": price,
        "startDate": "2025-09-05",
    }))
    .unwrap()
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("brightpath-test-{}", uuid::Uuid::new_v4()))
}

pub async fn app_state(backend: Arc<FakeBackend>, storage: Arc<MemoryStorage>) -> AppState {
    AppState::new(backend, storage, Arc::new(DirectorySaver::new(scratch_dir()))).await
}

pub async fn signed_in_storage(user: &User) -> Arc<MemoryStorage> {
    let raw = serde_json::to_string(user).unwrap();
    Arc::new(
        MemoryStorage::new()
            .with_item("user", &raw)
            .await
            .with_item("token", "tok-42")
            .await,
    )
}
