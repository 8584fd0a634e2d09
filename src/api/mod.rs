pub mod dto;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::{Course, LocalFile, NewCourseForm, User, UserPatch};

/// The course platform's REST backend.
///
/// `token` is the bearer token from local storage; requests carry an
/// `Authorization` header only when one is present.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<(User, Option<String>), AppError>;
    async fn fetch_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn fetch_user_courses(&self, user_id: &str, token: Option<&str>) -> Result<Vec<Course>, AppError>;
    async fn enroll(&self, user_id: &str, course_id: &str, token: Option<&str>) -> Result<(), AppError>;
    async fn unenroll(&self, user_id: &str, course_id: &str, token: Option<&str>) -> Result<(), AppError>;
    async fn download_resource(&self, course_id: &str, token: Option<&str>) -> Result<Vec<u8>, AppError>;
    async fn create_course(&self, form: NewCourseForm, token: Option<&str>) -> Result<Option<Course>, AppError>;
    async fn update_user(&self, user_id: &str, patch: &UserPatch, token: Option<&str>) -> Result<(), AppError>;
    async fn upload_profile_image(
        &self,
        user_id: &str,
        image: LocalFile,
        token: Option<&str>,
    ) -> Result<Option<String>, AppError>;
}

pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, token: Option<&str>) -> Result<Response, AppError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        Ok(request.send().await?)
    }
}

/// Turn a non-success response into `AppError::Api`, preferring the server's
/// JSON `message` and falling back to `fallback` when the body has none.
async fn rejection(response: Response, fallback: &str) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    warn!("backend rejected request: {} - {}", status, message);
    AppError::api(status, message)
}

fn file_part(file: LocalFile) -> Result<Part, AppError> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.content_type)?)
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn login(&self, username: &str, password: &str) -> Result<(User, Option<String>), AppError> {
        let request = self
            .client
            .post(self.url("/api/users/login"))
            .json(&dto::LoginRequest { username, password });
        let response = self.send(request, None).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Login failed").await);
        }

        let body: dto::LoginResponse = response.json().await?;
        let user = body.user.ok_or_else(|| AppError::Api {
            status: 200,
            message: body.message.unwrap_or_else(|| "Login response had no user".to_string()),
        })?;
        Ok((user, body.token))
    }

    async fn fetch_courses(&self) -> Result<Vec<Course>, AppError> {
        let response = self.send(self.client.get(self.url("/api/courses")), None).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to fetch courses").await);
        }

        let courses: Vec<Course> = response.json().await?;
        debug!("fetched {} catalog courses", courses.len());
        Ok(courses)
    }

    async fn fetch_user_courses(&self, user_id: &str, token: Option<&str>) -> Result<Vec<Course>, AppError> {
        let url = self.url(&format!("/api/enrollments/user/{}/courses", user_id));
        let response = self.send(self.client.get(url), token).await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::api(
                status,
                format!("Failed to fetch courses: {}", status.as_u16()),
            ));
        }

        let body: dto::UserCoursesResponse = response.json().await?;
        Ok(body.courses)
    }

    async fn enroll(&self, user_id: &str, course_id: &str, token: Option<&str>) -> Result<(), AppError> {
        let url = self.url(&format!("/api/enrollments/{}/{}", user_id, course_id));
        let response = self.send(self.client.post(url), token).await?;

        if !response.status().is_success() {
            warn!("enrollment of user {} in course {} rejected: {}", user_id, course_id, response.status());
            return Err(AppError::EnrollmentFailed);
        }
        Ok(())
    }

    async fn unenroll(&self, user_id: &str, course_id: &str, token: Option<&str>) -> Result<(), AppError> {
        let url = self.url(&format!("/api/enrollments/{}/{}", user_id, course_id));
        let response = self.send(self.client.delete(url), token).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to unenroll").await);
        }
        Ok(())
    }

    async fn download_resource(&self, course_id: &str, token: Option<&str>) -> Result<Vec<u8>, AppError> {
        let url = self.url(&format!("/api/courses/{}/download", course_id));
        let response = self.send(self.client.get(url), token).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to fetch resource").await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn create_course(&self, form: NewCourseForm, token: Option<&str>) -> Result<Option<Course>, AppError> {
        let mut multipart = Form::new()
            .text("name", form.name)
            .text("description", form.description)
            .text("startDate", form.start_date)
            .text("price", form.price);
        if let Some(image) = form.image {
            multipart = multipart.part("image", file_part(image)?);
        }
        if let Some(resource) = form.resource {
            multipart = multipart.part("file", file_part(resource)?);
        }

        let request = self.client.post(self.url("/api/courses")).multipart(multipart);
        let response = self.send(request, token).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to add course").await);
        }

        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<dto::CreateCourseResponse>(&body)
            .ok()
            .and_then(|created| created.course))
    }

    async fn update_user(&self, user_id: &str, patch: &UserPatch, token: Option<&str>) -> Result<(), AppError> {
        let url = self.url(&format!("/api/users/{}", user_id));
        let response = self.send(self.client.put(url).json(patch), token).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to update profile").await);
        }
        Ok(())
    }

    async fn upload_profile_image(
        &self,
        user_id: &str,
        image: LocalFile,
        token: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let url = self.url(&format!("/api/users/{}/profile-image", user_id));
        let multipart = Form::new().part("profileImage", file_part(image)?);
        let response = self.send(self.client.put(url).multipart(multipart), token).await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to upload profile image.").await);
        }

        let body: dto::ProfileImageResponse = response.json().await?;
        Ok(body.into_url())
    }
}
