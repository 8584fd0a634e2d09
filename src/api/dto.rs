use serde::{Deserialize, Serialize};

use crate::models::{Course, User};

#[derive(Debug, Deserialize)]
pub struct UserCoursesResponse {
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl ProfileImageResponse {
    pub fn into_url(self) -> Option<String> {
        self.image_url
            .or(self.profile_image_url)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseResponse {
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a rejected request; the backend puts a human-readable reason in `message`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
