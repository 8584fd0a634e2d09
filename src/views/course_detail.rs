use std::path::PathBuf;

use tracing::{error, info};

use crate::error::AppError;
use crate::services::CourseCatalog;
use crate::state::AppState;
use crate::views::{Notice, format_price, format_start_date};

/// One course page: details, enrollment and resource download.
pub struct CourseDetailView {
    course_id: String,
    enrolling_course_id: Option<String>,
    notice: Option<Notice>,
}

impl CourseDetailView {
    pub fn new(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            enrolling_course_id: None,
            notice: None,
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_enrolling(&self) -> bool {
        self.enrolling_course_id.as_deref() == Some(self.course_id.as_str())
    }

    pub async fn enroll(&mut self, state: &AppState) {
        let Some(user_id) = state.session.user_id().await else {
            self.notice = Some(Notice::error("Please login to enroll in courses"));
            return;
        };
        if self.enrolling_course_id.is_some() {
            return;
        }
        if state.enrollments.is_enrolled(&self.course_id).await {
            self.notice = Some(Notice::info("You are already enrolled in this course"));
            return;
        }

        self.enrolling_course_id = Some(self.course_id.clone());
        let result = state
            .enrollments
            .enroll_in_course(&user_id, &self.course_id)
            .await;
        self.enrolling_course_id = None;

        self.notice = Some(match result {
            Ok(()) => Notice::info("Successfully enrolled in the course!"),
            Err(e) => Notice::error(format!("Enrollment failed: {}", e)),
        });
    }

    /// Fetch the course resource and save it. The temporary object URL is
    /// released before this returns, whether or not the save succeeded.
    pub async fn download(&mut self, state: &AppState, catalog: &CourseCatalog) -> Option<PathBuf> {
        let file_name = catalog
            .find(&self.course_id)
            .and_then(|course| course.name.as_deref())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}.pdf", name))
            .unwrap_or_else(|| "resource.pdf".to_string());

        match fetch_and_save(state, &self.course_id, &file_name).await {
            Ok(path) => {
                info!("saved resource for course {} to {}", self.course_id, path.display());
                self.notice = Some(Notice::info(format!("Saved {}", path.display())));
                Some(path)
            }
            Err(e) => {
                error!("download of course {} failed: {}", self.course_id, e);
                self.notice = Some(Notice::error("Failed to download resource"));
                None
            }
        }
    }

    pub async fn render(&self, state: &AppState, catalog: &CourseCatalog) -> String {
        let course = match catalog {
            CourseCatalog::Loading => return "Loading course details...".to_string(),
            CourseCatalog::Failed(e) => return format!("Error loading course: {}", e),
            CourseCatalog::Loaded(_) => match catalog.find(&self.course_id) {
                Some(course) => course,
                None => return "Course not found.".to_string(),
            },
        };

        let (month, day) = format_start_date(course.start_date);
        let mut lines = vec![
            course.display_name().to_string(),
            format!("[{}]  {} {}", format_price(course.price), month, day),
            format!("Image: {}", course.image_url.as_deref().unwrap_or("(none)")),
        ];
        if let Some(description) = &course.description {
            lines.push(String::new());
            lines.push(description.clone());
            lines.push(String::new());
        }
        lines.push("[Download Resources]".to_string());

        let action = if state.enrollments.is_enrolled(&course.id).await {
            "[Enrolled]"
        } else if self.is_enrolling() {
            "[Enrolling...]"
        } else {
            "[Enroll Now]"
        };
        lines.push(action.to_string());
        lines.push("Back To Courses List: /courses".to_string());
        lines.join("\n")
    }
}

async fn fetch_and_save(state: &AppState, course_id: &str, file_name: &str) -> Result<PathBuf, AppError> {
    let token = state.session.auth_token().await;
    let bytes = state
        .backend
        .download_resource(course_id, token.as_deref())
        .await?;

    let url = state.blobs.create_object_url(bytes);
    let saved = state.saver.save_as(&state.blobs, &url, file_name).await;
    drop(url);
    saved
}
