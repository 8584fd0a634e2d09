use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{LocalFile, NewCourseForm};
use crate::state::AppState;

const SUCCESS_TTL: Duration = Duration::from_secs(3);
const ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Name,
    Description,
    StartDate,
    Price,
}

/// A message that disappears on its own after a while.
#[derive(Debug, Clone)]
struct Flash {
    message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Flash {
    fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    fn visible_at(&self, now: Instant) -> Option<&str> {
        (now.duration_since(self.shown_at) < self.ttl).then_some(self.message.as_str())
    }
}

/// Controlled form for publishing a new course.
#[derive(Debug, Default)]
pub struct AddCourseForm {
    form: NewCourseForm,
    success: Option<Flash>,
    error: Option<Flash>,
}

impl AddCourseForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &NewCourseForm {
        &self.form
    }

    pub fn set_field(&mut self, field: CourseField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CourseField::Name => self.form.name = value,
            CourseField::Description => self.form.description = value,
            CourseField::StartDate => self.form.start_date = value,
            CourseField::Price => self.form.price = value,
        }
    }

    pub fn set_image(&mut self, image: Option<LocalFile>) {
        self.form.image = image;
    }

    pub fn set_resource(&mut self, resource: Option<LocalFile>) {
        self.form.resource = resource;
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_ref().and_then(|flash| flash.visible_at(Instant::now()))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|flash| flash.visible_at(Instant::now()))
    }

    /// Submit the form. On success every field, file inputs included, is
    /// cleared; on failure the fields are kept for another attempt.
    pub async fn submit(&mut self, state: &AppState) -> bool {
        if let Err(e) = self.validate() {
            self.error = Some(Flash::new(e.to_string(), ERROR_TTL));
            return false;
        }

        let token = state.session.auth_token().await;
        match state.backend.create_course(self.form.clone(), token.as_deref()).await {
            Ok(course) => {
                match course {
                    Some(course) => info!("created course {} ({})", course.display_name(), course.id),
                    None => info!("created course {}", self.form.name),
                }
                self.form = NewCourseForm::default();
                self.error = None;
                self.success = Some(Flash::new("Course added successfully!", SUCCESS_TTL));
                true
            }
            Err(e) => {
                warn!("failed to add course: {}", e);
                let message = match e {
                    AppError::Api { message, .. } => message,
                    other => other.to_string(),
                };
                self.error = Some(Flash::new(message, ERROR_TTL));
                false
            }
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("Course name", &self.form.name),
            ("Description", &self.form.description),
            ("Start date", &self.form.start_date),
            ("Price", &self.form.price),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} is required", label)));
            }
        }

        if chrono::NaiveDate::parse_from_str(self.form.start_date.trim(), "%Y-%m-%d").is_err() {
            return Err(AppError::Validation("Start date must be YYYY-MM-DD".to_string()));
        }
        match self.form.price.trim().parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Ok(()),
            _ => Err(AppError::Validation("Price must be a number of at least 0".to_string())),
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec!["Add New Course".to_string()];
        if let Some(message) = self.success_message() {
            lines.push(format!("[ok] {}", message));
        }
        if let Some(message) = self.error_message() {
            lines.push(format!("[error] {}", message));
        }
        lines.push(format!("Course Name: [{}]", self.form.name));
        lines.push(format!("Description: [{}]", self.form.description));
        lines.push(format!("Start Date: [{}]", self.form.start_date));
        lines.push(format!("Price (LKR): [{}]", self.form.price));
        lines.push(format!(
            "Course Image: [{}]",
            self.form.image.as_ref().map_or("no file", |file| file.file_name.as_str())
        ));
        lines.push(format!(
            "Course PDF Resource: [{}]",
            self.form.resource.as_ref().map_or("no file", |file| file.file_name.as_str())
        ));
        lines.push("[Add Course]".to_string());
        lines.join("\n")
    }
}
