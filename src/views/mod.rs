//! View-models: UI state plus the calls that drive it, rendered as plain text.

pub mod add_course;
pub mod course_detail;
pub mod my_courses;
pub mod profile;

use chrono::{Datelike, NaiveDate};

pub use add_course::AddCourseForm;
pub use course_detail::CourseDetailView;
pub use my_courses::MyCoursesView;
pub use profile::ProfileEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            NoticeKind::Info => write!(f, "{}", self.message),
            NoticeKind::Error => write!(f, "! {}", self.message),
        }
    }
}

pub fn format_price(price: f64) -> String {
    if price > 0.0 {
        format!("LKR {}", price)
    } else {
        "Free".to_string()
    }
}

/// Abbreviated month and day as two tokens, e.g. `("SEP", "5")`.
pub fn format_start_date(date: Option<NaiveDate>) -> (String, String) {
    match date {
        Some(date) => (date.format("%b").to_string().to_uppercase(), date.day().to_string()),
        None => ("TBA".to_string(), String::new()),
    }
}
