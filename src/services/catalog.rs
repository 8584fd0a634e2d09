use tracing::{info, warn};

use crate::api::BackendClient;
use crate::models::Course;

/// The public course list that detail pages look courses up in.
#[derive(Debug, Clone, PartialEq)]
pub enum CourseCatalog {
    Loading,
    Failed(String),
    Loaded(Vec<Course>),
}

impl CourseCatalog {
    pub async fn load(backend: &dyn BackendClient) -> Self {
        match backend.fetch_courses().await {
            Ok(courses) => {
                info!("loaded {} courses", courses.len());
                CourseCatalog::Loaded(courses)
            }
            Err(e) => {
                warn!("failed to load course catalog: {}", e);
                CourseCatalog::Failed(e.to_string())
            }
        }
    }

    pub fn courses(&self) -> &[Course] {
        match self {
            CourseCatalog::Loaded(courses) => courses,
            _ => &[],
        }
    }

    pub fn find(&self, course_id: &str) -> Option<&Course> {
        self.courses().iter().find(|course| course.id == course_id)
    }
}
