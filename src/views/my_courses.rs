use tracing::{error, info};

use crate::models::Course;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub enum MyCoursesState {
    Loading,
    Failed(String),
    Loaded(Vec<Course>),
}

/// Dashboard list of the signed-in user's enrolled courses.
pub struct MyCoursesView {
    user_id: Option<String>,
    state: MyCoursesState,
}

impl Default for MyCoursesView {
    fn default() -> Self {
        Self::new()
    }
}

impl MyCoursesView {
    pub fn new() -> Self {
        Self {
            user_id: None,
            state: MyCoursesState::Loading,
        }
    }

    pub fn state(&self) -> &MyCoursesState {
        &self.state
    }

    /// Fetch when first shown and again whenever the signed-in user changes.
    pub async fn on_user_transition(&mut self, state: &AppState) {
        let current = state.session.user_id().await;
        let changed = current != self.user_id;
        self.user_id = current;

        if self.user_id.is_none() {
            self.state = MyCoursesState::Loading;
        } else if changed || self.state == MyCoursesState::Loading {
            self.fetch(state).await;
        }
    }

    pub async fn fetch(&mut self, state: &AppState) {
        let Some(user_id) = self.user_id.clone() else {
            return;
        };

        self.state = MyCoursesState::Loading;
        let token = state.session.auth_token().await;
        self.state = match state.backend.fetch_user_courses(&user_id, token.as_deref()).await {
            Ok(courses) => {
                info!("user {} has {} enrolled courses", user_id, courses.len());
                MyCoursesState::Loaded(courses)
            }
            Err(e) => {
                error!("error fetching my courses: {}", e);
                MyCoursesState::Failed(e.to_string())
            }
        };
    }

    pub fn render(&self) -> String {
        let mut lines = vec!["My Enrolled Courses".to_string()];
        match &self.state {
            MyCoursesState::Loading => lines.push("Loading your courses...".to_string()),
            MyCoursesState::Failed(e) => lines.push(format!("Error loading courses: {}", e)),
            MyCoursesState::Loaded(courses) if courses.is_empty() => {
                lines.push("You haven't enrolled in any courses yet".to_string());
                lines.push("Browse available courses and start your learning journey today!".to_string());
                lines.push("[Browse Courses] /courses".to_string());
            }
            MyCoursesState::Loaded(courses) => {
                for course in courses {
                    lines.push(String::new());
                    lines.push(format!("{} [Enrolled]", course.display_name()));
                    lines.push(format!("  {}", course.display_description()));
                    if let Some(url) = &course.image_url {
                        lines.push(format!("  Image: {}", url));
                    }
                    lines.push(format!("  [Continue] /course/{}", course.id));
                }
            }
        }
        lines.join("\n")
    }
}
