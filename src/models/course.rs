use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::LocalFile;
use super::id::deserialize_id;

/// Read-only snapshot of a course owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub resource_url: Option<String>,
}

impl Course {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Untitled Course",
        }
    }

    pub fn display_description(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description,
            _ => "No description available",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(i64),
    Text(String),
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, or epoch milliseconds.
/// Anything unreadable becomes `None` rather than failing the whole course.
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDate>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawDate::Millis(ms) => DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive()),
        RawDate::Text(text) => parse_date_text(&text),
    }))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| text.get(..10).and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()))
}

/// Fields of the add-course form, submitted as `multipart/form-data`.
#[derive(Debug, Clone, Default)]
pub struct NewCourseForm {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub price: String,
    pub image: Option<LocalFile>,
    pub resource: Option<LocalFile>,
}
