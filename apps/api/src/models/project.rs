use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const DEFAULT_STATUS: &str = "Open";

/// A staffing request. Only `required_skills` drives scoring; the rest is
/// carried through for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub project_name: String,
    pub required_skills: Vec<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub timeline: Value,
    pub priority: String,
    pub headcount: i32,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(project_name: impl Into<String>, required_skills: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_name: project_name.into(),
            required_skills,
            description: None,
            duration: None,
            timeline: Value::Object(Default::default()),
            priority: DEFAULT_PRIORITY.to_string(),
            headcount: 1,
            status: DEFAULT_STATUS.to_string(),
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
        }
    }
}
