use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::Project;
use crate::normalize::text::{normalize_list_field, FieldInput};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub project_name: Option<String>,
    /// List or comma-separated string.
    pub required_skills: Option<Value>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub timeline: Option<Value>,
    pub priority: Option<String>,
    pub headcount: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl CreateProjectRequest {
    fn into_project(self) -> Result<Project, AppError> {
        let name = trimmed(self.project_name.as_deref())
            .ok_or_else(|| AppError::Validation("project_name is required".to_string()))?;
        let headcount = self.headcount.unwrap_or(1);
        if headcount < 1 {
            return Err(AppError::Validation("headcount must be at least 1".to_string()));
        }

        let skills = normalize_list_field(FieldInput::from_value(self.required_skills.as_ref()));
        let mut project = Project::new(name, skills);
        project.description = trimmed(self.description.as_deref());
        project.duration = trimmed(self.duration.as_deref());
        if let Some(timeline @ Value::Object(_)) = self.timeline {
            project.timeline = timeline;
        }
        if let Some(priority) = trimmed(self.priority.as_deref()) {
            project.priority = priority;
        }
        project.headcount = headcount;
        project.start_date = trimmed(self.start_date.as_deref());
        project.end_date = trimmed(self.end_date.as_deref());
        Ok(project)
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub data: Vec<Project>,
}

/// POST /projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    let project = req.into_project()?;
    state.projects.insert(&project).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}

/// GET /projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let data = state.projects.find_all().await?;
    Ok(Json(ProjectListResponse { data }))
}

/// GET /projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    Ok(Json(ProjectResponse { project }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> CreateProjectRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let project = request(json!({
            "project_name": " Portal ",
            "required_skills": "React, Django, React"
        }))
        .into_project()
        .unwrap();

        assert_eq!(project.project_name, "Portal");
        assert_eq!(project.required_skills, vec!["React", "Django"]);
        assert_eq!(project.priority, "Medium");
        assert_eq!(project.status, "Open");
        assert_eq!(project.headcount, 1);
        assert_eq!(project.timeline, json!({}));
    }

    #[test]
    fn test_explicit_fields_kept() {
        let project = request(json!({
            "project_name": "Portal",
            "required_skills": ["Rust"],
            "priority": "High",
            "headcount": 3,
            "timeline": { "kickoff": "2024-07-01" },
            "start_date": "2024-07-01"
        }))
        .into_project()
        .unwrap();

        assert_eq!(project.priority, "High");
        assert_eq!(project.headcount, 3);
        assert_eq!(project.timeline["kickoff"], "2024-07-01");
        assert_eq!(project.start_date.as_deref(), Some("2024-07-01"));
    }

    #[test]
    fn test_name_and_headcount_validated() {
        assert!(matches!(
            request(json!({ "required_skills": ["Rust"] })).into_project(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            request(json!({ "project_name": "P", "headcount": 0 })).into_project(),
            Err(AppError::Validation(_))
        ));
    }
}
