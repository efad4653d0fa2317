use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{Candidate, PreviousExperience};
use crate::normalize::text::{
    dedup_preserving_order, normalize_date_list, normalize_list_field, FieldInput,
};
use crate::normalize::MAX_PREVIOUS_EXPERIENCE;
use crate::state::AppState;
use crate::store::{EmployeeFilter, EmployeeSort, PageRequest, RoleFilter};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maps a present key to `Some(..)`, so `null` arrives as `Some(None)`
/// while a missing key stays `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create / update payload. On update, absent fields are left untouched and
/// an explicit `null` clears the field.
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeBody {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<String>>,
    /// List or comma-separated string.
    #[serde(default, deserialize_with = "present")]
    pub skills: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub projects: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub previous_experience: Option<Option<Vec<PreviousExperience>>>,
    #[serde(default, deserialize_with = "present")]
    pub availability: Option<Option<String>>,
    /// List or comma-separated string of dates or timestamps.
    #[serde(default, deserialize_with = "present")]
    pub availability_dates: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub cv_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub portfolio_url: Option<Option<String>>,
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn clean_previous_experience(entries: &[PreviousExperience]) -> Vec<PreviousExperience> {
    let cleaned = entries.iter().map(|e| PreviousExperience {
        company: e.company.as_deref().and_then(trimmed),
        title: e.title.as_deref().and_then(trimmed),
        duration: e.duration.as_deref().and_then(trimmed),
    });
    let mut kept = dedup_preserving_order(cleaned.filter(PreviousExperience::is_substantive));
    kept.truncate(MAX_PREVIOUS_EXPERIENCE);
    kept
}

impl EmployeeBody {
    /// Writes every provided field onto the record, normalizing list fields.
    fn apply_to(&self, employee: &mut Candidate) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            employee.name = trimmed(name)
                .ok_or_else(|| AppError::Validation("name must not be blank".to_string()))?;
        }
        if let Some(role) = &self.role {
            employee.role = role.as_deref().and_then(trimmed);
        }
        if let Some(skills) = &self.skills {
            employee.skills = normalize_list_field(FieldInput::from_value(skills.as_ref()));
        }
        if let Some(projects) = &self.projects {
            employee.projects = normalize_list_field(FieldInput::from_value(projects.as_ref()));
        }
        if let Some(previous) = &self.previous_experience {
            employee.previous_experience = previous
                .as_deref()
                .map(clean_previous_experience)
                .unwrap_or_default();
        }
        if let Some(availability) = &self.availability {
            employee.availability = availability.as_deref().and_then(trimmed);
        }
        if let Some(dates) = &self.availability_dates {
            employee.availability_dates = normalize_date_list(FieldInput::from_value(dates.as_ref()));
        }
        if let Some(cv_url) = &self.cv_url {
            employee.cv_url = cv_url.as_deref().and_then(trimmed);
        }
        if let Some(portfolio_url) = &self.portfolio_url {
            employee.portfolio_url = portfolio_url.as_deref().and_then(trimmed);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub employee: Candidate,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEmployeesQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub role_like: Option<String>,
    pub skill: Option<String>,
    /// Comma-separated, any-of.
    pub skills: Option<String>,
    /// `field` or `-field`; `name`, `created_at` or `updated_at`.
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListEmployeesQuery {
    fn filter(&self) -> EmployeeFilter {
        let role = match (
            self.role_like.as_deref().and_then(trimmed),
            self.role.as_deref().and_then(trimmed),
        ) {
            (Some(like), _) => Some(RoleFilter::Like(like)),
            (None, Some(exact)) => Some(RoleFilter::Exact(exact)),
            (None, None) => None,
        };

        let csv_skills: Vec<String> = self
            .skills
            .as_deref()
            .map(|csv| normalize_list_field(FieldInput::Csv(csv)))
            .unwrap_or_default();
        let skills = if csv_skills.is_empty() {
            self.skill.as_deref().and_then(trimmed).into_iter().collect()
        } else {
            csv_skills
        };

        EmployeeFilter {
            name_contains: self.q.as_deref().and_then(trimmed),
            role,
            skills,
        }
    }

    fn sort(&self) -> Result<EmployeeSort, AppError> {
        self.sort
            .as_deref()
            .map_or(Ok(EmployeeSort::default()), EmployeeSort::parse)
    }

    fn page(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct EmployeeListResponse {
    pub data: Vec<Candidate>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: Uuid,
}

/// POST /employees
pub async fn handle_create_employee(
    State(state): State<AppState>,
    Json(body): Json<EmployeeBody>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    let name = body
        .name
        .as_deref()
        .and_then(trimmed)
        .ok_or_else(|| AppError::Validation("name is required".to_string()))?;

    let mut employee = Candidate::new(name);
    body.apply_to(&mut employee)?;
    state.candidates.insert(&employee).await?;

    Ok((StatusCode::CREATED, Json(EmployeeResponse { employee })))
}

/// GET /employees
pub async fn handle_list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<Json<EmployeeListResponse>, AppError> {
    let sort = query.sort()?;
    let page = query.page();
    let (data, total) = state.candidates.list(&query.filter(), sort, page).await?;
    Ok(Json(EmployeeListResponse {
        data,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total,
        },
    }))
}

/// GET /employees/:id
pub async fn handle_get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let employee = state
        .candidates
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))?;
    Ok(Json(EmployeeResponse { employee }))
}

/// PATCH|PUT /employees/:id
pub async fn handle_update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<EmployeeBody>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let mut employee = state
        .candidates
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))?;

    body.apply_to(&mut employee)?;
    employee.updated_at = Utc::now();
    state.candidates.update(&employee).await?;

    Ok(Json(EmployeeResponse { employee }))
}

/// DELETE /employees/:id
pub async fn handle_delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.candidates.delete(id).await? {
        return Err(AppError::NotFound(format!("Employee {id} not found")));
    }
    Ok(Json(DeletedResponse { deleted: id }))
}
