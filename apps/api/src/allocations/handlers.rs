use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::allocation::Allocation;
use crate::state::AppState;

const INVALID_REFERENCE: &str = "Invalid employee or project";

#[derive(Debug, Default, Deserialize)]
pub struct CreateAllocationRequest {
    pub employee_id: Option<String>,
    pub project_id: Option<String>,
}

impl CreateAllocationRequest {
    /// Both ids, or the shared validation error if either is missing or malformed.
    fn ids(&self) -> Result<(Uuid, Uuid), AppError> {
        let parse = |raw: Option<&str>| {
            raw.map(str::trim)
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| AppError::Validation(INVALID_REFERENCE.to_string()))
        };
        Ok((
            parse(self.employee_id.as_deref())?,
            parse(self.project_id.as_deref())?,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub allocation: Allocation,
}

#[derive(Debug, Serialize)]
pub struct AllocationListResponse {
    pub data: Vec<Allocation>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: Uuid,
}

/// GET /hr_allocation
pub async fn handle_list_allocations(
    State(state): State<AppState>,
) -> Result<Json<AllocationListResponse>, AppError> {
    let data = state.allocations.find_all().await?;
    Ok(Json(AllocationListResponse { data }))
}

/// POST /hr_allocation
///
/// Both records must exist; their names are copied onto the allocation.
pub async fn handle_create_allocation(
    State(state): State<AppState>,
    Json(req): Json<CreateAllocationRequest>,
) -> Result<(StatusCode, Json<AllocationResponse>), AppError> {
    let (employee_id, project_id) = req.ids()?;

    let employee = state.candidates.find_by_id(employee_id).await?;
    let project = state.projects.find_by_id(project_id).await?;
    let (Some(employee), Some(project)) = (employee, project) else {
        warn!("Rejected allocation of employee {employee_id} to project {project_id}");
        return Err(AppError::Validation(INVALID_REFERENCE.to_string()));
    };

    let allocation = Allocation::new(&employee, &project);
    state.allocations.insert(&allocation).await?;

    Ok((StatusCode::CREATED, Json(AllocationResponse { allocation })))
}

/// DELETE /hr_allocation/:id
pub async fn handle_delete_allocation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.allocations.delete(id).await? {
        return Err(AppError::NotFound(format!("Allocation {id} not found")));
    }
    Ok(Json(DeletedResponse { deleted: id }))
}
