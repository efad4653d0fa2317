use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::parse_flag;
use crate::errors::AppError;
use crate::matching::service::{
    match_for_project, MatchRequest, MatchResponse, DEFAULT_LIMIT, MAX_LIMIT,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub project_id: Option<String>,
    /// Parsed in `into_request`; a malformed value is a validation error.
    pub limit: Option<String>,
    pub use_ai: Option<String>,
}

impl MatchQuery {
    fn into_request(self) -> Result<MatchRequest, AppError> {
        let raw_id = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("project_id is required".to_string()))?;
        let project_id = Uuid::parse_str(raw_id)
            .map_err(|_| AppError::Validation(format!("Invalid project_id '{raw_id}'")))?;

        let limit = match self.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::Validation(format!("Invalid limit '{raw}'")))?
                .clamp(1, MAX_LIMIT as i64) as usize,
        };

        Ok(MatchRequest {
            project_id,
            limit,
            use_ai: self.use_ai.as_deref().is_some_and(parse_flag),
        })
    }
}

/// GET /match?project_id=&limit=&use_ai=
pub async fn handle_match(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    let request = query.into_request()?;
    let response = match_for_project(
        state.candidates.as_ref(),
        state.projects.as_ref(),
        &state.reranker,
        request,
    )
    .await?;
    Ok(Json(response))
}
