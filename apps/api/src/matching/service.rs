use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::rerank::{templated_reason, Reranker};
use crate::matching::scoring::{normalize_scores, rank, score_candidates, ScoredCandidate};
use crate::models::project::Project;
use crate::store::{CandidateStore, ProjectStore};

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 100;
/// How many of the best candidates the AI capability gets to see.
pub const RERANK_WINDOW: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRequest {
    pub project_id: Uuid,
    pub limit: usize,
    pub use_ai: bool,
}

/// Project fields echoed back with a match.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub project_name: String,
    pub required_skills: Vec<String>,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<String>,
    pub headcount: i32,
}

impl From<&Project> for ProjectView {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id,
            project_name: p.project_name.clone(),
            required_skills: p.required_skills.clone(),
            description: p.description.clone(),
            priority: p.priority.clone(),
            status: p.status.clone(),
            start_date: p.start_date.clone(),
            end_date: p.end_date.clone(),
            duration: p.duration.clone(),
            headcount: p.headcount,
        }
    }
}

/// Public view of a ranked candidate. Only matched skills are exposed.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub matched_skills: Vec<String>,
    pub availability: Option<String>,
    pub availability_dates: Vec<String>,
    pub score: f64,
    pub ai_reason: String,
}

impl From<ScoredCandidate> for CandidateMatch {
    fn from(c: ScoredCandidate) -> Self {
        let ai_reason = c.ai_reason.clone().unwrap_or_else(|| templated_reason(&c));
        Self {
            id: c.candidate.id,
            name: c.candidate.name,
            role: c.candidate.role,
            matched_skills: c.matched_skills,
            availability: c.candidate.availability,
            availability_dates: c.candidate.availability_dates,
            score: c.score.unwrap_or(0.0),
            ai_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub project: ProjectView,
    pub candidates: Vec<CandidateMatch>,
}

/// Ranks every stored candidate for one project.
pub async fn match_for_project(
    candidates: &dyn CandidateStore,
    projects: &dyn ProjectStore,
    reranker: &Reranker,
    request: MatchRequest,
) -> Result<MatchResponse, AppError> {
    let project = projects
        .find_by_id(request.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", request.project_id)))?;

    let pool = candidates.find_all().await?;
    let pool_size = pool.len();

    let mut ranked = score_candidates(pool, &project);
    rank(&mut ranked);

    if request.use_ai && ranked.len() > 1 {
        let top_k = RERANK_WINDOW.min(ranked.len());
        ranked = reranker.rerank(&project, ranked, top_k).await;
    }

    ranked.truncate(request.limit);
    for c in ranked.iter_mut().filter(|c| c.ai_reason.is_none()) {
        c.ai_reason = Some(templated_reason(c));
    }
    normalize_scores(&mut ranked);

    info!(
        "Matched project {} against {} candidates (returned {}, ai={})",
        project.id,
        pool_size,
        ranked.len(),
        request.use_ai
    );

    Ok(MatchResponse {
        project: ProjectView::from(&project),
        candidates: ranked.into_iter().map(CandidateMatch::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{Duration as Days, Utc};
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::StubGenerator;
    use crate::llm_client::TextGenerator;
    use crate::models::candidate::Candidate;
    use crate::store::memory::MemoryStore;

    fn candidate(name: &str, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new(name);
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    async fn seeded(candidates: Vec<Candidate>) -> (MemoryStore, Project) {
        let store = MemoryStore::with_candidates(candidates);
        let project = Project::new("Portal", vec!["React".to_string(), "Django".to_string()]);
        ProjectStore::insert(&store, &project).await.unwrap();
        (store, project)
    }

    fn request(project: &Project, limit: usize, use_ai: bool) -> MatchRequest {
        MatchRequest {
            project_id: project.id,
            limit,
            use_ai,
        }
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let (store, _) = seeded(vec![]).await;
        let reranker = Reranker::new(None, Duration::from_secs(5));
        let req = MatchRequest {
            project_id: Uuid::new_v4(),
            limit: 5,
            use_ai: false,
        };
        let err = match_for_project(&store, &store, &reranker, req).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ranks_truncates_and_normalizes() {
        let mut strong = candidate("Strong", &["react", "Django"]);
        let mut buckets = IndexMap::new();
        buckets.insert("Django".to_string(), vec!["Exam Portal".to_string()]);
        strong.projects_by_skill = buckets;

        let (store, project) = seeded(vec![
            candidate("Nobody", &["Cobol"]),
            candidate("Half", &["React"]),
            strong,
        ])
        .await;
        let reranker = Reranker::new(None, Duration::from_secs(5));

        let out = match_for_project(&store, &store, &reranker, request(&project, 2, false))
            .await
            .unwrap();

        let names: Vec<_> = out.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Strong", "Half"]);
        assert_eq!(out.candidates[0].score, 100.0);
        // 4 / 11
        assert_eq!(out.candidates[1].score, 36.36);
        assert_eq!(out.candidates[0].matched_skills, vec!["react", "Django"]);
        assert!(out.candidates.iter().all(|c| !c.ai_reason.is_empty()));
        assert_eq!(out.project.project_name, "Portal");
    }

    #[tokio::test]
    async fn test_all_zero_pool_scores_zero() {
        let (store, project) = seeded(vec![candidate("A", &["Cobol"]), candidate("B", &[])]).await;
        let reranker = Reranker::new(None, Duration::from_secs(5));

        let out = match_for_project(&store, &store, &reranker, request(&project, 5, false))
            .await
            .unwrap();

        let names: Vec<_> = out.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(out.candidates.iter().all(|c| c.score == 0.0));
    }

    #[tokio::test]
    async fn test_empty_pool_returns_no_candidates() {
        let (store, project) = seeded(vec![]).await;
        let reranker = Reranker::new(None, Duration::from_secs(5));
        let out = match_for_project(&store, &store, &reranker, request(&project, 5, true))
            .await
            .unwrap();
        assert!(out.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_ai_skipped_for_single_candidate() {
        let stub = Arc::new(StubGenerator::replying("{\"results\": []}"));
        let generator: Arc<dyn TextGenerator> = stub.clone();
        let reranker = Reranker::new(Some(generator), Duration::from_secs(5));
        let (store, project) = seeded(vec![candidate("Solo", &["React"])]).await;

        let out = match_for_project(&store, &store, &reranker, request(&project, 5, true))
            .await
            .unwrap();

        assert_eq!(stub.calls(), 0);
        assert_eq!(out.candidates.len(), 1);
        assert!(out.candidates[0].ai_reason.starts_with("This employee has React skills"));
    }

    #[tokio::test]
    async fn test_ai_rerank_can_reorder_the_window() {
        let first = candidate("First", &["React", "Django"]);
        let second = candidate("Second", &["React", "Django"]);
        let reply = json!({
            "results": [
                { "id": first.id.to_string(), "rerank_score": 0.0, "reason": "Stretched thin." },
                { "id": second.id.to_string(), "rerank_score": 1.0, "reason": "Ready now." }
            ]
        })
        .to_string();
        let stub = Arc::new(StubGenerator::replying(reply));
        let generator: Arc<dyn TextGenerator> = stub.clone();
        let reranker = Reranker::new(Some(generator), Duration::from_secs(5));

        // Tied at 8 before the model: 8 * 0.8 = 6.4 against 8 * 1.2 = 9.6
        let (store, project) = seeded(vec![first, second]).await;
        let out = match_for_project(&store, &store, &reranker, request(&project, 5, true))
            .await
            .unwrap();

        assert_eq!(stub.calls(), 1);
        assert_eq!(out.candidates[0].name, "Second");
        assert_eq!(out.candidates[0].ai_reason, "Ready now.");
        assert_eq!(out.candidates[0].score, 100.0);
        assert_eq!(out.candidates[1].name, "First");
        assert_eq!(out.candidates[1].ai_reason, "Stretched thin.");
        assert!((out.candidates[1].score - 66.67).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_ai_reasons_kept_when_order_holds() {
        let first = candidate("First", &["React", "Django"]);
        let second = candidate("Second", &["React"]);
        let reply = json!({
            "results": [
                { "id": first.id.to_string(), "rerank_score": 0.0, "reason": "Stretched thin." },
                { "id": second.id.to_string(), "rerank_score": 1.0, "reason": "Ready now." }
            ]
        })
        .to_string();
        let generator: Arc<dyn TextGenerator> = Arc::new(StubGenerator::replying(reply));
        let reranker = Reranker::new(Some(generator), Duration::from_secs(5));

        // 8 * 0.8 = 6.4 still beats 4 * 1.2 = 4.8
        let (store, project) = seeded(vec![first, second]).await;
        let out = match_for_project(&store, &store, &reranker, request(&project, 5, true))
            .await
            .unwrap();

        assert_eq!(out.candidates[0].name, "First");
        assert_eq!(out.candidates[0].ai_reason, "Stretched thin.");
        assert_eq!(out.candidates[1].ai_reason, "Ready now.");
        assert_eq!(out.candidates[1].score, 75.0);
    }

    #[tokio::test]
    async fn test_availability_breaks_ties() {
        let mut soon = candidate("Soon", &["React"]);
        soon.availability_dates = vec![Utc::now().date_naive().format("%Y-%m-%d").to_string()];
        let mut later = candidate("Later", &["React"]);
        later.availability_dates =
            vec![(Utc::now().date_naive() + Days::days(60)).format("%Y-%m-%d").to_string()];

        let (store, project) = seeded(vec![later, soon]).await;
        let reranker = Reranker::new(None, Duration::from_secs(5));
        let out = match_for_project(&store, &store, &reranker, request(&project, 5, false))
            .await
            .unwrap();

        assert_eq!(out.candidates[0].name, "Soon");
    }
}
