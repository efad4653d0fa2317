use std::sync::Arc;

use crate::config::Config;
use crate::matching::rerank::Reranker;
use crate::resume::extractor::ResumeExtractor;
use crate::store::{AllocationStore, BlobStore, CandidateStore, ProjectStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub candidates: Arc<dyn CandidateStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub allocations: Arc<dyn AllocationStore>,
    /// Uploaded resume files.
    pub blobs: Arc<dyn BlobStore>,
    /// AI-first resume field extraction with heuristic fallback.
    pub extractor: Arc<ResumeExtractor>,
    pub reranker: Arc<Reranker>,
    pub config: Config,
}
