//! Candidate matching — scoring, ranking and optional AI re-ranking of the
//! stored employees against one project.

pub mod handlers;
pub mod prompts;
pub mod rerank;
pub mod scoring;
pub mod service;
