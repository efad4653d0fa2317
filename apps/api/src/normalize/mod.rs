//! Resume field normalization — turns loosely shaped extraction output
//! (from the AI capability or the heuristic parser) into the canonical
//! candidate schema the matcher reads.
//!
//! Everything in here is pure and total: malformed input degrades to empty
//! values, it never produces an error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::candidate::PreviousExperience;

pub mod extraction;
pub mod heuristic;
pub mod text;

pub use extraction::normalize_extraction;
pub use heuristic::heuristic_parse;

pub const MAX_SKILLS: usize = 50;
pub const MAX_PROJECTS: usize = 50;
pub const MAX_PROJECTS_PER_SKILL: usize = 20;
pub const MAX_PREVIOUS_EXPERIENCE: usize = 20;

/// Canonical resume-derived fields of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCandidateFields {
    pub skills: Vec<String>,
    pub projects_by_skill: IndexMap<String, Vec<String>>,
    pub projects: Vec<String>,
    pub previous_experience: Vec<PreviousExperience>,
    pub role: Option<String>,
    pub availability: Option<String>,
}
