use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::CanonicalCandidateFields;

/// One structured line of employment history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviousExperience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub duration: Option<String>,
}

impl PreviousExperience {
    /// True when the entry names a company or a title.
    pub fn is_substantive(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.company) || present(&self.title)
    }
}

/// A stored employee record in canonical form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub skills: Vec<String>,
    pub projects_by_skill: IndexMap<String, Vec<String>>,
    pub projects: Vec<String>,
    pub previous_experience: Vec<PreviousExperience>,
    pub availability: Option<String>,
    pub availability_dates: Vec<String>,
    pub cv_file_key: Option<String>,
    pub cv_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role: None,
            skills: Vec::new(),
            projects_by_skill: IndexMap::new(),
            projects: Vec::new(),
            previous_experience: Vec::new(),
            availability: None,
            availability_dates: Vec::new(),
            cv_file_key: None,
            cv_url: None,
            portfolio_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the resume-derived fields with a fresh extraction.
    /// `role` is only filled in when the record has none yet.
    pub fn apply_extraction(&mut self, fields: CanonicalCandidateFields) {
        self.skills = fields.skills;
        self.projects_by_skill = fields.projects_by_skill;
        self.projects = fields.projects;
        self.previous_experience = fields.previous_experience;
        if self.role.as_deref().map_or(true, |r| r.trim().is_empty()) {
            self.role = fields.role;
        }
        self.updated_at = Utc::now();
    }
}
