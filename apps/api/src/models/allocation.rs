use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::Candidate;
use crate::models::project::Project;

pub const ACTIVE_STATUS: &str = "Active";

/// An employee placed on a project. Names are copied at allocation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub project_id: Uuid,
    pub project_name: String,
    pub allocated_on: DateTime<Utc>,
    pub status: String,
}

impl Allocation {
    pub fn new(employee: &Candidate, project: &Project) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee.id,
            employee_name: employee.name.clone(),
            project_id: project.id,
            project_name: project.project_name.clone(),
            allocated_on: Utc::now(),
            status: ACTIVE_STATUS.to_string(),
        }
    }
}
