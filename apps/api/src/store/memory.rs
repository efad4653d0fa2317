//! In-memory stores for handler and router tests.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::allocation::Allocation;
use crate::models::candidate::Candidate;
use crate::models::project::Project;
use crate::store::{
    AllocationStore, BlobStore, CandidateStore, EmployeeFilter, EmployeeSort, PageRequest,
    ProjectStore, RoleFilter, SortField,
};

/// What the Postgres `WHERE` clause does, over a slice.
fn matches(filter: &EmployeeFilter, candidate: &Candidate) -> bool {
    let contains_ci = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    let name_ok = filter
        .name_contains
        .as_ref()
        .map_or(true, |q| contains_ci(&candidate.name, q.as_str()));

    let role_ok = match &filter.role {
        None => true,
        Some(RoleFilter::Like(r)) => candidate
            .role
            .as_deref()
            .is_some_and(|c| contains_ci(c, r.as_str())),
        Some(RoleFilter::Exact(r)) => candidate.role.as_deref() == Some(r.as_str()),
    };

    let skills_ok =
        filter.skills.is_empty() || filter.skills.iter().any(|s| candidate.skills.contains(s));

    name_ok && role_ok && skills_ok
}

/// `ORDER BY <field> <dir>`. Used with a stable sort, so ties keep insertion order.
fn compare(sort: EmployeeSort, a: &Candidate, b: &Candidate) -> Ordering {
    let by_field = match sort.field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    if sort.descending {
        by_field.reverse()
    } else {
        by_field
    }
}

#[derive(Default)]
pub struct MemoryStore {
    candidates: Mutex<Vec<Candidate>>,
    projects: Mutex<Vec<Project>>,
    allocations: Mutex<Vec<Allocation>>,
}

impl MemoryStore {
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Candidate>, AppError> {
        Ok(self.candidates.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>, AppError> {
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        page: PageRequest,
    ) -> Result<(Vec<Candidate>, u64), AppError> {
        let all = self.candidates.lock().unwrap();
        let mut matching: Vec<&Candidate> = all.iter().filter(|c| matches(filter, c)).collect();
        matching.sort_by(|a, b| compare(sort, a, b));
        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((data, total))
    }

    async fn insert(&self, candidate: &Candidate) -> Result<(), AppError> {
        self.candidates.lock().unwrap().push(candidate.clone());
        Ok(())
    }

    async fn update(&self, candidate: &Candidate) -> Result<(), AppError> {
        let mut all = self.candidates.lock().unwrap();
        let slot = all
            .iter_mut()
            .find(|c| c.id == candidate.id)
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", candidate.id)))?;
        *slot = candidate.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut all = self.candidates.lock().unwrap();
        let before = all.len();
        all.retain(|c| c.id != id);
        Ok(all.len() < before)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Project>, AppError> {
        let mut projects = self.projects.lock().unwrap().clone();
        projects.reverse();
        Ok(projects)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn insert(&self, project: &Project) -> Result<(), AppError> {
        self.projects.lock().unwrap().push(project.clone());
        Ok(())
    }
}

#[async_trait]
impl AllocationStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Allocation>, AppError> {
        let mut allocations = self.allocations.lock().unwrap().clone();
        allocations.reverse();
        Ok(allocations)
    }

    async fn insert(&self, allocation: &Allocation) -> Result<(), AppError> {
        self.allocations.lock().unwrap().push(allocation.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut all = self.allocations.lock().unwrap();
        let before = all.len();
        all.retain(|a| a.id != id);
        Ok(all.len() < before)
    }
}

/// Records every blob written.
#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: Mutex<Vec<(String, Bytes, String)>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError> {
        self.blobs
            .lock()
            .unwrap()
            .push((key.to_string(), bytes, content_type.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, role: Option<&str>, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new(name);
        c.role = role.map(String::from);
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches(&EmployeeFilter::default(), &candidate("Asha", None, &[])));
    }

    #[test]
    fn test_name_and_role_like_are_case_insensitive() {
        let c = candidate("Asha Menon", Some("Senior Backend Engineer"), &["Rust"]);
        let filter = EmployeeFilter {
            name_contains: Some("menon".to_string()),
            role: Some(RoleFilter::Like("backend".to_string())),
            ..Default::default()
        };
        assert!(matches(&filter, &c));

        let exact = EmployeeFilter {
            role: Some(RoleFilter::Exact("senior backend engineer".to_string())),
            ..Default::default()
        };
        assert!(!matches(&exact, &c));
    }

    async fn names_sorted(store: &MemoryStore, sort: &str) -> Vec<String> {
        let sort = EmployeeSort::parse(sort).unwrap();
        let page = PageRequest { page: 1, limit: 10 };
        let (data, _) = store
            .list(&EmployeeFilter::default(), sort, page)
            .await
            .unwrap();
        data.into_iter().map(|c| c.name).collect()
    }

    #[tokio::test]
    async fn test_list_honours_sort() {
        let base = chrono::Utc::now();
        let candidates = [(0, "Bina"), (1, "Asha"), (2, "Chen")]
            .into_iter()
            .map(|(offset, name)| {
                let mut c = candidate(name, None, &[]);
                c.created_at = base + chrono::Duration::seconds(offset);
                c
            })
            .collect();
        let store = MemoryStore::with_candidates(candidates);

        assert_eq!(names_sorted(&store, "").await, vec!["Bina", "Asha", "Chen"]);
        assert_eq!(names_sorted(&store, "-created_at").await, vec!["Chen", "Asha", "Bina"]);
        assert_eq!(names_sorted(&store, "name").await, vec!["Asha", "Bina", "Chen"]);
        assert_eq!(names_sorted(&store, "-name").await, vec!["Chen", "Bina", "Asha"]);
    }

    #[test]
    fn test_skills_are_any_of() {
        let c = candidate("Asha", None, &["Rust", "Go"]);
        let filter = EmployeeFilter {
            skills: vec!["Python".to_string(), "Go".to_string()],
            ..Default::default()
        };
        assert!(matches(&filter, &c));

        let miss = EmployeeFilter {
            skills: vec!["go".to_string()],
            ..Default::default()
        };
        assert!(!matches(&miss, &c));
    }
}
