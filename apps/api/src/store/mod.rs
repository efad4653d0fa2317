//! Storage seams. Handlers and the matcher only see these traits; `AppState`
//! carries them as `Arc<dyn ...>` so tests can swap in the in-memory store.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::allocation::Allocation;
use crate::models::candidate::Candidate;
use crate::models::project::Project;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod s3;

/// Employee list filters. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub role: Option<RoleFilter>,
    /// Any-of, exact skill names.
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleFilter {
    /// Case-insensitive substring.
    Like(String),
    Exact(String),
}

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Columns an employee list may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// `field` ascending or `-field` descending. Ties fall back to `id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeSort {
    pub field: SortField,
    pub descending: bool,
}

impl EmployeeSort {
    /// Parses `name`, `-created_at` and the like. Blank input is the default order.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "name" => SortField::Name,
            "created_at" => SortField::CreatedAt,
            "updated_at" => SortField::UpdatedAt,
            other => {
                return Err(AppError::Validation(format!(
                    "Cannot sort employees by '{other}'"
                )))
            }
        };
        Ok(Self { field, descending })
    }
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Every candidate, in `(created_at, id)` order.
    async fn find_all(&self) -> Result<Vec<Candidate>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>, AppError>;
    /// Filtered, ordered page plus the total number of matches.
    async fn list(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        page: PageRequest,
    ) -> Result<(Vec<Candidate>, u64), AppError>;
    async fn insert(&self, candidate: &Candidate) -> Result<(), AppError>;
    /// Replaces the stored record. `NotFound` if it does not exist.
    async fn update(&self, candidate: &Candidate) -> Result<(), AppError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Project>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError>;
    async fn insert(&self, project: &Project) -> Result<(), AppError>;
}

#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Allocation>, AppError>;
    async fn insert(&self, allocation: &Allocation) -> Result<(), AppError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageRequest { page: 3, limit: 25 }.offset(), 50);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(EmployeeSort::parse("").unwrap(), EmployeeSort::default());
        assert_eq!(
            EmployeeSort::parse(" -created_at ").unwrap(),
            EmployeeSort {
                field: SortField::CreatedAt,
                descending: true,
            }
        );
        assert_eq!(
            EmployeeSort::parse("name").unwrap(),
            EmployeeSort {
                field: SortField::Name,
                descending: false,
            }
        );
        assert!(matches!(
            EmployeeSort::parse("-skills"),
            Err(AppError::Validation(_))
        ));
    }
}
