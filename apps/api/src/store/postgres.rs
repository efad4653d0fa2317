use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::allocation::Allocation;
use crate::models::candidate::{Candidate, PreviousExperience};
use crate::models::project::Project;
use crate::store::{
    AllocationStore, CandidateStore, EmployeeFilter, EmployeeSort, PageRequest, ProjectStore,
    RoleFilter,
};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS employees (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        role TEXT,
        skills TEXT[] NOT NULL DEFAULT '{}',
        projects_by_skill JSONB NOT NULL DEFAULT '{}'::jsonb,
        projects TEXT[] NOT NULL DEFAULT '{}',
        previous_experience JSONB NOT NULL DEFAULT '[]'::jsonb,
        availability TEXT,
        availability_dates TEXT[] NOT NULL DEFAULT '{}',
        cv_file_key TEXT,
        cv_url TEXT,
        portfolio_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS employees_name_idx ON employees (name)",
    "CREATE INDEX IF NOT EXISTS employees_role_idx ON employees (role)",
    "CREATE INDEX IF NOT EXISTS employees_skills_idx ON employees USING GIN (skills)",
    r#"CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        project_name TEXT NOT NULL,
        required_skills TEXT[] NOT NULL DEFAULT '{}',
        description TEXT,
        duration TEXT,
        timeline JSONB NOT NULL DEFAULT '{}'::jsonb,
        priority TEXT NOT NULL DEFAULT 'Medium',
        headcount INTEGER NOT NULL DEFAULT 1,
        status TEXT NOT NULL DEFAULT 'Open',
        start_date TEXT,
        end_date TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS projects_name_idx ON projects (project_name)",
    "CREATE INDEX IF NOT EXISTS projects_skills_idx ON projects USING GIN (required_skills)",
    r#"CREATE TABLE IF NOT EXISTS hr_allocations (
        id UUID PRIMARY KEY,
        employee_id UUID NOT NULL,
        employee_name TEXT NOT NULL,
        project_id UUID NOT NULL,
        project_name TEXT NOT NULL,
        allocated_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        status TEXT NOT NULL DEFAULT 'Active'
    )"#,
    "CREATE INDEX IF NOT EXISTS hr_allocations_allocated_on_idx ON hr_allocations (allocated_on)",
];

/// Postgres-backed employee, project and allocation store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ensured");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    role: Option<String>,
    skills: Vec<String>,
    projects_by_skill: Json<IndexMap<String, Vec<String>>>,
    projects: Vec<String>,
    previous_experience: Json<Vec<PreviousExperience>>,
    availability: Option<String>,
    availability_dates: Vec<String>,
    cv_file_key: Option<String>,
    cv_url: Option<String>,
    portfolio_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Candidate {
    fn from(row: EmployeeRow) -> Self {
        Candidate {
            id: row.id,
            name: row.name,
            role: row.role,
            skills: row.skills,
            projects_by_skill: row.projects_by_skill.0,
            projects: row.projects,
            previous_experience: row.previous_experience.0,
            availability: row.availability,
            availability_dates: row.availability_dates,
            cv_file_key: row.cv_file_key,
            cv_url: row.cv_url,
            portfolio_url: row.portfolio_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    project_name: String,
    required_skills: Vec<String>,
    description: Option<String>,
    duration: Option<String>,
    timeline: Value,
    priority: String,
    headcount: i32,
    status: String,
    start_date: Option<String>,
    end_date: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            project_name: row.project_name,
            required_skills: row.required_skills,
            description: row.description,
            duration: row.duration,
            timeline: row.timeline,
            priority: row.priority,
            headcount: row.headcount,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AllocationRow {
    id: Uuid,
    employee_id: Uuid,
    employee_name: String,
    project_id: Uuid,
    project_name: String,
    allocated_on: DateTime<Utc>,
    status: String,
}

impl From<AllocationRow> for Allocation {
    fn from(row: AllocationRow) -> Self {
        Allocation {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            project_id: row.project_id,
            project_name: row.project_name,
            allocated_on: row.allocated_on,
            status: row.status,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Employees
// ────────────────────────────────────────────────────────────────────────────

/// Escapes LIKE metacharacters and wraps the needle for a substring match.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EmployeeFilter) {
    qb.push(" WHERE TRUE");
    if let Some(q) = &filter.name_contains {
        qb.push(" AND name ILIKE ").push_bind(like_pattern(q));
    }
    match &filter.role {
        Some(RoleFilter::Like(r)) => {
            qb.push(" AND role ILIKE ").push_bind(like_pattern(r));
        }
        Some(RoleFilter::Exact(r)) => {
            qb.push(" AND role = ").push_bind(r.clone());
        }
        None => {}
    }
    if !filter.skills.is_empty() {
        qb.push(" AND skills && ").push_bind(filter.skills.clone());
    }
}

/// Column names come from `SortField`, never from request text.
fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: EmployeeSort) {
    let direction = if sort.descending { "DESC" } else { "ASC" };
    qb.push(format!(" ORDER BY {} {direction}, id", sort.field.column()));
}

#[async_trait]
impl CandidateStore for PgStore {
    async fn find_all(&self) -> Result<Vec<Candidate>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        debug!("Loaded {} employees", rows.len());
        Ok(rows.into_iter().map(Candidate::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Candidate::from))
    }

    async fn list(
        &self,
        filter: &EmployeeFilter,
        sort: EmployeeSort,
        page: PageRequest,
    ) -> Result<(Vec<Candidate>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM employees");
        push_filter(&mut select, filter);
        push_order(&mut select, sort);
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<EmployeeRow> = select.build_query_as::<EmployeeRow>().fetch_all(&self.pool).await?;

        Ok((
            rows.into_iter().map(Candidate::from).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    async fn insert(&self, c: &Candidate) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO employees
                (id, name, role, skills, projects_by_skill, projects, previous_experience,
                 availability, availability_dates, cv_file_key, cv_url, portfolio_url,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.role)
        .bind(&c.skills)
        .bind(Json(&c.projects_by_skill))
        .bind(&c.projects)
        .bind(Json(&c.previous_experience))
        .bind(&c.availability)
        .bind(&c.availability_dates)
        .bind(&c.cv_file_key)
        .bind(&c.cv_url)
        .bind(&c.portfolio_url)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted employee {} ({})", c.id, c.name);
        Ok(())
    }

    async fn update(&self, c: &Candidate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE employees SET
                name = $2, role = $3, skills = $4, projects_by_skill = $5, projects = $6,
                previous_experience = $7, availability = $8, availability_dates = $9,
                cv_file_key = $10, cv_url = $11, portfolio_url = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.role)
        .bind(&c.skills)
        .bind(Json(&c.projects_by_skill))
        .bind(&c.projects)
        .bind(Json(&c.previous_experience))
        .bind(&c.availability)
        .bind(&c.availability_dates)
        .bind(&c.cv_file_key)
        .bind(&c.cv_url)
        .bind(&c.portfolio_url)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Employee {} not found", c.id)));
        }
        info!("Updated employee {}", c.id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ProjectStore for PgStore {
    async fn find_all(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    async fn insert(&self, p: &Project) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, project_name, required_skills, description, duration, timeline,
                 priority, headcount, status, start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(p.id)
        .bind(&p.project_name)
        .bind(&p.required_skills)
        .bind(&p.description)
        .bind(&p.duration)
        .bind(&p.timeline)
        .bind(&p.priority)
        .bind(p.headcount)
        .bind(&p.status)
        .bind(&p.start_date)
        .bind(&p.end_date)
        .bind(p.created_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted project {} ({})", p.id, p.project_name);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Allocations
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AllocationStore for PgStore {
    async fn find_all(&self) -> Result<Vec<Allocation>, AppError> {
        let rows = sqlx::query_as::<_, AllocationRow>(
            "SELECT * FROM hr_allocations ORDER BY allocated_on DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Allocation::from).collect())
    }

    async fn insert(&self, a: &Allocation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO hr_allocations
                (id, employee_id, employee_name, project_id, project_name, allocated_on, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(a.id)
        .bind(a.employee_id)
        .bind(&a.employee_name)
        .bind(a.project_id)
        .bind(&a.project_name)
        .bind(a.allocated_on)
        .bind(&a.status)
        .execute(&self.pool)
        .await?;

        info!(
            "Allocated employee {} to project {} ({})",
            a.employee_id, a.project_id, a.id
        );
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM hr_allocations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("dev"), "%dev%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn test_filter_sql_shape() {
        let filter = EmployeeFilter {
            name_contains: Some("asha".to_string()),
            role: Some(RoleFilter::Exact("Lead".to_string())),
            skills: vec!["Rust".to_string()],
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees");
        push_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM employees WHERE TRUE AND name ILIKE $1 AND role = $2 AND skills && $3"
        );
    }

    #[test]
    fn test_order_sql_shape() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM employees");
        push_filter(&mut qb, &EmployeeFilter::default());
        push_order(&mut qb, EmployeeSort::parse("-created_at").unwrap());
        assert_eq!(
            qb.sql(),
            "SELECT * FROM employees WHERE TRUE ORDER BY created_at DESC, id"
        );

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM employees");
        push_order(&mut qb, EmployeeSort::default());
        assert_eq!(qb.sql(), "SELECT * FROM employees ORDER BY created_at ASC, id");
    }
}
