pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::allocations::handlers as allocations;
use crate::employees::handlers as employees;
use crate::matching::handlers as matching;
use crate::projects::handlers as projects;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(health::health_handler))
        // Employees
        .route(
            "/employees",
            post(employees::handle_create_employee).get(employees::handle_list_employees),
        )
        .route(
            "/employees/:id",
            get(employees::handle_get_employee)
                .patch(employees::handle_update_employee)
                .put(employees::handle_update_employee)
                .delete(employees::handle_delete_employee),
        )
        // Projects
        .route(
            "/projects",
            post(projects::handle_create_project).get(projects::handle_list_projects),
        )
        .route("/projects/:id", get(projects::handle_get_project))
        // HR allocation
        .route(
            "/hr_allocation",
            get(allocations::handle_list_allocations).post(allocations::handle_create_allocation),
        )
        .route("/hr_allocation/:id", delete(allocations::handle_delete_allocation))
        // Matching
        .route("/match", get(matching::handle_match))
        // Resume ingestion
        .route(
            "/resume/upload",
            post(resume::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}
