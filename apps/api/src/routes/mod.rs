pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Jobs
        .route("/api/jobs", get(jobs::handle_list_jobs))
        .route("/api/jobs", post(jobs::handle_create_job))
        .route("/api/jobs/featured", get(jobs::handle_featured_jobs))
        .route("/api/jobs/employer/my-jobs", get(jobs::handle_my_jobs))
        .route("/api/jobs/:id", get(jobs::handle_get_job))
        .route("/api/jobs/:id", put(jobs::handle_update_job))
        .route("/api/jobs/:id", delete(jobs::handle_delete_job))
        .route(
            "/api/jobs/:id/toggle-status",
            patch(jobs::handle_toggle_status),
        )
        // Applications
        .route("/api/applications", post(applications::handle_submit))
        .route(
            "/api/applications/my-applications",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/applications/employer/applications",
            get(applications::handle_employer_applications),
        )
        .route(
            "/api/applications/employer/stats",
            get(applications::handle_employer_stats),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/api/applications/:id/notes",
            post(applications::handle_add_notes),
        )
        .route(
            "/api/applications/:id",
            delete(applications::handle_withdraw),
        )
        // Users
        .route("/api/users/profile", get(users::handle_get_profile))
        .route("/api/users/profile", put(users::handle_update_profile))
        .route("/api/users/resume", post(users::handle_upload_resume))
        .route("/api/users/stats", get(users::handle_stats))
        .route(
            "/api/users/search-candidates",
            get(users::handle_search_candidates),
        )
        .route("/api/users/candidate/:id", get(users::handle_get_candidate))
        .with_state(state)
}
