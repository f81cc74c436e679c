pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::code_analysis::handlers as code_handlers;
use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate intake
        .route(
            "/api/v1/candidates",
            post(handlers::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(handlers::handle_get_candidate),
        )
        // Interview lifecycle
        .route(
            "/api/v1/interviews/start",
            post(handlers::handle_start_interview),
        )
        .route(
            "/api/v1/interviews/:id/answer",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/end",
            post(handlers::handle_end_interview),
        )
        .route(
            "/api/v1/interviews/:id",
            get(handlers::handle_get_interview),
        )
        // Code analysis
        .route(
            "/api/v1/code/analyze",
            post(code_handlers::handle_analyze_code),
        )
        .route(
            "/api/v1/code/optimize",
            post(code_handlers::handle_optimize_code),
        )
        .route(
            "/api/v1/code/explain",
            post(code_handlers::handle_explain_code),
        )
        .route(
            "/api/v1/code/security",
            post(code_handlers::handle_security_review),
        )
        .with_state(state)
}
