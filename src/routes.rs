// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, attempt},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the assessment and attempt sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, pass-event sink).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let assessment_routes = Router::new()
        .route("/", get(assessment::list_assessments))
        .route("/{id}/attempts", post(assessment::start_or_resume_attempt));

    let attempt_routes = Router::new()
        .route("/{id}", get(attempt::get_attempt_result))
        .route("/{id}/submit", post(attempt::submit_attempt));

    Router::new()
        .nest("/api/assessments", assessment_routes)
        .nest("/api/attempts", attempt_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
