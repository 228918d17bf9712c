// src/handlers/assessment.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    engine::lifecycle,
    error::AppError,
    models::{
        attempt::StartAttemptRequest,
        definition::{AssessmentDefinition, PublicDefinition},
    },
};

/// Lists the currently active assessment definitions.
pub async fn list_assessments(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let definitions = sqlx::query_as::<_, AssessmentDefinition>(
        r#"
        SELECT
            id, title, category_id, questions_per_attempt, use_random_pool,
            passing_percentage, time_limit_minutes, max_attempts,
            available_from, available_until, is_active, created_at
        FROM assessment_definitions
        WHERE is_active = 1
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list assessments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let public: Vec<PublicDefinition> = definitions.into_iter().map(Into::into).collect();

    Ok(Json(public))
}

/// Starts a new attempt at an assessment, or resumes the caller's
/// unfinished one.
///
/// * Eligibility is re-validated inside the creation transaction.
/// * Returns the snapshot questions without answer keys, shuffled for
///   presentation.
pub async fn start_or_resume_attempt(
    State(pool): State<SqlitePool>,
    Path(definition_id): Path<i64>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let response = lifecycle::start_or_resume(
        &pool,
        definition_id,
        payload.user_id,
        payload.force_restart,
        chrono::Utc::now(),
    )
    .await?;

    Ok(Json(response))
}
