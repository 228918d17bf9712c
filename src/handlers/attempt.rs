// src/handlers/attempt.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    engine::lifecycle,
    error::AppError,
    models::attempt::{AttemptReview, SubmitAttemptRequest},
    state::AppState,
};

/// Submits answers for an attempt and returns the graded result.
///
/// * Grading and the `Created -> Completed` transition are one atomic write.
/// * Idempotent: re-submitting a completed attempt returns the stored
///   result without re-grading.
/// * On a passing exam result, the pass event is handed to the configured
///   sink after the completion is durable, without blocking the response.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (result, pass_event) = lifecycle::submit_attempt(
        &state.pool,
        state.config.submission_grace_minutes,
        attempt_id,
        &payload,
        chrono::Utc::now(),
    )
    .await?;

    if let Some(event) = pass_event {
        let sink = state.pass_events.clone();
        tokio::spawn(async move {
            sink.publish(event).await;
        });
    }

    Ok(Json(result))
}

/// Returns the stored result of a completed attempt, together with its
/// answer records for review.
pub async fn get_attempt_result(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = lifecycle::load_result(&state.pool, attempt_id).await?;
    let answers = lifecycle::load_answers(&state.pool, attempt_id).await?;

    Ok(Json(AttemptReview { result, answers }))
}
