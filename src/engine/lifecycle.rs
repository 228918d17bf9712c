// src/engine/lifecycle.rs
//
// The attempt lifecycle manager: `Created -> Completed`, nothing else. An
// abandoned incomplete attempt is never cancelled, only superseded the next
// time its owner starts over. Both entry points run as a single transaction
// against the store, which is what makes them idempotent under racing
// requests (double-click submit, a resume overlapping a submit from a stale
// tab).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, types::Json};

use crate::{
    engine::{
        eligibility,
        events::PassEvent,
        grading,
        result::{self, AttemptOutcome},
        selector, time_budget,
    },
    error::AppError,
    models::{
        attempt::{Attempt, AnswerRecord, AttemptResult, StartAttemptResponse, SubmitAttemptRequest},
        definition::AssessmentDefinition,
        question::{PublicQuestion, QuestionRecord},
    },
};

/// Starts a new attempt for `(user, definition)`, or resumes the existing
/// incomplete one.
///
/// Resume is the default: if an incomplete attempt exists it is returned
/// unchanged, with its original snapshot re-fetched for display. With
/// `force_restart` the stale attempt is discarded inside this same
/// transaction before a fresh snapshot is drawn. Availability rules apply
/// to both paths; the attempt-count and pool-size rules only gate creation
/// and are re-checked here, atomically with the insert.
pub async fn start_or_resume(
    pool: &SqlitePool,
    definition_id: i64,
    user_id: i64,
    force_restart: bool,
    now: DateTime<Utc>,
) -> Result<StartAttemptResponse, AppError> {
    let mut tx = pool.begin().await?;

    let definition = fetch_definition(&mut tx, definition_id).await?;
    eligibility::check_availability(&definition, now)?;

    if let Some(active) = find_active_attempt(&mut tx, user_id, definition_id).await? {
        if !force_restart {
            let questions = fetch_questions_by_ids(&mut tx, &active.selected_question_ids.0).await?;
            tx.commit().await?;

            return Ok(resume_response(&definition, active, questions, now));
        }

        discard_attempt(&mut tx, active.id).await?;
    }

    eligibility::check_eligibility(&mut tx, &definition, user_id, now).await?;

    let selected_ids = selector::select_questions(&mut tx, &definition).await?;
    let total_questions = selected_ids.len() as i64;

    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO attempts
            (definition_id, user_id, selected_question_ids, total_questions, started_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(definition.id)
    .bind(user_id)
    .bind(Json(&selected_ids))
    .bind(total_questions)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    let attempt_id = match inserted {
        Ok(attempt_id) => attempt_id,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // Two starts raced past the active-attempt lookup and the
            // partial unique index let only one row in. Converge on the
            // winner's attempt instead of failing.
            drop(tx);
            return resume_raced_attempt(pool, &definition, user_id, now).await;
        }
        Err(e) => {
            tracing::error!("Failed to insert attempt: {:?}", e);
            return Err(AppError::InternalServerError(e.to_string()));
        }
    };

    let questions = fetch_questions_by_ids(&mut tx, &selected_ids).await?;
    tx.commit().await?;

    tracing::info!(
        attempt_id,
        definition_id,
        user_id,
        total_questions,
        "attempt started"
    );

    let budget = time_budget::remaining(now, definition.time_limit_minutes, now);

    Ok(StartAttemptResponse {
        attempt_id,
        resumed: false,
        total_questions,
        time_limit_minutes: definition.time_limit_minutes,
        remaining_seconds: budget.remaining_seconds(),
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    })
}

/// Grades and finalizes an attempt in one atomic write.
///
/// Idempotent: submitting an already-completed attempt returns the stored
/// result without re-grading. Returns the pass event to publish (after the
/// caller is past this function, the completion is durable) when this call
/// performed the transition and the verdict is a pass.
pub async fn submit_attempt(
    pool: &SqlitePool,
    grace_minutes: Option<i64>,
    attempt_id: i64,
    req: &SubmitAttemptRequest,
    now: DateTime<Utc>,
) -> Result<(AttemptResult, Option<PassEvent>), AppError> {
    let mut tx = pool.begin().await?;

    let Some(attempt) = fetch_attempt(&mut tx, attempt_id).await? else {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    };

    if attempt.is_completed() {
        return Ok((stored_result(&attempt), None));
    }

    let definition = fetch_definition(&mut tx, attempt.definition_id).await?;

    // Late submissions are accepted and graded with the true elapsed time
    // recorded; only an explicitly configured grace window can close the
    // door entirely.
    if time_budget::past_grace_window(
        attempt.started_at,
        definition.time_limit_minutes,
        grace_minutes,
        now,
    ) {
        return Err(AppError::Conflict(
            "The submission window for this attempt has closed".to_string(),
        ));
    }

    let snapshot_ids = &attempt.selected_question_ids.0;
    let questions = fetch_questions_by_ids(&mut tx, snapshot_ids).await?;

    if questions.len() < snapshot_ids.len() {
        // A snapshot question was deleted mid-attempt. Grade what is left
        // and drop the rest from the denominator.
        let found: HashSet<i64> = questions.iter().map(|q| q.id).collect();
        for id in snapshot_ids.iter().copied().filter(|id| !found.contains(id)) {
            tracing::warn!(
                attempt_id,
                question_id = id,
                "snapshot question missing at grading time"
            );
        }
    }

    let graded = grading::grade_answers(&questions, &req.answers);
    let score = grading::tally_score(&graded);
    let elapsed = time_budget::elapsed_seconds(req.client_started_at, attempt.started_at, now);
    let outcome = result::evaluate(
        score,
        questions.len() as i64,
        definition.passing_percentage,
        elapsed,
    );

    // The compare-and-swap runs first: winning the `Created -> Completed`
    // transition is what entitles this transaction to write answer rows at
    // all. A losing concurrent submit surfaces here either as zero rows
    // affected or as a write conflict; both mean someone else finalized.
    let won = match finalize_attempt(&mut tx, attempt.id, &outcome, now).await {
        Ok(won) => won,
        Err(sqlx::Error::Database(db_err)) => {
            tracing::warn!(
                attempt_id,
                "finalize lost a write conflict: {}",
                db_err.message()
            );
            false
        }
        Err(e) => return Err(e.into()),
    };

    if !won {
        // A concurrent submit completed this attempt first. Drop our
        // grading pass and return the stored result.
        drop(tx);
        let result = load_result(pool, attempt_id).await?;
        return Ok((result, None));
    }

    for answer in &graded {
        sqlx::query(
            r#"
            INSERT INTO answers (attempt_id, question_id, submitted_value, is_correct)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id)
        .bind(answer.question_id)
        .bind(&answer.submitted_value)
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        attempt_id,
        score = outcome.score,
        percentage = outcome.percentage,
        passed = ?outcome.passed,
        "attempt completed"
    );

    let event = (outcome.passed == Some(true)).then(|| PassEvent {
        user_id: attempt.user_id,
        category_id: definition.category_id,
        definition_id: definition.id,
        attempt_id: attempt.id,
    });

    let result = AttemptResult {
        attempt_id: attempt.id,
        score: outcome.score,
        total_questions: outcome.total_questions,
        percentage: outcome.percentage,
        passed: outcome.passed,
        time_taken_seconds: outcome.time_taken_seconds,
    };

    Ok((result, event))
}

/// Loads the persisted answer records of an attempt, for post-completion
/// review (including the open-ended answers awaiting manual grading).
pub async fn load_answers(
    pool: &SqlitePool,
    attempt_id: i64,
) -> Result<Vec<AnswerRecord>, AppError> {
    let mut conn = pool.acquire().await?;

    let answers = sqlx::query_as::<_, AnswerRecord>(
        r#"
        SELECT id, attempt_id, question_id, submitted_value, is_correct
        FROM answers
        WHERE attempt_id = ?
        ORDER BY question_id
        "#,
    )
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(answers)
}

/// Looks up the stored result of a completed attempt.
pub async fn load_result(pool: &SqlitePool, attempt_id: i64) -> Result<AttemptResult, AppError> {
    let mut conn = pool.acquire().await?;

    let Some(attempt) = fetch_attempt(&mut conn, attempt_id).await? else {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    };

    if !attempt.is_completed() {
        return Err(AppError::Conflict(
            "Attempt has not been completed yet".to_string(),
        ));
    }

    Ok(stored_result(&attempt))
}

/// Builds the start response for an attempt that already existed.
fn resume_response(
    definition: &AssessmentDefinition,
    attempt: Attempt,
    questions: Vec<QuestionRecord>,
    now: DateTime<Utc>,
) -> StartAttemptResponse {
    let budget = time_budget::remaining(attempt.started_at, definition.time_limit_minutes, now);

    StartAttemptResponse {
        attempt_id: attempt.id,
        resumed: true,
        total_questions: attempt.total_questions,
        time_limit_minutes: definition.time_limit_minutes,
        remaining_seconds: budget.remaining_seconds(),
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    }
}

/// Recovery path for a start that lost the creation race: the unique index
/// rejected our insert, so the winner's row exists. Return it as a resume.
async fn resume_raced_attempt(
    pool: &SqlitePool,
    definition: &AssessmentDefinition,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<StartAttemptResponse, AppError> {
    let mut conn = pool.acquire().await?;

    let Some(active) = find_active_attempt(&mut conn, user_id, definition.id).await? else {
        // The winner finished (or discarded) its attempt in the meantime;
        // the caller can simply retry.
        return Err(AppError::Conflict(
            "Attempt creation conflicted with another request, please retry".to_string(),
        ));
    };

    let questions = fetch_questions_by_ids(&mut conn, &active.selected_question_ids.0).await?;

    Ok(resume_response(definition, active, questions, now))
}

/// The `Created -> Completed` compare-and-swap. Returns false when the
/// attempt was already completed (or discarded) by another request; the
/// guard is what fences a stray cleanup or duplicate submit away from a
/// finalization that already won.
async fn finalize_attempt(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    outcome: &AttemptOutcome,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        r#"
        UPDATE attempts
        SET completed_at = ?, score = ?, passed = ?, time_taken_seconds = ?, total_questions = ?
        WHERE id = ? AND completed_at IS NULL
        "#,
    )
    .bind(now)
    .bind(outcome.score)
    .bind(outcome.passed)
    .bind(outcome.time_taken_seconds)
    .bind(outcome.total_questions)
    .bind(attempt_id)
    .execute(&mut *conn)
    .await?;

    Ok(res.rows_affected() == 1)
}

/// Discards an incomplete attempt so a fresh one can replace it. The
/// `completed_at IS NULL` guard means a submit that already finalized this
/// attempt can no longer lose work to the cleanup.
async fn discard_attempt(conn: &mut SqliteConnection, attempt_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM answers WHERE attempt_id = ?")
        .bind(attempt_id)
        .execute(&mut *conn)
        .await?;

    let res = sqlx::query("DELETE FROM attempts WHERE id = ? AND completed_at IS NULL")
        .bind(attempt_id)
        .execute(&mut *conn)
        .await?;

    if res.rows_affected() == 0 {
        tracing::warn!(attempt_id, "skipped discarding attempt: already completed");
    }

    Ok(())
}

async fn fetch_definition(
    conn: &mut SqliteConnection,
    definition_id: i64,
) -> Result<AssessmentDefinition, AppError> {
    let definition = sqlx::query_as::<_, AssessmentDefinition>(
        r#"
        SELECT
            id, title, category_id, questions_per_attempt, use_random_pool,
            passing_percentage, time_limit_minutes, max_attempts,
            available_from, available_until, is_active, created_at
        FROM assessment_definitions
        WHERE id = ?
        "#,
    )
    .bind(definition_id)
    .fetch_optional(&mut *conn)
    .await?;

    definition.ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))
}

async fn fetch_attempt(
    conn: &mut SqliteConnection,
    attempt_id: i64,
) -> Result<Option<Attempt>, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT
            id, definition_id, user_id, selected_question_ids, total_questions,
            started_at, completed_at, score, passed, time_taken_seconds
        FROM attempts
        WHERE id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(attempt)
}

/// The single source of truth for resumption: at most one incomplete
/// attempt can exist per (user, definition), independent of any client
/// session state.
async fn find_active_attempt(
    conn: &mut SqliteConnection,
    user_id: i64,
    definition_id: i64,
) -> Result<Option<Attempt>, AppError> {
    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT
            id, definition_id, user_id, selected_question_ids, total_questions,
            started_at, completed_at, score, passed, time_taken_seconds
        FROM attempts
        WHERE user_id = ? AND definition_id = ? AND completed_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(definition_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(attempt)
}

/// Fetches the snapshot questions, in a fresh random order each time.
/// Grading matches by question id, so presentation order never matters.
async fn fetch_questions_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<Vec<QuestionRecord>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // Dynamic IN clause via QueryBuilder
    let mut query_builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT
            id, category_id, assessment_id, question_type, content,
            options, correct_option, explanation, created_at
        FROM questions WHERE id IN (
        "#,
    );

    let mut separated = query_builder.separated(",");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY RANDOM()");

    let questions: Vec<QuestionRecord> = query_builder
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch snapshot questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(questions)
}

fn stored_result(attempt: &Attempt) -> AttemptResult {
    let score = attempt.score.unwrap_or(0);
    let total = attempt.total_questions;
    let percentage = if total > 0 {
        result::round_percentage(score as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    AttemptResult {
        attempt_id: attempt.id,
        score,
        total_questions: total,
        percentage,
        passed: attempt.passed,
        time_taken_seconds: attempt.time_taken_seconds.unwrap_or(0),
    }
}
