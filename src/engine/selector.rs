// src/engine/selector.rs

use sqlx::SqliteConnection;

use crate::{
    engine::eligibility::IneligibilityReason, error::AppError,
    models::definition::AssessmentDefinition,
};

/// Draws the question snapshot for a new attempt.
///
/// Samples `questions_per_attempt` ids uniformly, without replacement, from
/// the definition's question source: the whole category in pool mode, the
/// explicitly attached set otherwise. The draw happens in SQL
/// (`ORDER BY RANDOM()`), so every call produces a fresh, unpredictable
/// selection. The caller persists the result as the attempt snapshot; this
/// function writes nothing.
pub async fn select_questions(
    conn: &mut SqliteConnection,
    definition: &AssessmentDefinition,
) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> = if definition.use_random_pool {
        sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE category_id = ?
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(definition.category_id)
        .bind(definition.questions_per_attempt)
        .fetch_all(&mut *conn)
        .await?
    } else {
        sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE assessment_id = ?
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(definition.id)
        .bind(definition.questions_per_attempt)
        .fetch_all(&mut *conn)
        .await?
    };

    if (ids.len() as i64) < definition.questions_per_attempt {
        tracing::warn!(
            definition_id = definition.id,
            requested = definition.questions_per_attempt,
            available = ids.len(),
            "question source too small for definition"
        );
        return Err(AppError::Ineligible(
            IneligibilityReason::InsufficientQuestions,
        ));
    }

    Ok(ids)
}
