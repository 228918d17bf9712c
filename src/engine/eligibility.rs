// src/engine/eligibility.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::{error::AppError, models::definition::AssessmentDefinition};

/// Why a user may not start a new attempt right now.
///
/// Serialized as a snake_case reason code in the error response so clients
/// can branch without parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    NotActive,
    NotYetOpen,
    Expired,
    AttemptsExhausted,
    InsufficientQuestions,
}

impl IneligibilityReason {
    pub fn code(&self) -> &'static str {
        match self {
            IneligibilityReason::NotActive => "not_active",
            IneligibilityReason::NotYetOpen => "not_yet_open",
            IneligibilityReason::Expired => "expired",
            IneligibilityReason::AttemptsExhausted => "attempts_exhausted",
            IneligibilityReason::InsufficientQuestions => "insufficient_questions",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            IneligibilityReason::NotActive => "This assessment is not currently active",
            IneligibilityReason::NotYetOpen => "This assessment is not open yet",
            IneligibilityReason::Expired => "This assessment is no longer available",
            IneligibilityReason::AttemptsExhausted => {
                "The maximum number of attempts has been reached"
            }
            IneligibilityReason::InsufficientQuestions => {
                "Not enough questions are available for this assessment"
            }
        }
    }
}

/// Availability checks (active flag and availability window), in order.
///
/// These apply to resuming an existing attempt as well as starting a new
/// one; the attempt-count and pool-size checks below only gate creation.
pub fn check_availability(
    definition: &AssessmentDefinition,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if !definition.is_active {
        return Err(AppError::Ineligible(IneligibilityReason::NotActive));
    }

    if let Some(from) = definition.available_from {
        if now < from {
            return Err(AppError::Ineligible(IneligibilityReason::NotYetOpen));
        }
    }

    if let Some(until) = definition.available_until {
        if now > until {
            return Err(AppError::Ineligible(IneligibilityReason::Expired));
        }
    }

    Ok(())
}

/// Counts this user's completed attempts against the definition. Incomplete
/// attempts do not consume a slot.
pub async fn count_completed_attempts(
    conn: &mut SqliteConnection,
    user_id: i64,
    definition_id: i64,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attempts
        WHERE user_id = ? AND definition_id = ? AND completed_at IS NOT NULL
        "#,
    )
    .bind(user_id)
    .bind(definition_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Size of the definition's question source: the whole category when pool
/// mode is on, otherwise the questions explicitly attached to it.
pub async fn count_eligible_questions(
    conn: &mut SqliteConnection,
    definition: &AssessmentDefinition,
) -> Result<i64, AppError> {
    let count = if definition.use_random_pool {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE category_id = ?")
            .bind(definition.category_id)
            .fetch_one(&mut *conn)
            .await?
    } else {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE assessment_id = ?")
            .bind(definition.id)
            .fetch_one(&mut *conn)
            .await?
    };

    Ok(count)
}

/// Full ordered eligibility check for starting a brand-new attempt.
/// Short-circuits on the first failing rule.
///
/// Passing here reserves nothing: the caller must run this inside the same
/// transaction as the attempt insert so the count in rule 4 cannot go stale
/// between check and write.
pub async fn check_eligibility(
    conn: &mut SqliteConnection,
    definition: &AssessmentDefinition,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    check_availability(definition, now)?;

    let completed = count_completed_attempts(conn, user_id, definition.id).await?;
    if completed >= definition.max_attempts {
        return Err(AppError::Ineligible(IneligibilityReason::AttemptsExhausted));
    }

    let available = count_eligible_questions(conn, definition).await?;
    if available < definition.questions_per_attempt {
        return Err(AppError::Ineligible(
            IneligibilityReason::InsufficientQuestions,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn definition() -> AssessmentDefinition {
        AssessmentDefinition {
            id: 1,
            title: "Safety exam".to_string(),
            category_id: 7,
            questions_per_attempt: 5,
            use_random_pool: true,
            passing_percentage: Some(70),
            time_limit_minutes: None,
            max_attempts: 2,
            available_from: None,
            available_until: None,
            is_active: true,
            created_at: None,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn availability_passes_without_window() {
        assert!(check_availability(&definition(), at(12)).is_ok());
    }

    #[test]
    fn inactive_definition_rejected_first() {
        let mut def = definition();
        def.is_active = false;
        // Even with a violated window, the active flag wins.
        def.available_from = Some(at(18));

        match check_availability(&def, at(12)) {
            Err(AppError::Ineligible(IneligibilityReason::NotActive)) => {}
            other => panic!("expected NotActive, got {:?}", other),
        }
    }

    #[test]
    fn window_not_yet_open() {
        let mut def = definition();
        def.available_from = Some(at(18));

        match check_availability(&def, at(12)) {
            Err(AppError::Ineligible(IneligibilityReason::NotYetOpen)) => {}
            other => panic!("expected NotYetOpen, got {:?}", other),
        }
    }

    #[test]
    fn window_expired() {
        let mut def = definition();
        def.available_until = Some(at(10));

        match check_availability(&def, at(12)) {
            Err(AppError::Ineligible(IneligibilityReason::Expired)) => {}
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let mut def = definition();
        def.available_from = Some(at(12));
        def.available_until = Some(at(12));

        assert!(check_availability(&def, at(12)).is_ok());
    }
}
