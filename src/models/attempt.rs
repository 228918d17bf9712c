// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'attempts' table in the database.
///
/// Lifecycle is `Created` (completed_at NULL) -> `Completed` (score, passed
/// and time_taken_seconds set in the same write as completed_at). Completed
/// rows are never mutated again.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub definition_id: i64,
    pub user_id: i64,

    /// The immutable question snapshot drawn at creation time. Grading
    /// matches answers by question id, so the stored order carries no
    /// meaning beyond reproducibility.
    pub selected_question_ids: Json<Vec<i64>>,

    pub total_questions: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<i64>,

    /// Set only for exams (definitions with a pass threshold).
    pub passed: Option<bool>,

    pub time_taken_seconds: Option<i64>,
}

impl Attempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Represents the 'answers' table in the database. One row per snapshot
/// question, written exactly once at finalization.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub submitted_value: String,

    /// NULL is the permanent value for open-ended answers: it marks
    /// "requires manual review", never "not graded yet".
    pub is_correct: Option<bool>,
}

/// DTO for starting (or resuming) an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(range(min = 1, message = "user_id must be a positive id"))]
    pub user_id: i64,

    /// Discard the caller's unfinished attempt (if any) and draw a fresh
    /// snapshot instead of resuming it.
    #[serde(default)]
    pub force_restart: bool,
}

/// DTO returned from start-or-resume: the attempt handle plus the snapshot
/// questions, shuffled for presentation and stripped of answer keys.
#[derive(Debug, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: i64,
    pub resumed: bool,
    pub total_questions: i64,
    pub time_limit_minutes: Option<i64>,

    /// Countdown seed for the client. Advisory only; the server accepts
    /// late submissions regardless (unless a grace window is configured).
    pub remaining_seconds: Option<i64>,

    pub questions: Vec<PublicQuestion>,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: selected option letter, or free text for open questions.
    pub answers: HashMap<i64, String>,

    /// Client-reported start instant, used for elapsed-time bookkeeping
    /// when present. Soft data only; never grounds a rejection.
    pub client_started_at: Option<DateTime<Utc>>,
}

/// DTO returned from submit (and from the result lookup endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    pub time_taken_seconds: i64,
}

/// DTO for reviewing a completed attempt: the stored result plus the
/// per-question answer records.
#[derive(Debug, Serialize)]
pub struct AttemptReview {
    #[serde(flatten)]
    pub result: AttemptResult,
    pub answers: Vec<AnswerRecord>,
}
