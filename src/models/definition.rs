// src/models/definition.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'assessment_definitions' table in the database.
///
/// One row configures a quiz or an exam. The two differ only through the
/// optional policy fields: an exam carries `passing_percentage` (and usually
/// `max_attempts` / availability windows), a quiz leaves them unset. The
/// engine treats definitions as read-only reference data.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssessmentDefinition {
    pub id: i64,
    pub title: String,
    pub category_id: i64,

    /// How many questions a new attempt snapshot contains.
    pub questions_per_attempt: i64,

    /// When true, sample from every question in the category; when false,
    /// sample from the questions attached to this definition only.
    pub use_random_pool: bool,

    /// Pass threshold in percent. Present for exams; quizzes report a score
    /// with no verdict.
    pub passing_percentage: Option<i64>,

    pub time_limit_minutes: Option<i64>,
    pub max_attempts: i64,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl AssessmentDefinition {
    /// An exam is a definition with a pass threshold.
    pub fn is_exam(&self) -> bool {
        self.passing_percentage.is_some()
    }
}

/// DTO for listing definitions to clients (policy fields only, no internals).
#[derive(Debug, Serialize)]
pub struct PublicDefinition {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub kind: &'static str,
    pub questions_per_attempt: i64,
    pub time_limit_minutes: Option<i64>,
    pub max_attempts: i64,
    pub available_from: Option<DateTime<Utc>>,
    pub available_until: Option<DateTime<Utc>>,
}

impl From<AssessmentDefinition> for PublicDefinition {
    fn from(d: AssessmentDefinition) -> Self {
        let kind = if d.is_exam() { "exam" } else { "quiz" };
        PublicDefinition {
            id: d.id,
            title: d.title,
            category_id: d.category_id,
            kind,
            questions_per_attempt: d.questions_per_attempt,
            time_limit_minutes: d.time_limit_minutes,
            max_attempts: d.max_attempts,
            available_from: d.available_from,
            available_until: d.available_until,
        }
    }
}
