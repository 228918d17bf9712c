// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Question kind. Drives grading, option storage and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionType {
    /// Up to four options labeled A-D; `correct_option` holds the letter.
    MultipleChoice,
    /// `correct_option` holds 'T' or 'F'.
    TrueFalse,
    /// Free text, graded manually later; `correct_option` is unused.
    OpenEnded,
}

/// Represents the 'questions' table in the database.
///
/// A question belongs to a category and optionally to one assessment
/// definition; `assessment_id = NULL` means it is only reachable through the
/// category-wide random pool.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub category_id: i64,
    pub assessment_id: Option<i64>,
    pub question_type: QuestionType,

    /// The text content of the question.
    pub content: String,

    /// Option texts, labeled positionally (index 0 = 'A', 1 = 'B', ...).
    /// Stored as a JSON array; NULL for non-multiple-choice questions.
    pub options: Option<Json<Vec<String>>>,

    /// The correct option letter, or NULL for open-ended questions.
    pub correct_option: Option<String>,

    /// Explanation shown after grading.
    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to the client (excludes the answer key and
/// explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Option<Json<Vec<String>>>,
}

impl From<QuestionRecord> for PublicQuestion {
    fn from(q: QuestionRecord) -> Self {
        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            content: q.content,
            options: q.options,
        }
    }
}
