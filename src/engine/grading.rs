// src/engine/grading.rs

use std::collections::HashMap;

use crate::models::question::{QuestionRecord, QuestionType};

/// One graded answer, ready to be persisted as an answer row.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub submitted_value: String,

    /// `Some(bool)` for auto-graded types. `None` for open-ended answers:
    /// they are stored verbatim and graded manually later.
    pub is_correct: Option<bool>,
}

/// Grades every question in the snapshot against the submitted answers.
///
/// A missing or blank submission is graded as incorrect, never treated as
/// an error. Open-ended questions always come back with `is_correct: None`.
pub fn grade_answers(
    questions: &[QuestionRecord],
    submitted: &HashMap<i64, String>,
) -> Vec<GradedAnswer> {
    questions
        .iter()
        .map(|question| {
            let submitted_value = submitted.get(&question.id).cloned().unwrap_or_default();
            let is_correct = grade_one(question, &submitted_value);
            GradedAnswer {
                question_id: question.id,
                submitted_value,
                is_correct,
            }
        })
        .collect()
}

/// Grades a single question. Strict string matching against the stored
/// option letter, per the snapshot state at finalization time.
fn grade_one(question: &QuestionRecord, submitted_value: &str) -> Option<bool> {
    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            let correct = question
                .correct_option
                .as_deref()
                .is_some_and(|correct| correct == submitted_value);
            Some(correct)
        }
        QuestionType::OpenEnded => None,
    }
}

/// Aggregate score: the count of answers graded correct. Open-ended answers
/// never contribute.
pub fn tally_score(graded: &[GradedAnswer]) -> i64 {
    graded
        .iter()
        .filter(|answer| answer.is_correct == Some(true))
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, question_type: QuestionType, correct: Option<&str>) -> QuestionRecord {
        QuestionRecord {
            id,
            category_id: 1,
            assessment_id: Some(1),
            question_type,
            content: format!("Question {}", id),
            options: None,
            correct_option: correct.map(str::to_string),
            explanation: None,
            created_at: None,
        }
    }

    #[test]
    fn grades_multiple_choice_strictly() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, Some("A")),
            question(2, QuestionType::MultipleChoice, Some("B")),
            question(3, QuestionType::MultipleChoice, Some("C")),
            question(4, QuestionType::MultipleChoice, Some("D")),
        ];
        let mut submitted = HashMap::new();
        submitted.insert(1, "A".to_string());
        submitted.insert(2, "B".to_string());
        submitted.insert(3, "X".to_string());
        submitted.insert(4, "D".to_string());

        let graded = grade_answers(&questions, &submitted);
        assert_eq!(tally_score(&graded), 3);
    }

    #[test]
    fn missing_submission_is_incorrect_not_an_error() {
        let questions = vec![question(1, QuestionType::TrueFalse, Some("T"))];
        let graded = grade_answers(&questions, &HashMap::new());

        assert_eq!(graded.len(), 1);
        assert_eq!(graded[0].is_correct, Some(false));
        assert_eq!(graded[0].submitted_value, "");
    }

    #[test]
    fn true_false_matches_letter() {
        let questions = vec![
            question(1, QuestionType::TrueFalse, Some("T")),
            question(2, QuestionType::TrueFalse, Some("F")),
        ];
        let mut submitted = HashMap::new();
        submitted.insert(1, "T".to_string());
        submitted.insert(2, "T".to_string());

        let graded = grade_answers(&questions, &submitted);
        assert_eq!(graded[0].is_correct, Some(true));
        assert_eq!(graded[1].is_correct, Some(false));
    }

    #[test]
    fn open_ended_is_never_auto_graded() {
        let questions = vec![question(1, QuestionType::OpenEnded, None)];
        let mut submitted = HashMap::new();
        submitted.insert(1, "Free text essay answer".to_string());

        let graded = grade_answers(&questions, &submitted);
        assert_eq!(graded[0].is_correct, None);
        assert_eq!(graded[0].submitted_value, "Free text essay answer");
        assert_eq!(tally_score(&graded), 0);
    }

    #[test]
    fn unknown_question_ids_in_submission_are_ignored() {
        let questions = vec![question(1, QuestionType::MultipleChoice, Some("A"))];
        let mut submitted = HashMap::new();
        submitted.insert(1, "A".to_string());
        submitted.insert(999, "A".to_string());

        let graded = grade_answers(&questions, &submitted);
        assert_eq!(graded.len(), 1);
        assert_eq!(tally_score(&graded), 1);
    }
}
