// src/engine/result.rs

/// The evaluated outcome of a finalized attempt, persisted atomically with
/// the `Created -> Completed` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,

    /// Present only when the definition carries a pass threshold (exams).
    pub passed: Option<bool>,

    pub time_taken_seconds: i64,
}

/// Rounds to one decimal place. Both the reported percentage and the pass
/// comparison use the rounded value, so a result can never sit on the other
/// side of the threshold from the number the user sees.
pub fn round_percentage(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Turns a raw score into the completion record.
pub fn evaluate(
    score: i64,
    total_questions: i64,
    passing_percentage: Option<i64>,
    elapsed_seconds: i64,
) -> AttemptOutcome {
    let percentage = if total_questions > 0 {
        round_percentage(score as f64 / total_questions as f64 * 100.0)
    } else {
        0.0
    };

    let passed = passing_percentage.map(|threshold| percentage >= threshold as f64);

    AttemptOutcome {
        score,
        total_questions,
        percentage,
        passed,
        time_taken_seconds: elapsed_seconds.max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_above_threshold_passes() {
        // 3 of 4 correct at a 70% threshold.
        let outcome = evaluate(3, 4, Some(70), 120);
        assert_eq!(outcome.percentage, 75.0);
        assert_eq!(outcome.passed, Some(true));
        assert_eq!(outcome.time_taken_seconds, 120);
    }

    #[test]
    fn exam_below_threshold_fails() {
        let outcome = evaluate(2, 4, Some(70), 30);
        assert_eq!(outcome.percentage, 50.0);
        assert_eq!(outcome.passed, Some(false));
    }

    #[test]
    fn quiz_reports_no_verdict() {
        let outcome = evaluate(4, 5, None, 60);
        assert_eq!(outcome.percentage, 80.0);
        assert_eq!(outcome.passed, None);
    }

    #[test]
    fn open_question_denominator_caps_percentage() {
        // 5 questions, one open-ended: a perfect auto-graded score is 4.
        let outcome = evaluate(4, 5, Some(70), 0);
        assert_eq!(outcome.percentage, 80.0);
        assert_eq!(outcome.passed, Some(true));
    }

    #[test]
    fn rounding_happens_before_the_threshold_compare() {
        // 2/3 = 66.666..% rounds to 66.7, and the rounded value is what
        // faces the threshold.
        let outcome = evaluate(2, 3, Some(66), 0);
        assert_eq!(outcome.percentage, 66.7);
        assert_eq!(outcome.passed, Some(true));

        let outcome = evaluate(2, 3, Some(67), 0);
        assert_eq!(outcome.passed, Some(false));
    }

    #[test]
    fn empty_denominator_scores_zero() {
        let outcome = evaluate(0, 0, Some(50), 10);
        assert_eq!(outcome.percentage, 0.0);
        assert_eq!(outcome.passed, Some(false));
    }

    #[test]
    fn negative_elapsed_is_clamped() {
        let outcome = evaluate(1, 1, None, -30);
        assert_eq!(outcome.time_taken_seconds, 0);
    }
}
