use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::ResultId;
use crate::model::percentage::{Percentage, PercentageError};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// A graded attempt that violates the record contract.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptRecordError {
    #[error("invalid attempt record: total question count is zero")]
    NoQuestions,

    #[error("invalid attempt record: score {score} exceeds total {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("invalid attempt record: {0}")]
    Percentage(#[from] PercentageError),

    #[error("invalid attempt record: {answers} answer details for {total} questions")]
    TooManyAnswers { answers: usize, total: u32 },

    #[error("invalid attempt record: answer {position} points at option {index} of {options}")]
    AnswerIndexOutOfRange {
        position: usize,
        index: usize,
        options: usize,
    },

    #[error("invalid attempt record: {field} out of range ({value})")]
    FieldOutOfRange { field: &'static str, value: i64 },

    #[error("invalid attempt record: missing {0}")]
    Missing(&'static str),

    #[error("invalid attempt record: malformed payload: {0}")]
    Malformed(String),
}

//
// ─── ANSWER DETAIL ────────────────────────────────────────────────────────────
//

/// Review of one question inside a graded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerDetail {
    pub question: String,
    pub options: Vec<String>,
    pub selected_index: usize,
    pub selected_text: String,
    pub correct_index: usize,
    pub correct_text: String,
    pub is_correct: bool,
}

impl AnswerDetail {
    fn check(&self, position: usize) -> Result<(), AttemptRecordError> {
        if self.options.is_empty() {
            return Ok(());
        }
        for index in [self.selected_index, self.correct_index] {
            if index >= self.options.len() {
                return Err(AttemptRecordError::AnswerIndexOutOfRange {
                    position,
                    index,
                    options: self.options.len(),
                });
            }
        }
        Ok(())
    }
}

//
// ─── ATTEMPT RECORD ───────────────────────────────────────────────────────────
//

/// One completed and graded submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    result_id: ResultId,
    score: u32,
    total_questions: u32,
    percentage: Percentage,
    completed_at: DateTime<Utc>,
    answers: Vec<AnswerDetail>,
}

impl AttemptRecord {
    /// Validate and build a record.
    ///
    /// `percentage` is taken as reported; it is not recomputed from the score.
    ///
    /// # Errors
    ///
    /// Returns `AttemptRecordError` when the total is zero, the score exceeds the
    /// total, the percentage is outside `0..=100`, or answer details disagree with
    /// the question count or their own option lists.
    pub fn new(
        result_id: ResultId,
        score: u32,
        total_questions: u32,
        percentage: f64,
        completed_at: DateTime<Utc>,
        answers: Vec<AnswerDetail>,
    ) -> Result<Self, AttemptRecordError> {
        if total_questions == 0 {
            return Err(AttemptRecordError::NoQuestions);
        }
        if score > total_questions {
            return Err(AttemptRecordError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        let percentage = Percentage::new(percentage)?;
        let too_many = u32::try_from(answers.len()).map_or(true, |n| n > total_questions);
        if too_many {
            return Err(AttemptRecordError::TooManyAnswers {
                answers: answers.len(),
                total: total_questions,
            });
        }
        for (position, answer) in answers.iter().enumerate() {
            answer.check(position)?;
        }

        Ok(Self {
            result_id,
            score,
            total_questions,
            percentage,
            completed_at,
            answers,
        })
    }

    #[must_use]
    pub fn result_id(&self) -> &ResultId {
        &self.result_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerDetail] {
        &self.answers
    }

    /// Answer details the user got wrong.
    pub fn mistakes(&self) -> impl Iterator<Item = &AnswerDetail> {
        self.answers.iter().filter(|a| !a.is_correct)
    }
}

//
// ─── TEST PROGRESS ────────────────────────────────────────────────────────────
//

/// Attempt history for one test, in the order the backend returned it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestProgressSummary {
    pub test_title: String,
    pub attempts: Vec<AttemptRecord>,
}

impl TestProgressSummary {
    #[must_use]
    pub fn new(test_title: impl Into<String>, attempts: Vec<AttemptRecord>) -> Self {
        Self {
            test_title: test_title.into(),
            attempts,
        }
    }

    #[must_use]
    pub fn best_attempt(&self) -> Option<&AttemptRecord> {
        crate::aggregate::best_attempt(&self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn detail(selected: usize, correct: usize) -> AnswerDetail {
        AnswerDetail {
            question: "2 + 2?".into(),
            options: vec!["3".into(), "4".into()],
            selected_index: selected,
            selected_text: String::new(),
            correct_index: correct,
            correct_text: "4".into(),
            is_correct: selected == correct,
        }
    }

    #[test]
    fn valid_record_is_built() {
        let record = AttemptRecord::new(
            ResultId::new("r1"),
            1,
            2,
            50.0,
            fixed_now(),
            vec![detail(1, 1), detail(0, 1)],
        )
        .unwrap();
        assert_eq!(record.percentage().value(), 50.0);
        assert_eq!(record.mistakes().count(), 1);
    }

    #[test]
    fn zero_total_is_invalid() {
        let err =
            AttemptRecord::new(ResultId::new("r"), 0, 0, 0.0, fixed_now(), Vec::new()).unwrap_err();
        assert_eq!(err, AttemptRecordError::NoQuestions);
    }

    #[test]
    fn percentage_is_not_clamped() {
        let err = AttemptRecord::new(ResultId::new("r"), 3, 3, 101.0, fixed_now(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AttemptRecordError::Percentage(PercentageError::OutOfRange { .. })
        ));
        assert!(err.to_string().starts_with("invalid attempt record"));
    }

    #[test]
    fn score_above_total_is_invalid() {
        let err = AttemptRecord::new(ResultId::new("r"), 4, 3, 100.0, fixed_now(), Vec::new())
            .unwrap_err();
        assert_eq!(
            err,
            AttemptRecordError::ScoreExceedsTotal { score: 4, total: 3 }
        );
    }

    #[test]
    fn answer_index_outside_options_is_invalid() {
        let err = AttemptRecord::new(
            ResultId::new("r"),
            0,
            1,
            0.0,
            fixed_now(),
            vec![detail(5, 1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AttemptRecordError::AnswerIndexOutOfRange {
                position: 0,
                index: 5,
                options: 2
            }
        );
    }

    #[test]
    fn more_answers_than_questions_is_invalid() {
        let err = AttemptRecord::new(
            ResultId::new("r"),
            1,
            1,
            100.0,
            fixed_now(),
            vec![detail(1, 1), detail(1, 1)],
        )
        .unwrap_err();
        assert!(matches!(err, AttemptRecordError::TooManyAnswers { answers: 2, total: 1 }));
    }
}
