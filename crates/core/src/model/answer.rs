use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};
use crate::model::test_definition::TestDefinition;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),

    #[error("option {index} is out of range for question {question_id} ({options} options)")]
    OptionOutOfRange {
        question_id: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("{} question(s) unanswered", unanswered.len())]
    Incomplete { unanswered: Vec<QuestionId> },
}

/// Selected option per question for one in-progress attempt.
///
/// Every key is a question of the test the selection was validated against,
/// and every value is a valid option index for that question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSelection {
    selected: HashMap<QuestionId, usize>,
}

impl AnswerSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `question_id`, replacing any earlier choice.
    ///
    /// Returns `true` when the selection changed.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::UnknownQuestion` or `AnswerError::OptionOutOfRange`
    /// without touching the current selection.
    pub fn select(
        &mut self,
        test: &TestDefinition,
        question_id: &QuestionId,
        option: usize,
    ) -> Result<bool, AnswerError> {
        let question = test
            .question(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.clone()))?;
        if !question.has_option(option) {
            return Err(AnswerError::OptionOutOfRange {
                question_id: question_id.clone(),
                index: option,
                options: question.options().len(),
            });
        }
        let previous = self.selected.insert(question_id.clone(), option);
        Ok(previous != Some(option))
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<usize> {
        self.selected.get(question_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Questions of `test` without a selection, in test order.
    #[must_use]
    pub fn unanswered(&self, test: &TestDefinition) -> Vec<QuestionId> {
        test.questions()
            .iter()
            .filter(|q| !self.selected.contains_key(q.id()))
            .map(|q| q.id().clone())
            .collect()
    }

    /// True once every question of `test` has a selection.
    #[must_use]
    pub fn is_complete(&self, test: &TestDefinition) -> bool {
        test.questions()
            .iter()
            .all(|q| self.selected.contains_key(q.id()))
    }

    /// Build the submission for `test`.
    ///
    /// This is the only way to obtain a `SubmissionPayload`, so a payload always
    /// carries one entry per question.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Incomplete` listing the unanswered questions.
    pub fn to_payload(&self, test: &TestDefinition) -> Result<SubmissionPayload, AnswerError> {
        let unanswered = self.unanswered(test);
        if !unanswered.is_empty() {
            return Err(AnswerError::Incomplete { unanswered });
        }
        let answers = test
            .questions()
            .iter()
            .filter_map(|q| {
                self.get(q.id()).map(|selected_answer| SubmittedAnswer {
                    question_id: q.id().clone(),
                    selected_answer,
                })
            })
            .collect();
        Ok(SubmissionPayload {
            test_id: test.id().clone(),
            answers,
        })
    }
}

/// One answered question inside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_answer: usize,
}

/// A complete attempt ready for grading: one answer per question, in test order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    test_id: TestId,
    answers: Vec<SubmittedAnswer>,
}

impl SubmissionPayload {
    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn answers(&self) -> &[SubmittedAnswer] {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_definition::fixtures::test_with_questions;

    #[test]
    fn select_rejects_unknown_question_and_bad_index() {
        let test = test_with_questions(2);
        let mut selection = AnswerSelection::new();

        let err = selection
            .select(&test, &QuestionId::new("q9"), 0)
            .unwrap_err();
        assert_eq!(err, AnswerError::UnknownQuestion(QuestionId::new("q9")));

        let err = selection
            .select(&test, &QuestionId::new("q1"), 3)
            .unwrap_err();
        assert!(matches!(err, AnswerError::OptionOutOfRange { index: 3, options: 3, .. }));
        assert!(selection.is_empty());
    }

    #[test]
    fn reselecting_same_option_is_idempotent() {
        let test = test_with_questions(2);
        let q1 = QuestionId::new("q1");
        let mut selection = AnswerSelection::new();

        assert!(selection.select(&test, &q1, 1).unwrap());
        let after_first = selection.clone();
        assert!(!selection.select(&test, &q1, 1).unwrap());
        assert_eq!(selection, after_first);

        assert!(selection.select(&test, &q1, 2).unwrap());
        assert_eq!(selection.get(&q1), Some(2));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn incomplete_selection_lists_missing_in_order() {
        let test = test_with_questions(3);
        let mut selection = AnswerSelection::new();
        selection.select(&test, &QuestionId::new("q2"), 0).unwrap();

        let err = selection.to_payload(&test).unwrap_err();
        assert_eq!(
            err,
            AnswerError::Incomplete {
                unanswered: vec![QuestionId::new("q1"), QuestionId::new("q3")]
            }
        );
    }

    #[test]
    fn payload_follows_question_order() {
        let test = test_with_questions(3);
        let mut selection = AnswerSelection::new();
        selection.select(&test, &QuestionId::new("q3"), 1).unwrap();
        selection.select(&test, &QuestionId::new("q1"), 0).unwrap();
        selection.select(&test, &QuestionId::new("q2"), 2).unwrap();

        let payload = selection.to_payload(&test).unwrap();
        assert_eq!(payload.test_id(), &TestId::new("t1"));
        let order: Vec<_> = payload
            .answers()
            .iter()
            .map(|a| (a.question_id.as_str(), a.selected_answer))
            .collect();
        assert_eq!(order, vec![("q1", 0), ("q2", 2), ("q3", 1)]);
    }

    #[test]
    fn payload_serializes_camel_case() {
        let test = test_with_questions(1);
        let mut selection = AnswerSelection::new();
        selection.select(&test, &QuestionId::new("q1"), 2).unwrap();

        let json = serde_json::to_value(selection.to_payload(&test).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "testId": "t1",
                "answers": [{ "questionId": "q1", "selectedAnswer": 2 }]
            })
        );
    }
}
