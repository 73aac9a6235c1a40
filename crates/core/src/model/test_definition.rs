use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestDefinitionError {
    #[error("test has no questions")]
    NoQuestions,

    #[error("question {question_id} has {count} option(s), at least {MIN_OPTIONS} required")]
    TooFewOptions { question_id: QuestionId, count: usize },

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

/// A single multiple-choice question as shown while answering.
///
/// Carries no correct-answer information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
}

impl Question {
    /// # Errors
    ///
    /// Returns `TestDefinitionError::TooFewOptions` with fewer than two options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self, TestDefinitionError> {
        if options.len() < MIN_OPTIONS {
            return Err(TestDefinitionError::TooFewOptions {
                question_id: id,
                count: options.len(),
            });
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            options,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

/// Read-only copy of a test, held for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDefinition {
    id: TestId,
    title: String,
    questions: Vec<Question>,
}

impl TestDefinition {
    /// Build a test definition.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError::NoQuestions` for an empty question list and
    /// `TestDefinitionError::DuplicateQuestion` when two questions share an id.
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, TestDefinitionError> {
        if questions.is_empty() {
            return Err(TestDefinitionError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(TestDefinitionError::DuplicateQuestion(question.id().clone()));
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: a definition without questions cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn position(&self, id: &QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }
}
