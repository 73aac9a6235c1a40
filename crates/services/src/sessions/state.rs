use std::fmt;

use quiz_core::model::{ResultId, TestDefinitionError};
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;

/// Why a test could not be opened. Terminal for the session.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum LoadFailure {
    #[error("test has no questions")]
    NoQuestions,
    #[error("test not found")]
    NotFound,
    #[error("test definition is malformed: {0}")]
    Invalid(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<&StorageError> for LoadFailure {
    fn from(err: &StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            StorageError::InvalidTest(TestDefinitionError::NoQuestions) => Self::NoQuestions,
            StorageError::InvalidTest(_)
            | StorageError::InvalidRecord(_)
            | StorageError::InvalidPercentage(_)
            | StorageError::Serialization(_) => Self::Invalid(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

/// Where a session is in its lifecycle.
///
/// ```text
/// Loading ──▶ Answering ──▶ Submitting ──▶ Completed
///    │            ▲              │
///    ▼            └── resume ──  ▼
///  Failed              SubmissionFailed ──retry──▶ Submitting
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Answering,
    Submitting,
    Completed { result_id: ResultId },
    SubmissionFailed { reason: String },
    Failed(LoadFailure),
}

impl SessionState {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Answering => SessionStatus::Answering,
            SessionState::Submitting => SessionStatus::Submitting,
            SessionState::Completed { .. } => SessionStatus::Completed,
            SessionState::SubmissionFailed { .. } => SessionStatus::SubmissionFailed,
            SessionState::Failed(_) => SessionStatus::Failed,
        }
    }
}

/// Data-free tag of a `SessionState`, for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionStatus {
    Loading,
    Answering,
    Submitting,
    Completed,
    SubmissionFailed,
    Failed,
}

impl SessionStatus {
    /// `Completed` and `Failed` accept no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Answering => "answering",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Completed => "completed",
            SessionStatus::SubmissionFailed => "submission-failed",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_load_failures() {
        assert_eq!(LoadFailure::from(&StorageError::NotFound), LoadFailure::NotFound);
        assert_eq!(
            LoadFailure::from(&StorageError::InvalidTest(TestDefinitionError::NoQuestions)),
            LoadFailure::NoQuestions
        );
        assert!(matches!(
            LoadFailure::from(&StorageError::Status(503)),
            LoadFailure::Unavailable(_)
        ));
        assert!(matches!(
            LoadFailure::from(&StorageError::Serialization("bad json".into())),
            LoadFailure::Invalid(_)
        ));
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::SubmissionFailed.is_terminal());
        assert!(!SessionStatus::Answering.is_terminal());
    }
}
