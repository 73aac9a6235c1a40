//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AnswerError, AttemptRecordError, QuestionId};
use storage::{HttpInitError, StorageError};

use crate::sessions::SessionStatus;

/// Errors emitted by test sessions.
///
/// Load failures are not errors here: they put the session in `Failed`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{} question(s) still unanswered", unanswered.len())]
    IncompleteSubmission { unanswered: Vec<QuestionId> },

    #[error("submission failed: {0}")]
    SubmissionTransportFailure(#[source] StorageError),

    #[error("cannot {action} while the session is {status}")]
    InvalidTransition {
        status: SessionStatus,
        action: &'static str,
    },

    #[error("question index {index} is out of range for {len} question(s)")]
    CursorOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Answer(AnswerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AnswerError> for SessionError {
    fn from(err: AnswerError) -> Self {
        match err {
            AnswerError::Incomplete { unanswered } => Self::IncompleteSubmission { unanswered },
            other => Self::Answer(other),
        }
    }
}

/// Errors emitted by progress analytics when a single source is requested.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    InvalidAttemptRecord(#[from] AttemptRecordError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for AnalyticsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidRecord(record) => Self::InvalidAttemptRecord(record),
            other => Self::Storage(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Http(#[from] HttpInitError),
}
