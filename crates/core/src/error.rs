use thiserror::Error;

use crate::model::{AnswerError, AttemptRecordError, PercentageError, TestDefinitionError};

/// Any validation failure raised by the domain layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Percentage(#[from] PercentageError),
    #[error(transparent)]
    TestDefinition(#[from] TestDefinitionError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    AttemptRecord(#[from] AttemptRecordError),
}
