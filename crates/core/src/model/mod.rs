mod analytics;
mod answer;
mod attempt;
mod ids;
mod percentage;
mod test_definition;

pub use ids::{ModuleId, ParseIdError, QuestionId, ResultId, TestId};
pub use percentage::{Percentage, PercentageError};

pub use analytics::{AnalyticsReport, LowScoreTest, ModuleOutline, OverallStats, TestRef, WeakTopic};
pub use answer::{AnswerError, AnswerSelection, SubmissionPayload, SubmittedAnswer};
pub use attempt::{AnswerDetail, AttemptRecord, AttemptRecordError, TestProgressSummary};
pub use test_definition::{MIN_OPTIONS, Question, TestDefinition, TestDefinitionError};
