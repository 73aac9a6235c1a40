use std::sync::Arc;

use quiz_core::model::{AttemptRecord, ResultId, TestId};
use storage::repository::{ProgressRepository, SubmissionRepository, TestRepository};
use tracing::{info, warn};

use super::session::TestSession;
use super::state::LoadFailure;
use crate::Clock;
use crate::error::SessionError;

/// Opens test sessions and drives their submission against the backend.
#[derive(Clone)]
pub struct TestSessionService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl TestSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tests: Arc<dyn TestRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            tests,
            submissions,
            progress,
        }
    }

    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Fetch the test and return a session that is either answering or failed.
    ///
    /// Load failures are recorded in the session state rather than returned,
    /// so the caller always gets something to render.
    pub async fn open_session(&self, test_id: TestId) -> TestSession {
        let mut session = TestSession::new(test_id.clone());
        let outcome = self
            .tests
            .get_test(&test_id)
            .await
            .map_err(|err| LoadFailure::from(&err));

        match &outcome {
            Ok(test) => info!(%test_id, questions = test.len(), "test loaded"),
            Err(failure) => warn!(%test_id, %failure, "test could not be loaded"),
        }

        // A fresh session is always `Loading`.
        if let Err(err) = session.load(outcome, self.clock.now()) {
            warn!(%test_id, error = %err, "unexpected state while loading");
        }
        session
    }

    /// Submit the session's answers.
    ///
    /// Calling this again after a transport failure is the retry; the same
    /// answers are sent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteSubmission` if questions remain
    /// unanswered, `SessionError::SubmissionTransportFailure` if the backend
    /// call failed (the session moves to `SubmissionFailed`), or
    /// `SessionError::InvalidTransition` from a state that cannot submit.
    pub async fn submit(&self, session: &mut TestSession) -> Result<ResultId, SessionError> {
        let payload = session.begin_submit()?;
        let test_id = payload.test_id().clone();

        match self.submissions.submit_test(&payload).await {
            Ok(result_id) => {
                session.complete(result_id.clone(), self.clock.now())?;
                info!(%test_id, %result_id, "test submitted");
                Ok(result_id)
            }
            Err(err) => {
                warn!(%test_id, error = %err, "submission failed");
                session.fail_submission(err.to_string())?;
                Err(SessionError::SubmissionTransportFailure(err))
            }
        }
    }

    /// The graded attempt behind a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the result is missing, unreachable or
    /// fails validation.
    pub async fn result(&self, result_id: &ResultId) -> Result<AttemptRecord, SessionError> {
        Ok(self.progress.get_result(result_id).await?)
    }
}
