use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::debug;

use quiz_core::model::{
    AnswerSelection, Question, QuestionId, ResultId, SubmissionPayload, TestDefinition, TestId,
};

use super::progress::SessionProgress;
use super::state::{LoadFailure, SessionState, SessionStatus};
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One in-progress attempt at a test.
///
/// Owns the loaded definition, the answer selection, the question cursor and
/// the timing of the attempt. It performs no I/O: callers feed it the outcome
/// of loading and submitting (see `TestSessionService`).
///
/// Answers are only cleared by a successful submit; a failed submit keeps them
/// so the attempt can be retried.
pub struct TestSession {
    test_id: TestId,
    test: Option<TestDefinition>,
    state: SessionState,
    answers: AnswerSelection,
    cursor: usize,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TestSession {
    /// A session waiting for its test definition.
    #[must_use]
    pub fn new(test_id: TestId) -> Self {
        Self {
            test_id,
            test: None,
            state: SessionState::Loading,
            answers: AnswerSelection::new(),
            cursor: 0,
            started_at: None,
            finished_at: None,
        }
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn test(&self) -> Option<&TestDefinition> {
        self.test.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSelection {
        &self.answers
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn result_id(&self) -> Option<&ResultId> {
        match &self.state {
            SessionState::Completed { result_id } => Some(result_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status() == SessionStatus::Completed
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.test.as_ref()?.question_at(self.cursor)
    }

    /// Option chosen for the question under the cursor, if any.
    #[must_use]
    pub fn current_selection(&self) -> Option<usize> {
        self.current_question()
            .and_then(|question| self.answers.get(question.id()))
    }

    /// Unanswered questions in test order; empty before loading.
    #[must_use]
    pub fn unanswered(&self) -> Vec<QuestionId> {
        self.test
            .as_ref()
            .map(|test| self.answers.unanswered(test))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.test.as_ref().map_or(0, TestDefinition::len);
        let answered = self.answers.len();
        SessionProgress {
            total,
            answered,
            unanswered: total.saturating_sub(answered),
            cursor: self.cursor,
            is_complete: self.is_complete(),
        }
    }

    /// Time spent on the attempt: running while answering, frozen once completed.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::zero();
        };
        let end = self.finished_at.unwrap_or(now);
        (end - started_at).max(Duration::zero())
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    fn require(&self, allowed: &[SessionStatus], action: &'static str) -> Result<(), SessionError> {
        let status = self.status();
        if allowed.contains(&status) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { status, action })
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            test_id = %self.test_id,
            from = %self.status(),
            to = %next.status(),
            "session transition"
        );
        self.state = next;
    }

    /// Apply the outcome of fetching the test definition.
    ///
    /// A definition moves the session to `Answering` and starts the clock; a
    /// failure moves it to the terminal `Failed` state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is `Loading`.
    pub fn load(
        &mut self,
        outcome: Result<TestDefinition, LoadFailure>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.require(&[SessionStatus::Loading], "load the test")?;
        match outcome {
            Ok(test) if test.is_empty() => self.transition(SessionState::Failed(LoadFailure::NoQuestions)),
            Ok(test) => {
                self.test = Some(test);
                self.cursor = 0;
                self.started_at = Some(now);
                self.transition(SessionState::Answering);
            }
            Err(failure) => self.transition(SessionState::Failed(failure)),
        }
        Ok(())
    }

    /// Choose `option` for `question_id`, replacing any earlier choice.
    ///
    /// Returns `true` when the selection changed; reselecting the same option
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answering`, or
    /// `SessionError::Answer` for an unknown question or option.
    pub fn select_answer(
        &mut self,
        question_id: &QuestionId,
        option: usize,
    ) -> Result<bool, SessionError> {
        self.require(&[SessionStatus::Answering], "select an answer")?;
        let test = self.test.as_ref().ok_or(SessionError::InvalidTransition {
            status: SessionStatus::Loading,
            action: "select an answer",
        })?;
        Ok(self.answers.select(test, question_id, option)?)
    }

    /// Choose `option` for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Same as [`TestSession::select_answer`].
    pub fn select_current(&mut self, option: usize) -> Result<bool, SessionError> {
        let question_id = self
            .current_question()
            .map(|question| question.id().clone())
            .ok_or(SessionError::InvalidTransition {
                status: self.status(),
                action: "select an answer",
            })?;
        self.select_answer(&question_id, option)
    }

    /// Move the cursor. Never touches answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CursorOutOfRange` for an index past the last
    /// question, or `SessionError::InvalidTransition` outside `Answering`.
    pub fn move_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.require(&[SessionStatus::Answering], "move between questions")?;
        let len = self.progress().total;
        if index >= len {
            return Err(SessionError::CursorOutOfRange { index, len });
        }
        self.cursor = index;
        Ok(())
    }

    /// Step forward; stays put on the last question. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answering`.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.require(&[SessionStatus::Answering], "move between questions")?;
        let target = self.cursor + 1;
        if target >= self.progress().total {
            return Ok(false);
        }
        self.move_to(target)?;
        Ok(true)
    }

    /// Step back; stays put on the first question. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answering`.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        self.require(&[SessionStatus::Answering], "move between questions")?;
        let Some(target) = self.cursor.checked_sub(1) else {
            return Ok(false);
        };
        self.move_to(target)?;
        Ok(true)
    }

    /// Enter `Submitting` and build the payload to send.
    ///
    /// Allowed from `Answering` and, as a retry, from `SubmissionFailed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteSubmission` listing unanswered questions;
    /// the state is left unchanged in that case.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SessionError> {
        self.require(
            &[SessionStatus::Answering, SessionStatus::SubmissionFailed],
            "submit",
        )?;
        let test = self.test.as_ref().ok_or(SessionError::InvalidTransition {
            status: SessionStatus::Loading,
            action: "submit",
        })?;
        let payload = self.answers.to_payload(test)?;
        self.transition(SessionState::Submitting);
        Ok(payload)
    }

    /// The backend accepted the attempt. Clears the answers and stops the clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless `Submitting`.
    pub fn complete(&mut self, result_id: ResultId, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.require(&[SessionStatus::Submitting], "complete the submission")?;
        self.answers.clear();
        self.finished_at = Some(now);
        self.transition(SessionState::Completed { result_id });
        Ok(())
    }

    /// The submit did not go through. Answers and timing are kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless `Submitting`.
    pub fn fail_submission(&mut self, reason: impl Into<String>) -> Result<(), SessionError> {
        self.require(&[SessionStatus::Submitting], "record a failed submission")?;
        self.transition(SessionState::SubmissionFailed {
            reason: reason.into(),
        });
        Ok(())
    }

    /// Go back to answering after a failed submit, e.g. to revise answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless `SubmissionFailed`.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.require(&[SessionStatus::SubmissionFailed], "resume answering")?;
        self.transition(SessionState::Answering);
        Ok(())
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("test_id", &self.test_id)
            .field("state", &self.state)
            .field("questions", &self.test.as_ref().map(TestDefinition::len))
            .field("answered", &self.answers.len())
            .field("cursor", &self.cursor)
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
