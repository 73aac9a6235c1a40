use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{
    AnalyticsReport, AnswerDetail, AttemptRecord, AttemptRecordError, ModuleId, ModuleOutline,
    OverallStats, Percentage, PercentageError, ResultId, SubmissionPayload, TestDefinition,
    TestDefinitionError, TestId, TestProgressSummary,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend responded with status {0}")]
    Status(u16),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    InvalidRecord(#[from] AttemptRecordError),

    #[error("invalid test definition: {0}")]
    InvalidTest(#[from] TestDefinitionError),

    #[error("invalid percentage: {0}")]
    InvalidPercentage(#[from] PercentageError),
}

impl StorageError {
    /// True for failures of the transport or the server rather than of the data.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Status(_))
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to test definitions.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Fetch a test definition by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, `StorageError::InvalidTest`
    /// if the backend shape is not a usable test, or transport errors.
    async fn get_test(&self, id: &TestId) -> Result<TestDefinition, StorageError>;
}

/// Hands completed attempts to the backend for grading.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Submit a complete attempt and return the id of the graded result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport or server failure.
    async fn submit_test(&self, payload: &SubmissionPayload) -> Result<ResultId, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Attempt history for one test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if any attempt breaks the record contract.
    async fn test_history(&self, test_id: &TestId) -> Result<TestProgressSummary, StorageError>;

    /// A single graded attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the result does not exist.
    async fn get_result(&self, result_id: &ResultId) -> Result<AttemptRecord, StorageError>;

    /// Completion the backend reports for a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPercentage` for values outside `0..=100`.
    async fn module_progress(&self, module_id: &ModuleId) -> Result<Percentage, StorageError>;

    /// Average percentage and number of tests taken.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport or validation failure.
    async fn overall(&self) -> Result<OverallStats, StorageError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Weak topics, low-score tests and recommendations.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport or validation failure.
    async fn analytics(&self) -> Result<AnalyticsReport, StorageError>;
}

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// The tests that belong to a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn get_module(&self, module_id: &ModuleId) -> Result<ModuleOutline, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Faults {
    histories: HashSet<TestId>,
    module_progress: HashSet<ModuleId>,
    submissions: u32,
    overall: bool,
    analytics: bool,
}

#[derive(Default)]
struct State {
    tests: HashMap<TestId, TestDefinition>,
    answer_keys: HashMap<TestId, Vec<usize>>,
    histories: HashMap<TestId, TestProgressSummary>,
    results: HashMap<ResultId, AttemptRecord>,
    modules: HashMap<ModuleId, ModuleOutline>,
    module_progress: HashMap<ModuleId, Percentage>,
    overall: Option<OverallStats>,
    analytics: Option<AnalyticsReport>,
    submissions: Vec<SubmissionPayload>,
    next_result: u64,
}

/// In-memory backend for tests and offline use.
///
/// Submissions are graded against an answer key when one was registered for
/// the test; the graded attempt is then visible through `ProgressRepository`.
/// Individual sources can be made to fail to exercise degraded paths.
#[derive(Clone)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
    clock: Arc<Mutex<Clock>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn injected() -> StorageError {
    StorageError::Connection("injected failure".into())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            faults: Arc::new(Mutex::new(Faults::default())),
            clock: Arc::new(Mutex::new(Clock::default())),
        }
    }

    /// Use `clock` to stamp graded submissions. A fixed clock advances one
    /// minute per submission so histories stay ordered.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        if let Ok(mut guard) = self.clock.lock() {
            *guard = clock;
        }
        self
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_test(&self, test: TestDefinition) -> Result<(), StorageError> {
        lock(&self.state)?.tests.insert(test.id().clone(), test);
        Ok(())
    }

    /// Register the correct option index of each question, in question order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_answer_key(&self, test_id: TestId, key: Vec<usize>) -> Result<(), StorageError> {
        lock(&self.state)?.answer_keys.insert(test_id, key);
        Ok(())
    }

    /// Append an already graded attempt to a test's history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_attempt(
        &self,
        test_id: &TestId,
        test_title: &str,
        attempt: AttemptRecord,
    ) -> Result<(), StorageError> {
        let mut state = lock(&self.state)?;
        state
            .results
            .insert(attempt.result_id().clone(), attempt.clone());
        state
            .histories
            .entry(test_id.clone())
            .or_insert_with(|| TestProgressSummary::new(test_title, Vec::new()))
            .attempts
            .push(attempt);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn insert_module(&self, outline: ModuleOutline) -> Result<(), StorageError> {
        lock(&self.state)?.modules.insert(outline.id.clone(), outline);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_module_progress(
        &self,
        module_id: ModuleId,
        progress: Percentage,
    ) -> Result<(), StorageError> {
        lock(&self.state)?
            .module_progress
            .insert(module_id, progress);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_overall(&self, stats: OverallStats) -> Result<(), StorageError> {
        lock(&self.state)?.overall = Some(stats);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn set_analytics(&self, report: AnalyticsReport) -> Result<(), StorageError> {
        lock(&self.state)?.analytics = Some(report);
        Ok(())
    }

    /// Payloads received so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<SubmissionPayload>, StorageError> {
        Ok(lock(&self.state)?.submissions.clone())
    }

    /// Make history fetches for `test_id` fail.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault lock is poisoned.
    pub fn fail_history(&self, test_id: TestId) -> Result<(), StorageError> {
        lock(&self.faults)?.histories.insert(test_id);
        Ok(())
    }

    /// Make reported progress for `module_id` fail.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault lock is poisoned.
    pub fn fail_module_progress(&self, module_id: ModuleId) -> Result<(), StorageError> {
        lock(&self.faults)?.module_progress.insert(module_id);
        Ok(())
    }

    /// Make the next `count` submissions fail.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault lock is poisoned.
    pub fn fail_submissions(&self, count: u32) -> Result<(), StorageError> {
        lock(&self.faults)?.submissions = count;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault lock is poisoned.
    pub fn fail_overall(&self) -> Result<(), StorageError> {
        lock(&self.faults)?.overall = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault lock is poisoned.
    pub fn fail_analytics(&self) -> Result<(), StorageError> {
        lock(&self.faults)?.analytics = true;
        Ok(())
    }

    fn next_timestamp(&self) -> Result<chrono::DateTime<chrono::Utc>, StorageError> {
        let mut clock = lock(&self.clock)?;
        let now = clock.now();
        clock.advance(chrono::Duration::minutes(1));
        Ok(now)
    }
}

fn grade(
    result_id: ResultId,
    test: &TestDefinition,
    key: &[usize],
    payload: &SubmissionPayload,
    completed_at: chrono::DateTime<chrono::Utc>,
) -> Result<AttemptRecord, StorageError> {
    let mut details = Vec::with_capacity(payload.answers().len());
    for (question, answer) in test.questions().iter().zip(payload.answers()) {
        let correct_index = key
            .get(details.len())
            .copied()
            .ok_or(AttemptRecordError::Missing("answer key entry"))?;
        details.push(AnswerDetail {
            question: question.prompt().to_owned(),
            options: question.options().to_vec(),
            selected_index: answer.selected_answer,
            selected_text: question
                .option(answer.selected_answer)
                .unwrap_or_default()
                .to_owned(),
            correct_index,
            correct_text: question.option(correct_index).unwrap_or_default().to_owned(),
            is_correct: answer.selected_answer == correct_index,
        });
    }
    let total = u32::try_from(details.len()).map_err(|_| AttemptRecordError::FieldOutOfRange {
        field: "totalQuestions",
        value: i64::MAX,
    })?;
    let score = u32::try_from(details.iter().filter(|d| d.is_correct).count()).unwrap_or(total);
    let percentage = Percentage::from_score(score, total)?;
    Ok(AttemptRecord::new(
        result_id,
        score,
        total,
        percentage.value(),
        completed_at,
        details,
    )?)
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn get_test(&self, id: &TestId) -> Result<TestDefinition, StorageError> {
        let state = lock(&self.state)?;
        state.tests.get(id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn submit_test(&self, payload: &SubmissionPayload) -> Result<ResultId, StorageError> {
        {
            let mut faults = lock(&self.faults)?;
            if faults.submissions > 0 {
                faults.submissions -= 1;
                return Err(injected());
            }
        }

        let completed_at = self.next_timestamp()?;
        let mut state = lock(&self.state)?;
        let next = state.next_result + 1;
        let result_id = ResultId::new(format!("r{next}"));

        // Nothing is recorded unless grading succeeds.
        let test = state.tests.get(payload.test_id()).cloned();
        let key = state.answer_keys.get(payload.test_id()).cloned();
        let graded = match (test, key) {
            (Some(test), Some(key)) => Some((
                grade(result_id.clone(), &test, &key, payload, completed_at)?,
                test,
            )),
            _ => None,
        };

        state.next_result = next;
        state.submissions.push(payload.clone());
        if let Some((attempt, test)) = graded {
            state.results.insert(result_id.clone(), attempt.clone());
            state
                .histories
                .entry(payload.test_id().clone())
                .or_insert_with(|| TestProgressSummary::new(test.title(), Vec::new()))
                .attempts
                .push(attempt);
        }
        Ok(result_id)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn test_history(&self, test_id: &TestId) -> Result<TestProgressSummary, StorageError> {
        if lock(&self.faults)?.histories.contains(test_id) {
            return Err(injected());
        }
        let state = lock(&self.state)?;
        if let Some(history) = state.histories.get(test_id) {
            return Ok(history.clone());
        }
        // A known test without attempts has an empty history.
        state
            .tests
            .get(test_id)
            .map(|test| TestProgressSummary::new(test.title(), Vec::new()))
            .ok_or(StorageError::NotFound)
    }

    async fn get_result(&self, result_id: &ResultId) -> Result<AttemptRecord, StorageError> {
        let state = lock(&self.state)?;
        state
            .results
            .get(result_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn module_progress(&self, module_id: &ModuleId) -> Result<Percentage, StorageError> {
        if lock(&self.faults)?.module_progress.contains(module_id) {
            return Err(injected());
        }
        let state = lock(&self.state)?;
        state
            .module_progress
            .get(module_id)
            .copied()
            .ok_or(StorageError::NotFound)
    }

    async fn overall(&self) -> Result<OverallStats, StorageError> {
        if lock(&self.faults)?.overall {
            return Err(injected());
        }
        lock(&self.state)?.overall.ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryRepository {
    async fn analytics(&self) -> Result<AnalyticsReport, StorageError> {
        if lock(&self.faults)?.analytics {
            return Err(injected());
        }
        lock(&self.state)?
            .analytics
            .clone()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn get_module(&self, module_id: &ModuleId) -> Result<ModuleOutline, StorageError> {
        let state = lock(&self.state)?;
        state
            .modules
            .get(module_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Bundles the backend contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub modules: Arc<dyn ModuleRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        Self {
            tests: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            analytics: Arc::new(repo.clone()),
            modules: Arc::new(repo),
        }
    }
}
