use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{
    AnalyticsReport, AnswerDetail, AttemptRecord, ModuleId, OverallStats, Percentage, ResultId,
    TestId, TestProgressSummary, TestRef, WeakTopic,
};
use quiz_core::{ScoreBand, classify};
use storage::StorageError;

//
// ─── BUILDING BLOCKS ───────────────────────────────────────────────────────────
//

/// A dashboard widget whose source may have failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Widget<T> {
    Ready(T),
    NoData { reason: String },
}

impl<T> Widget<T> {
    pub(crate) fn no_data(err: &StorageError) -> Self {
        Self::NoData {
            reason: err.to_string(),
        }
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Widget::Ready(value) => Some(value),
            Widget::NoData { .. } => None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Widget::Ready(_))
    }
}

/// A percentage together with its badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreView {
    pub percentage: Percentage,
    pub band: ScoreBand,
}

impl ScoreView {
    #[must_use]
    pub fn of(percentage: Percentage) -> Self {
        Self {
            percentage,
            band: classify(percentage),
        }
    }
}

/// Whether a row's numbers came from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DataStatus {
    Loaded,
    Unavailable { reason: String },
    Invalid { reason: String },
}

impl DataStatus {
    pub(crate) fn from_error(err: &StorageError) -> Self {
        match err {
            StorageError::InvalidRecord(_) | StorageError::InvalidPercentage(_) => Self::Invalid {
                reason: err.to_string(),
            },
            _ => Self::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

//
// ─── MODULE ROLLUP ─────────────────────────────────────────────────────────────
//

/// One test inside a module rollup.
///
/// Tests without attempts, and tests whose history could not be used, show
/// 0% without a badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestProgressRow {
    pub test_id: TestId,
    pub title: String,
    pub attempts: usize,
    pub best_result: Option<ResultId>,
    pub percentage: Percentage,
    pub badge: Option<ScoreBand>,
    pub status: DataStatus,
}

impl TestProgressRow {
    pub(crate) fn loaded(test: &TestRef, summary: &TestProgressSummary) -> Self {
        let best = summary.best_attempt();
        Self {
            test_id: test.id.clone(),
            title: test.title.clone(),
            attempts: summary.attempts.len(),
            best_result: best.map(|record| record.result_id().clone()),
            percentage: best.map_or(Percentage::ZERO, AttemptRecord::percentage),
            badge: best.map(|record| classify(record.percentage())),
            status: DataStatus::Loaded,
        }
    }

    pub(crate) fn degraded(test: &TestRef, err: &StorageError) -> Self {
        Self {
            test_id: test.id.clone(),
            title: test.title.clone(),
            attempts: 0,
            best_result: None,
            percentage: Percentage::ZERO,
            badge: None,
            status: DataStatus::from_error(err),
        }
    }

    #[must_use]
    pub fn is_attempted(&self) -> bool {
        self.best_result.is_some()
    }
}

/// Completion of one module computed from its tests' best attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRollupView {
    pub module_id: ModuleId,
    pub title: String,
    pub tests: Vec<TestProgressRow>,
    pub completion: ScoreView,
    /// Completion as reported by the backend, shown alongside when available.
    pub reported: Widget<ScoreView>,
}

/// A requested module on the dashboard; the outline itself may be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulePanel {
    pub module_id: ModuleId,
    pub rollup: Widget<ModuleRollupView>,
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallView {
    pub average: ScoreView,
    pub tests_taken: u32,
}

impl From<OverallStats> for OverallView {
    fn from(stats: OverallStats) -> Self {
        Self {
            average: ScoreView::of(stats.average),
            tests_taken: stats.tests_taken,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowScoreRow {
    pub test_id: Option<TestId>,
    pub title: String,
    pub score: ScoreView,
}

/// Backend analytics with badges applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub weak_topics: Vec<WeakTopic>,
    pub low_score_tests: Vec<LowScoreRow>,
    pub recommendations: Vec<String>,
    pub motivation: Option<String>,
}

impl From<AnalyticsReport> for AnalyticsView {
    fn from(report: AnalyticsReport) -> Self {
        let weak_topics = report
            .weak_topics_by_mistakes()
            .into_iter()
            .cloned()
            .collect();
        let low_score_tests = report
            .low_score_tests
            .into_iter()
            .map(|test| LowScoreRow {
                test_id: test.test_id,
                title: test.title,
                score: ScoreView::of(test.percentage),
            })
            .collect();
        Self {
            weak_topics,
            low_score_tests,
            recommendations: report.recommendations,
            motivation: report.motivation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub overall: Widget<OverallView>,
    pub analytics: Widget<AnalyticsView>,
    pub modules: Vec<ModulePanel>,
}

//
// ─── SINGLE TEST / RESULT ──────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptListItem {
    pub result_id: ResultId,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
    pub grade: ScoreView,
    pub is_best: bool,
}

/// Attempt history of one test, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestProgressView {
    pub test_id: TestId,
    pub title: String,
    pub attempts: Vec<AttemptListItem>,
    pub best: Option<ScoreView>,
}

impl TestProgressView {
    pub(crate) fn build(test_id: TestId, summary: &TestProgressSummary) -> Self {
        let best = summary.best_attempt();
        let best_id = best.map(AttemptRecord::result_id);
        let mut attempts: Vec<AttemptListItem> = summary
            .attempts
            .iter()
            .map(|record| AttemptListItem {
                result_id: record.result_id().clone(),
                completed_at: record.completed_at(),
                score: record.score(),
                total_questions: record.total_questions(),
                grade: ScoreView::of(record.percentage()),
                is_best: Some(record.result_id()) == best_id,
            })
            .collect();
        attempts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        Self {
            test_id,
            title: summary.test_title.clone(),
            attempts,
            best: best.map(|record| ScoreView::of(record.percentage())),
        }
    }
}

/// One graded attempt with its per-question review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub result_id: ResultId,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
    pub grade: ScoreView,
    pub mistakes: usize,
    pub questions: Vec<AnswerDetail>,
}

impl From<AttemptRecord> for ResultView {
    fn from(record: AttemptRecord) -> Self {
        Self {
            result_id: record.result_id().clone(),
            completed_at: record.completed_at(),
            score: record.score(),
            total_questions: record.total_questions(),
            grade: ScoreView::of(record.percentage()),
            mistakes: record.mistakes().count(),
            questions: record.answers().to_vec(),
        }
    }
}
