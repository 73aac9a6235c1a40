use std::sync::Arc;

use futures::future::join_all;
use futures::join;
use tracing::{debug, error, warn};

use quiz_core::model::{AttemptRecord, ModuleId, ModuleOutline, ResultId, TestId};
use quiz_core::module_completion;
use storage::StorageError;
use storage::repository::{AnalyticsRepository, ModuleRepository, ProgressRepository};

use super::view::{
    AnalyticsView, DashboardView, ModulePanel, ModuleRollupView, OverallView, ResultView,
    ScoreView, TestProgressRow, TestProgressView, Widget,
};
use crate::error::AnalyticsError;

fn log_degraded(source: &str, id: &str, err: &StorageError) {
    if matches!(
        err,
        StorageError::InvalidRecord(_) | StorageError::InvalidPercentage(_)
    ) {
        error!(source, id, error = %err, "backend returned an invalid record");
    } else {
        warn!(source, id, error = %err, "source unavailable, showing no data");
    }
}

/// Builds progress and dashboard views from the backend's progress sources.
///
/// Single-source views propagate errors. Composite views fetch every source
/// concurrently and degrade only the widget whose source failed.
#[derive(Clone)]
pub struct ProgressAnalyticsService {
    progress: Arc<dyn ProgressRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
    modules: Arc<dyn ModuleRepository>,
}

impl ProgressAnalyticsService {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
        modules: Arc<dyn ModuleRepository>,
    ) -> Self {
        Self {
            progress,
            analytics,
            modules,
        }
    }

    /// Attempt history of one test with its best attempt.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidAttemptRecord` if the backend returned a
    /// record outside the contract, or `AnalyticsError::Storage` otherwise.
    pub async fn test_progress(&self, test_id: &TestId) -> Result<TestProgressView, AnalyticsError> {
        let summary = self.progress.test_history(test_id).await?;
        Ok(TestProgressView::build(test_id.clone(), &summary))
    }

    /// One graded attempt.
    ///
    /// # Errors
    ///
    /// Same as [`ProgressAnalyticsService::test_progress`].
    pub async fn result_view(&self, result_id: &ResultId) -> Result<ResultView, AnalyticsError> {
        let record = self.progress.get_result(result_id).await?;
        Ok(ResultView::from(record))
    }

    /// Per-test rows and completion of one module.
    ///
    /// Every test history and the backend-reported completion are fetched
    /// together; a failed history counts as an unattempted test.
    pub async fn module_rollup(&self, outline: &ModuleOutline) -> ModuleRollupView {
        let histories = join_all(
            outline
                .tests
                .iter()
                .map(|test| self.progress.test_history(&test.id)),
        );
        let (histories, reported) = join!(histories, self.progress.module_progress(&outline.id));

        let mut rows = Vec::with_capacity(outline.tests.len());
        let mut bests: Vec<(TestId, Option<&AttemptRecord>)> =
            Vec::with_capacity(outline.tests.len());
        for (test, history) in outline.tests.iter().zip(&histories) {
            match history {
                Ok(summary) => {
                    bests.push((test.id.clone(), summary.best_attempt()));
                    rows.push(TestProgressRow::loaded(test, summary));
                }
                Err(err) => {
                    log_degraded("test history", test.id.as_str(), err);
                    bests.push((test.id.clone(), None));
                    rows.push(TestProgressRow::degraded(test, err));
                }
            }
        }

        let completion = ScoreView::of(module_completion(&bests));
        let reported = match reported {
            Ok(percentage) => Widget::Ready(ScoreView::of(percentage)),
            Err(err) => {
                log_degraded("module progress", outline.id.as_str(), &err);
                Widget::no_data(&err)
            }
        };
        debug!(
            module_id = %outline.id,
            tests = rows.len(),
            completion = %completion.percentage,
            "module rollup computed"
        );

        ModuleRollupView {
            module_id: outline.id.clone(),
            title: outline.title.clone(),
            tests: rows,
            completion,
            reported,
        }
    }

    /// Overall stats, analytics and the rollup of every requested module.
    ///
    /// Never fails as a whole: each source that fails becomes a "no data"
    /// widget.
    pub async fn dashboard(&self, module_ids: &[ModuleId]) -> DashboardView {
        let modules = async {
            let outlines = join_all(module_ids.iter().map(|id| self.modules.get_module(id))).await;
            join_all(
                module_ids
                    .iter()
                    .zip(outlines)
                    .map(|(module_id, outline)| self.module_panel(module_id, outline)),
            )
            .await
        };
        let (overall, analytics, modules) =
            join!(self.progress.overall(), self.analytics.analytics(), modules);

        let overall = match overall {
            Ok(stats) => Widget::Ready(OverallView::from(stats)),
            Err(err) => {
                log_degraded("overall", "-", &err);
                Widget::no_data(&err)
            }
        };
        let analytics = match analytics {
            Ok(report) => Widget::Ready(AnalyticsView::from(report)),
            Err(err) => {
                log_degraded("analytics", "-", &err);
                Widget::no_data(&err)
            }
        };

        DashboardView {
            overall,
            analytics,
            modules,
        }
    }

    async fn module_panel(
        &self,
        module_id: &ModuleId,
        outline: Result<ModuleOutline, StorageError>,
    ) -> ModulePanel {
        let rollup = match outline {
            Ok(outline) => Widget::Ready(self.module_rollup(&outline).await),
            Err(err) => {
                log_degraded("module outline", module_id.as_str(), &err);
                Widget::no_data(&err)
            }
        };
        ModulePanel {
            module_id: module_id.clone(),
            rollup,
        }
    }
}
