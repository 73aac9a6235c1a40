use serde::Serialize;

use crate::model::ids::{ModuleId, TestId};
use crate::model::percentage::Percentage;

/// A topic the backend found the user repeatedly getting wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeakTopic {
    pub topic: String,
    pub mistakes: u32,
    pub recommendation: String,
}

/// A test whose score the backend flagged as low.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowScoreTest {
    pub test_id: Option<TestId>,
    pub title: String,
    pub percentage: Percentage,
}

/// Backend analytics, consumed read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalyticsReport {
    pub weak_topics: Vec<WeakTopic>,
    pub low_score_tests: Vec<LowScoreTest>,
    pub recommendations: Vec<String>,
    pub motivation: Option<String>,
}

impl AnalyticsReport {
    /// Weak topics with the most mistakes first; ties keep backend order.
    #[must_use]
    pub fn weak_topics_by_mistakes(&self) -> Vec<&WeakTopic> {
        let mut topics: Vec<_> = self.weak_topics.iter().collect();
        topics.sort_by(|a, b| b.mistakes.cmp(&a.mistakes));
        topics
    }
}

/// Dashboard headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallStats {
    pub average: Percentage,
    pub tests_taken: u32,
}

/// Reference to a test inside a module listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRef {
    pub id: TestId,
    pub title: String,
}

/// The tests that belong to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutline {
    pub id: ModuleId,
    pub title: String,
    pub tests: Vec<TestRef>,
}
