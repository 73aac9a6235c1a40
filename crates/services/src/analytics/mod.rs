mod service;
mod view;

pub use crate::error::AnalyticsError;
pub use service::ProgressAnalyticsService;
pub use view::{
    AnalyticsView, AttemptListItem, DashboardView, DataStatus, LowScoreRow, ModulePanel,
    ModuleRollupView, OverallView, ResultView, ScoreView, TestProgressRow, TestProgressView,
    Widget,
};
