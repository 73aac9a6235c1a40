#![forbid(unsafe_code)]

pub mod analytics;
pub mod app_services;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use analytics::{DashboardView, ProgressAnalyticsService, Widget};
pub use app_services::AppServices;
pub use error::{AnalyticsError, AppServicesError, SessionError};
pub use sessions::{
    LoadFailure, SessionProgress, SessionState, SessionStatus, TestSession, TestSessionService,
};
