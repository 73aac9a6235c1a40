#![forbid(unsafe_code)]

pub mod http;
pub mod repository;

pub use http::{BackendConfig, ConfigError, HttpBackend, HttpInitError};
pub use repository::{
    AnalyticsRepository, InMemoryRepository, ModuleRepository, ProgressRepository, Storage,
    StorageError, SubmissionRepository, TestRepository,
};
