use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    AnalyticsReport, AttemptRecord, AttemptRecordError, ModuleId, ModuleOutline, OverallStats,
    Percentage, ResultId, SubmissionPayload, TestDefinition, TestId, TestProgressSummary,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::repository::{
    AnalyticsRepository, ModuleRepository, ProgressRepository, Storage, StorageError,
    SubmissionRepository, TestRepository,
};

mod config;
mod dto;
mod mapping;

pub use config::{BackendConfig, ConfigError, parse_timeout};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Backend reached over its REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

fn transport(err: reqwest::Error) -> StorageError {
    if err.is_decode() {
        StorageError::Serialization(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

impl HttpBackend {
    /// Build a client honoring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, HttpInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Resolve `segments` under the base URL, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Connection(format!("unusable base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, segments: &[&str]) -> Result<reqwest::Response, StorageError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, StorageError> {
        self.get(segments).await?.json::<T>().await.map_err(transport)
    }

    /// GET an attempt-bearing body. A body that does not fit the record shape
    /// is an invalid record, not a transport failure.
    async fn get_record<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, StorageError> {
        let body = self
            .get(segments)
            .await?
            .text()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|err| StorageError::from(AttemptRecordError::Malformed(err.to_string())))
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, StorageError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let response = self
            .authorize(self.client.post(url).json(body))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response)?.json::<T>().await.map_err(transport)
    }

    fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if !status.is_success() {
            return Err(StorageError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl TestRepository for HttpBackend {
    async fn get_test(&self, id: &TestId) -> Result<TestDefinition, StorageError> {
        let dto: dto::TestDto = self.get_json(&["test", id.as_str()]).await?;
        mapping::map_test(dto)
    }
}

#[async_trait]
impl SubmissionRepository for HttpBackend {
    async fn submit_test(&self, payload: &SubmissionPayload) -> Result<ResultId, StorageError> {
        let dto: dto::SubmitResponseDto = self
            .post_json(&["test", "passing", "submit-test"], payload)
            .await?;
        mapping::map_result_id(dto.result_id)
    }
}

#[async_trait]
impl ProgressRepository for HttpBackend {
    async fn test_history(&self, test_id: &TestId) -> Result<TestProgressSummary, StorageError> {
        let dto: dto::TestProgressDto = self
            .get_record(&["progress", "test", "result", test_id.as_str()])
            .await?;
        mapping::map_progress(dto)
    }

    async fn get_result(&self, result_id: &ResultId) -> Result<AttemptRecord, StorageError> {
        let dto: dto::AttemptDto = self
            .get_record(&["progress", "test", result_id.as_str()])
            .await?;
        mapping::map_attempt(dto)
    }

    async fn module_progress(&self, module_id: &ModuleId) -> Result<Percentage, StorageError> {
        let dto: dto::ModuleProgressDto = self
            .get_json(&["progress", "module", module_id.as_str()])
            .await?;
        Ok(Percentage::new(dto.progress)?)
    }

    async fn overall(&self) -> Result<OverallStats, StorageError> {
        let dto: dto::OverallDto = self.get_json(&["progress", "overall"]).await?;
        mapping::map_overall(dto)
    }
}

#[async_trait]
impl AnalyticsRepository for HttpBackend {
    async fn analytics(&self) -> Result<AnalyticsReport, StorageError> {
        let dto: dto::AnalyticsDto = self.get_json(&["analytics"]).await?;
        mapping::map_analytics(dto)
    }
}

#[async_trait]
impl ModuleRepository for HttpBackend {
    async fn get_module(&self, module_id: &ModuleId) -> Result<ModuleOutline, StorageError> {
        let dto: dto::ModuleDto = self.get_json(&["module", module_id.as_str()]).await?;
        mapping::map_module(dto)
    }
}

impl Storage {
    /// Build a `Storage` backed by the REST backend.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be constructed.
    pub fn http(config: &BackendConfig) -> Result<Self, HttpInitError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self {
            tests: backend.clone(),
            submissions: backend.clone(),
            progress: backend.clone(),
            analytics: backend.clone(),
            modules: backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let http = backend("http://localhost:8000/api");
        let url = http.endpoint(&["progress", "test", "result", "t1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/progress/test/result/t1");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let http = backend("http://localhost:8000/api/");
        let url = http.endpoint(&["progress", "overall"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/progress/overall");
    }

    #[test]
    fn endpoint_encodes_ids() {
        let http = backend("https://quiz.example");
        let url = http.endpoint(&["test", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://quiz.example/test/a%2Fb%20c");
    }
}
