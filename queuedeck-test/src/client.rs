//! Client for the panel routes

use reqwest::{Client, RequestBuilder, Response, Url};
use thiserror::Error;

/// HTTP client bound to a panel base URL (host plus base path)
pub struct DeckClient {
    base_url: String,
    client: Client,
    bearer: Option<String>,
}

impl DeckClient {
    /// Create a new client
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            bearer: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Base URL extended with percent-encoded path segments
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn put(&self, segments: &[&str]) -> Result<Response, ClientError> {
        let url = self.url(segments)?;
        let request = self.authorize(self.client.put(url));
        Ok(request.send().await?)
    }

    /// `GET /queues` with per-queue status selections
    pub async fn queues(&self, query: &[(&str, &str)]) -> Result<Response, ClientError> {
        let url = self.url(&["queues"])?;
        let request = self.authorize(self.client.get(url).query(query));
        Ok(request.send().await?)
    }

    /// `GET /queues` decoded as JSON
    pub async fn queues_json(&self, query: &[(&str, &str)]) -> Result<serde_json::Value, ClientError> {
        let response = self.queues(query).await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn retry_all(&self, queue: &str) -> Result<Response, ClientError> {
        self.put(&["queues", queue, "retry"]).await
    }

    pub async fn clean(&self, queue: &str, status: &str) -> Result<Response, ClientError> {
        self.put(&["queues", queue, "clean", status]).await
    }

    pub async fn retry_job(&self, queue: &str, job: &str) -> Result<Response, ClientError> {
        self.put(&["queues", queue, "jobs", job, "retry"]).await
    }

    pub async fn promote_job(&self, queue: &str, job: &str) -> Result<Response, ClientError> {
        self.put(&["queues", queue, "jobs", job, "promote"]).await
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}
