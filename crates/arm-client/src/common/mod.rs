//! Common utilities for the ARM client
//!
//! Provides the authenticated HTTP wrapper and long-running operation
//! header handling shared by all requests.

use crate::error::ArmError;
use crate::models::{ArmErrorResponse, OperationHandle, OperationKind, PollMode, API_VERSION};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Conditional request header for PUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    None,
    /// `If-None-Match: *` (create only)
    IfNoneMatchAny,
    /// `If-Match: *` (update only)
    IfMatchAny,
}

/// HTTP client wrapper with bearer authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a resource path, adding the api-version.
    /// Absolute URLs (operation status links) are returned unchanged.
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}?api-version={}", self.base_url, path, API_VERSION)
        }
    }

    /// Get authorization header value
    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Turn a non-success response into an error, keeping ARM's code and message
    async fn error_from(response: Response, method: &str, path: &str) -> ArmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ArmErrorResponse>(&body) {
            Ok(envelope) => envelope.error.to_string(),
            Err(_) => body,
        };
        ArmError::from_status(status, format!("{} {} failed: {} - {}", method, path, status, detail))
    }

    /// Make a GET request and decode the body
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ArmError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ArmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "GET", path).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(ArmError::Serialization)
    }

    /// Make a PUT request; the body is not logged because it can carry credentials
    pub async fn put(
        &self,
        path: &str,
        body: &serde_json::Value,
        precondition: Precondition,
    ) -> Result<Response, ArmError> {
        let url = self.build_url(path);
        debug!("PUT {} ({:?})", url, precondition);

        let mut request = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        request = match precondition {
            Precondition::None => request,
            Precondition::IfNoneMatchAny => request.header("If-None-Match", "*"),
            Precondition::IfMatchAny => request.header("If-Match", "*"),
        };

        let response = request.json(body).send().await.map_err(ArmError::Http)?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "PUT", path).await);
        }
        Ok(response)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response, ArmError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(ArmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "DELETE", path).await);
        }
        Ok(response)
    }

    /// GET an operation status URL without interpreting the status code
    pub async fn get_operation(&self, url: &str) -> Result<Response, ArmError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ArmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "GET", url).await);
        }
        Ok(response)
    }
}

/// Parse `Retry-After` (seconds form only)
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Build an operation handle from the headers of an accepted mutation.
/// `Azure-AsyncOperation` wins over `Location`; neither means the request completed.
pub fn operation_handle(kind: OperationKind, resource_id: &str, headers: &HeaderMap) -> OperationHandle {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let (status_url, poll_mode) = match (header("Azure-AsyncOperation"), header("Location")) {
        (Some(url), _) => (Some(url), PollMode::AsyncOperation),
        (None, Some(url)) => (Some(url), PollMode::Location),
        (None, None) => (None, PollMode::AsyncOperation),
    };

    OperationHandle {
        kind,
        resource_id: resource_id.to_string(),
        status_url,
        poll_mode,
        retry_after: retry_after(headers),
    }
}
