//! HTTP implementation of the remote per-user case store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use casefile_core::CaseError;
use casefile_core::error::Result;
use casefile_core::repository::{RemoteCaseRecord, RemoteCaseStore};

pub const REMOTE_STORE_SERVICE: &str = "remote_store";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to `{base_url}/case_files/{user_id}` with bearer authentication.
#[derive(Clone)]
pub struct HttpRemoteCaseStore {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CaseFileBody {
    user_id: String,
    content: String,
    updated_at: DateTime<Utc>,
}

impl HttpRemoteCaseStore {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// `user_id` is pushed as a single percent-encoded path segment.
    fn record_url(&self, user_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            CaseError::config(format!("invalid remote base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                CaseError::config(format!("remote base URL '{}' cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .push("case_files")
            .push(user_id);
        Ok(url)
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.access_token {
            request.header("Authorization", format!("Bearer {}", token))
        } else {
            request
        }
    }

    async fn error_from(operation: &str, response: reqwest::Response) -> CaseError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        CaseError::service(
            REMOTE_STORE_SERVICE,
            format!("{operation} failed with {status}: {body}"),
        )
    }
}

fn request_failed(operation: &str, e: reqwest::Error) -> CaseError {
    CaseError::service(REMOTE_STORE_SERVICE, format!("{operation} request failed: {e}"))
}

#[async_trait]
impl RemoteCaseStore for HttpRemoteCaseStore {
    async fn load(&self, user_id: &str) -> Result<Option<RemoteCaseRecord>> {
        let request = self.auth_request(
            self.client
                .get(self.record_url(user_id)?)
                .timeout(REQUEST_TIMEOUT),
        );
        let response = request.send().await.map_err(|e| request_failed("load", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(user_id, "No remote case file");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from("load", response).await);
        }

        let body: CaseFileBody = response.json().await.map_err(|e| {
            CaseError::service(REMOTE_STORE_SERVICE, format!("unparseable record: {e}"))
        })?;
        Ok(Some(RemoteCaseRecord {
            user_id: body.user_id,
            content: body.content,
            updated_at: body.updated_at,
        }))
    }

    async fn save(&self, record: RemoteCaseRecord) -> Result<()> {
        let url = self.record_url(&record.user_id)?;
        let body = CaseFileBody {
            user_id: record.user_id,
            content: record.content,
            updated_at: record.updated_at,
        };
        let request = self.auth_request(self.client.put(url).json(&body).timeout(REQUEST_TIMEOUT));
        let response = request.send().await.map_err(|e| request_failed("save", e))?;

        if !response.status().is_success() {
            return Err(Self::error_from("save", response).await);
        }
        tracing::debug!(user_id = %body.user_id, "Saved remote case file");
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let request = self.auth_request(
            self.client
                .delete(self.record_url(user_id)?)
                .timeout(REQUEST_TIMEOUT),
        );
        let response = request.send().await.map_err(|e| request_failed("delete", e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::error_from("delete", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_url_trims_trailing_slash() {
        let store = HttpRemoteCaseStore::new("https://api.example.com/", None);
        assert_eq!(
            store.record_url("user-1").unwrap().as_str(),
            "https://api.example.com/case_files/user-1"
        );
    }

    #[test]
    fn test_record_url_encodes_user_id() {
        let store = HttpRemoteCaseStore::new("https://api.example.com/v1", None);
        assert_eq!(
            store.record_url("team/alice?admin=1").unwrap().as_str(),
            "https://api.example.com/v1/case_files/team%2Falice%3Fadmin=1"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let store = HttpRemoteCaseStore::new("not a url", None);
        assert!(matches!(
            store.record_url("user-1").unwrap_err(),
            CaseError::Config(_)
        ));
    }

    #[test]
    fn test_body_uses_snake_case_columns() {
        let body = CaseFileBody {
            user_id: "u".into(),
            content: "{}".into(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("user_id").is_some());
        assert!(value.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_service_failure() {
        let store = HttpRemoteCaseStore::new("http://127.0.0.1:9", Some("token".into()));
        let err = store.load("user-1").await.unwrap_err();
        assert!(err.is_service_failure());
    }
}
