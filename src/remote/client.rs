use super::{FlowRecord, FolderDetail, FolderMembership, FolderRecord, NewFolder, RemoteError, RemoteStore};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Query used when listing flows: user flows only, no pagination.
const LIST_FLOWS_QUERY: [(&str, &str); 4] = [
    ("remove_example_flows", "true"),
    ("components_only", "false"),
    ("get_all", "true"),
    ("header_flows", "false"),
];

/// HTTP client for the Langflow REST API
#[derive(Debug, Clone)]
pub struct LangflowClient {
    base_url: String,
    http: Client,
}

impl LangflowClient {
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RemoteError::Rejected(format!("Invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let response = Self::check(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Turn a non-success response into `RemoteError::Status`.
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| status.to_string());
        error!(status = status.as_u16(), %detail, "Langflow API error");
        Err(RemoteError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Extract the `detail` message from an API error body, falling back to the raw body.
fn error_detail(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}

#[async_trait]
impl RemoteStore for LangflowClient {
    async fn list_flows(&self) -> Result<Vec<FlowRecord>, RemoteError> {
        debug!("Listing flows");
        let response = self
            .http
            .get(self.url("flows/"))
            .query(&LIST_FLOWS_QUERY)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn create_flow(&self, payload: &Value) -> Result<FlowRecord, RemoteError> {
        let response = self.http.post(self.url("flows/")).json(payload).send().await?;
        Self::json(response).await
    }

    async fn update_flow(&self, id: &str, payload: &Value) -> Result<FlowRecord, RemoteError> {
        let response = self
            .http
            .patch(self.url(&format!("flows/{id}")))
            .json(payload)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn delete_flow(&self, id: &str) -> Result<(), RemoteError> {
        let response = self.http.delete(self.url(&format!("flows/{id}"))).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_folders(&self) -> Result<Vec<FolderRecord>, RemoteError> {
        debug!("Listing folders");
        let response = self.http.get(self.url("folders/")).send().await?;
        Self::json(response).await
    }

    async fn get_folder(&self, id: &str) -> Result<Option<FolderDetail>, RemoteError> {
        let response = self.http.get(self.url(&format!("folders/{id}"))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::json(response).await.map(Some)
    }

    async fn create_folder(&self, payload: &NewFolder) -> Result<FolderRecord, RemoteError> {
        let response = self.http.post(self.url("folders/")).json(payload).send().await?;
        Self::json(response).await
    }

    async fn update_folder(
        &self,
        id: &str,
        payload: &FolderMembership,
    ) -> Result<FolderRecord, RemoteError> {
        let response = self
            .http
            .patch(self.url(&format!("folders/{id}")))
            .json(payload)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn delete_folder(&self, id: &str) -> Result<(), RemoteError> {
        let response = self.http.delete(self.url(&format!("folders/{id}"))).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
