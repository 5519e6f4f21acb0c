//! reqwest-backed implementation of the server API.

use crate::api::ServerApi;
use crate::error::ApiError;
use async_trait::async_trait;
use lectern_model::SyncSnapshot;
use std::time::Duration;

/// HTTP client for the coordinating server: `GET <base>/` for the liveness
/// probe, `GET <base>/api/sync` for the full snapshot.
pub struct HttpServerApi {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
    resync_timeout: Duration,
}

impl HttpServerApi {
    pub fn new(
        base_url: impl Into<String>,
        probe_timeout: Duration,
        resync_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        Ok(HttpServerApi {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_timeout,
            resync_timeout,
        })
    }
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn probe(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn fetch_snapshot(&self) -> Result<SyncSnapshot, ApiError> {
        let url = format!("{}/api/sync", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(self.resync_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with("application/json") {
            return Err(ApiError::MalformedResponse(format!(
                "unexpected content type: {}",
                content_type
            )));
        }

        resp.json::<SyncSnapshot>()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}
