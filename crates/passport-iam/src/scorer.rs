//! Client for the scoring service that collects issued stamps.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use passport_core::Secret;
use passport_identity::Credential;

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("scorer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scorer returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Body of `POST <endpoint>/stamps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampSubmission {
    pub address: String,
    pub provider: String,
    pub stamp: Credential,
}

/// Reply of `GET <endpoint>/score/<address>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub address: String,
    pub score: f64,
    pub status: String,
}

pub struct ScorerClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Secret,
}

impl ScorerClient {
    pub fn new(endpoint: &str, api_key: Secret, timeout: Duration) -> Result<Self, ScorerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Push an issued stamp for `address`.
    pub async fn submit_stamp(
        &self,
        address: &str,
        provider: &str,
        stamp: &Credential,
    ) -> Result<(), ScorerError> {
        let body = StampSubmission {
            address: address.to_string(),
            provider: provider.to_string(),
            stamp: stamp.clone(),
        };
        let resp = self
            .http
            .post(format!("{}/stamps", self.endpoint))
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await?;
        check_status(resp).await?;
        tracing::info!(%address, %provider, "stamp submitted to scorer");
        Ok(())
    }

    /// Current score of `address`.
    pub async fn fetch_score(&self, address: &str) -> Result<ScoreResponse, ScorerError> {
        let resp = self
            .http
            .get(format!("{}/score/{}", self.endpoint, address))
            .bearer_auth(self.api_key.expose())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ScorerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ScorerError::Status {
        status: status.as_u16(),
        body,
    })
}
