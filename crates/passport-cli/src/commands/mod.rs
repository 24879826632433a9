pub mod challenge;
pub mod issuers;
pub mod keygen;
pub mod verify;

use serde::Deserialize;

/// Default IAM endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8003";

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Turn a non-2xx IAM reply into an error carrying its `{error}` body.
pub async fn bail_on_error(what: &str, resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if let Ok(err) = resp.json::<ErrorResponse>().await {
        anyhow::bail!("{} failed (HTTP {}): {}", what, status, err.error);
    }
    anyhow::bail!("{} failed (HTTP {})", what, status)
}
