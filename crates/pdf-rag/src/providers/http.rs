//! Shared HTTP plumbing for the REST providers

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Error, Result, Stage};

/// Build a client whose every request is bounded by `timeout`
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Decode a JSON body, turning non-2xx statuses and undecodable bodies into
/// upstream errors for `stage`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    stage: Stage,
    what: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::upstream(
            stage,
            format!("{} failed ({}): {}", what, status, body),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| Error::upstream(stage, format!("Failed to parse {} response: {}", what, e)))
}
