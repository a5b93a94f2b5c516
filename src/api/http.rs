//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{ApiError, Result};

/// Build the HTTP client shared by all service clients.
///
/// Every request carries the same timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rootly-migrate/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send a request and return the response on a success status.
///
/// Non-success statuses become [`ApiError::Status`] carrying the body text.
pub(super) async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = builder.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Send a request and decode a JSON body on success.
pub(super) async fn send_json<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> Result<T> {
    let response = send(builder).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Join a base URL and a path without doubling the slash.
pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
