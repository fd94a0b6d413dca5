/// Blocking HTTP helpers shared by the hosted-service clients.
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{RagError, Result};

const USER_AGENT: &str = concat!("vaultrag/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| RagError::service(format!("HTTP client build failed: {e}")))
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// POST `body` as JSON with a bearer token and decode the JSON response.
///
/// `service` names the remote in error messages.
pub fn post_json<B, R>(client: &Client, url: &str, api_key: &str, service: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let resp = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .map_err(|e| RagError::service(format!("{service} request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(RagError::service(format!(
            "{service} returned {status}: {}",
            text.trim()
        )));
    }

    resp.json()
        .map_err(|e| RagError::service(format!("failed to parse {service} response: {e}")))
}
