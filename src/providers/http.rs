//! Shared HTTP plumbing: client construction and retried sends.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use super::SourceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const USER_AGENT: &str = "Mozilla/5.0 (strike-selector)";
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(30);

/// Build the client every adapter uses.
pub fn build_client() -> Result<Client, SourceError> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| SourceError::Http {
            url: "client setup".to_string(),
            source,
        })
}

/// Send a request, retrying timeouts, connection failures, 429 and 5xx with
/// exponential backoff. Other statuses are returned for the caller to judge.
pub async fn send_with_retry<F>(url: &str, make: F) -> Result<Response, SourceError>
where
    F: Fn() -> RequestBuilder,
{
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(250))
        .with_max_elapsed_time(Some(MAX_RETRY_ELAPSED))
        .build();

    let make = &make;
    backoff::future::retry(policy, move || async move {
        let response = make().send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                debug!(url, error = %e, "Transient request failure, retrying");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            debug!(url, status = status.as_u16(), "Server busy, retrying");
            return response.error_for_status().map_err(backoff::Error::transient);
        }
        Ok(response)
    })
    .await
    .map_err(|source| SourceError::Http {
        url: url.to_string(),
        source,
    })
}

/// Turn a non-200 response into a [`SourceError::Status`].
pub fn ensure_ok(response: Response, what: &'static str, hint: &'static str) -> Result<Response, SourceError> {
    if response.status() != StatusCode::OK {
        return Err(SourceError::Status {
            what,
            status: response.status().as_u16(),
            hint,
        });
    }
    Ok(response)
}

/// Read a response body as text.
pub async fn read_text(response: Response) -> Result<String, SourceError> {
    let url = response.url().to_string();
    response
        .text()
        .await
        .map_err(|source| SourceError::Http { url, source })
}
