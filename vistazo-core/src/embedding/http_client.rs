//! JSON-over-HTTP client with retry and exponential backoff.

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, VistazoError};

#[derive(Clone)]
pub struct VectorHttpConfig {
    /// Per-request timeout; retries stop once `timeout * max_retries` has
    /// elapsed.
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Sent as `Authorization: Bearer ...` when set.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for VectorHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorHttpConfig")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("initial_interval", &self.initial_interval)
            .field("max_interval", &self.max_interval)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for VectorHttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(2),
            bearer_token: None,
        }
    }
}

pub struct VectorHttpClient {
    client: Client,
    config: VectorHttpConfig,
}

impl VectorHttpClient {
    pub fn new(config: VectorHttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                VistazoError::VectorSearchError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// POST `body` as JSON and parse the JSON response, retrying transient
    /// failures.
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        retry_notify(
            self.build_backoff(),
            || async move { self.post_once(url, body).await },
            |err: VistazoError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn post_once<B, R>(
        &self,
        url: &str,
        body: &B,
    ) -> std::result::Result<R, backoff::Error<VistazoError>>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let start = Instant::now();

        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(VistazoError::VectorSearchError(format!(
                    "Transient error (will retry): {e}"
                )))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(VistazoError::HttpError(e))
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let latency_ms = start.elapsed().as_millis() as u64;
            let err = VistazoError::VectorSearchError(format!(
                "vector search service returned status: {status}"
            ));
            return if is_transient_status(status) {
                warn!(status = %status, latency_ms, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, latency_ms, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: R = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse JSON response");
            backoff::Error::permanent(VistazoError::VectorSearchError(format!(
                "Failed to parse vector search response: {e}"
            )))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );
        Ok(parsed)
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries.max(1)),
            ..Default::default()
        }
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = VectorHttpConfig {
            bearer_token: Some("secret-token".into()),
            ..VectorHttpConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_backoff_budget_scales_with_retries() {
        let client = VectorHttpClient::new(VectorHttpConfig {
            timeout: Duration::from_secs(2),
            max_retries: 4,
            ..VectorHttpConfig::default()
        })
        .unwrap();
        let backoff = client.build_backoff();
        assert_eq!(backoff.max_elapsed_time, Some(Duration::from_secs(8)));
        assert_eq!(backoff.initial_interval, Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let client = VectorHttpClient::new(VectorHttpConfig {
            timeout: Duration::from_millis(200),
            max_retries: 1,
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(20),
            bearer_token: None,
        })
        .unwrap();
        let result: Result<serde_json::Value> = client
            .post_json("http://127.0.0.1:9/neighbors", &serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }
}
