use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::retry_policy::{retry_after_from_headers, RetryPolicy};

/// Zero-based send counter attached to every request.
pub const RETRY_ATTEMPT_HEADER: &str = "x-herald-retry-attempt";
const ERROR_BODY_MAX_CHARS: usize = 800;

/// A `reqwest::Client` with a request timeout plus the retry loop for one API.
#[derive(Debug, Clone)]
pub struct JsonTransport {
    http: reqwest::Client,
    service: &'static str,
    policy: RetryPolicy,
}

impl JsonTransport {
    /// `service` names the API in logs and errors (`slack`, `github`).
    pub fn new(
        service: &'static str,
        default_headers: HeaderMap,
        request_timeout_ms: u64,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .with_context(|| format!("failed to create {service} http client"))?;
        Ok(Self {
            http,
            service,
            policy,
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send the request `build` produces and decode a successful JSON body.
    ///
    /// `build` runs once per attempt. Non-success statuses fail with the
    /// status and a trimmed body unless the policy allows another attempt.
    pub async fn send_json<T, F>(&self, operation: &str, mut build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let service = self.service;
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let sent = build()
                .header(RETRY_ATTEMPT_HEADER, (attempt - 1).to_string())
                .send()
                .await;
            let response = match sent {
                Ok(response) => response,
                Err(error) => {
                    if self.policy.allows_retry_after(attempt)
                        && RetryPolicy::is_retryable_error(&error)
                    {
                        debug!(
                            service,
                            operation,
                            attempt,
                            error = %error,
                            "retrying after transport error"
                        );
                        tokio::time::sleep(self.policy.delay_before_retry(attempt, None)).await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("{service} api {operation} request failed"));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .with_context(|| format!("failed to decode {service} {operation} response"));
            }
            let retry_after = retry_after_from_headers(response.headers());
            let body = response.text().await.unwrap_or_default();
            if self.policy.allows_retry_after(attempt) && RetryPolicy::is_retryable_status(status)
            {
                debug!(
                    service,
                    operation,
                    attempt,
                    status = status.as_u16(),
                    "retrying after retryable status"
                );
                tokio::time::sleep(self.policy.delay_before_retry(attempt, retry_after)).await;
                continue;
            }
            bail!(
                "{service} api {operation} failed with status {}: {}",
                status.as_u16(),
                error_excerpt(&body, ERROR_BODY_MAX_CHARS)
            );
        }
    }
}

/// First `max_chars` characters of an error body, marked when cut.
pub fn error_excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
