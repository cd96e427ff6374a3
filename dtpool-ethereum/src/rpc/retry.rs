//! Retry logic and error classification for RPC requests.

use std::time::Duration;

use alloy::{
    rpc::json_rpc::ErrorPayload,
    transports::{RpcError, TransportErrorKind},
};
use backoff::{backoff::Backoff, exponential::ExponentialBackoffBuilder, ExponentialBackoff};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::debug;

use crate::rpc::config::RpcRetryConfig;

/// Extension trait to classify [`RpcError<TransportErrorKind>`] for retries.
///
/// # Attribution
/// Adapted from alloy-transport:
/// https://github.com/alloy-rs/alloy/blob/a3899575fbc0c789275f95661516b99e9a92838d/crates/transport/src/error.rs#L156
/// License: MIT OR Apache-2.0
pub(crate) trait RetryableError {
    /// Analyzes whether to retry the request depending on the error.
    ///
    /// Returns `true` for transient errors that are likely to succeed on
    /// retry (rate limiting, service unavailable, null responses) and `false`
    /// for permanent ones (serialization errors, invalid requests, backend
    /// gone).
    fn is_retryable(&self) -> bool;

    /// Fetches the backoff hint from the error response if present.
    ///
    /// Some RPC providers include a suggested backoff duration in their rate
    /// limit responses under `data.rate.backoff_seconds`.
    fn backoff_hint(&self) -> Option<Duration>;
}

impl<E: std::borrow::Borrow<RawValue>> RetryableError for RpcError<TransportErrorKind, E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retry_err(),
            Self::SerError(_) => false,
            Self::DeserError { text, .. } => {
                if let Ok(resp) = serde_json::from_str::<ErrorPayload>(text) {
                    return resp.is_retry_err();
                }

                // some providers send invalid JSON RPC in the error case (no
                // `id:u64`), but the text should be a `JsonRpcError`
                #[derive(Deserialize)]
                struct Resp {
                    error: ErrorPayload,
                }

                if let Ok(resp) = serde_json::from_str::<Resp>(text) {
                    return resp.error.is_retry_err();
                }

                false
            }
            Self::ErrorResp(err) => err.is_retry_err(),
            Self::NullResp => true,
            _ => false,
        }
    }

    fn backoff_hint(&self) -> Option<Duration> {
        if let Self::ErrorResp(resp) = self {
            let data = resp.try_data_as::<serde_json::Value>();
            if let Some(Ok(data)) = data {
                let backoff_seconds = &data["rate"]["backoff_seconds"];
                if let Some(seconds) = backoff_seconds.as_u64() {
                    return Some(Duration::from_secs(seconds));
                }
                // round decimals up for safety
                if let Some(seconds) = backoff_seconds.as_f64() {
                    return Some(Duration::from_secs(seconds.ceil() as u64));
                }
            }
        }
        None
    }
}

/// Exponential-backoff retry policy with a hard cap on attempts.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    template: ExponentialBackoff,
    max_retries: usize,
    config: RpcRetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RpcRetryConfig::default().into()
    }
}

impl From<RpcRetryConfig> for RetryPolicy {
    fn from(config: RpcRetryConfig) -> Self {
        let template = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
            .with_multiplier(2.0)
            .with_max_interval(Duration::from_millis(config.max_backoff_ms))
            // attempts are capped by max_retries, not elapsed time
            .with_max_elapsed_time(None)
            .build();

        Self { template, max_retries: config.max_retries, config }
    }
}

impl From<&RetryPolicy> for RpcRetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        policy.config.clone()
    }
}

impl RetryPolicy {
    /// Creates a retry policy optimized for testing (very short intervals).
    #[cfg(test)]
    pub fn for_testing() -> Self {
        RpcRetryConfig::new(3, 1, 5).into()
    }

    /// Executes an RPC request, retrying transient failures with exponential
    /// backoff until `max_retries` additional attempts are exhausted.
    /// Permanent errors fail immediately.
    pub(crate) async fn retry_request<F, Fut, T>(
        &self,
        mut operation: F,
    ) -> Result<T, RpcError<TransportErrorKind>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let mut backoff = self.template.clone();
        let mut attempts = 0usize;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempts < self.max_retries && err.is_retryable() => {
                    attempts += 1;
                    let delay = err
                        .backoff_hint()
                        .or_else(|| backoff.next_backoff())
                        .unwrap_or(self.template.max_interval);
                    debug!(attempt = attempts, ?delay, error = %err, "Retrying RPC request");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy::{rpc::client::ClientBuilder, transports::HttpError};
    use mockito::{Mock, ServerGuard};
    use serde::de::Error;

    use super::*;

    async fn mock_success(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#)
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_rate_limited(server: &mut ServerGuard, hits: usize) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":429,"message":"Too Many Requests"}}"#,
            )
            .expect(hits)
            .create_async()
            .await
    }

    #[test]
    fn test_error_classification_retryable() {
        let rate_limit_err =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(HttpError {
                status: 429,
                body: "".to_string(),
            }));
        assert!(rate_limit_err.is_retryable());

        let unavailable_err =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(HttpError {
                status: 503,
                body: "".to_string(),
            }));
        assert!(unavailable_err.is_retryable());

        let null_err = RpcError::<TransportErrorKind>::NullResp;
        assert!(null_err.is_retryable());
    }

    #[test]
    fn test_error_classification_non_retryable() {
        let ser_err =
            RpcError::<TransportErrorKind>::SerError(serde_json::Error::custom("test error"));
        assert!(!ser_err.is_retryable());

        let backend_gone =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::BackendGone);
        assert!(!backend_gone.is_retryable());
    }

    #[test]
    fn test_backoff_hint_extraction() {
        let data_json = serde_json::json!({"rate": {"backoff_seconds": 2}});
        let data = serde_json::value::to_raw_value(&data_json).unwrap();

        let error_payload =
            ErrorPayload { code: -32005, message: "Rate limited".into(), data: Some(data) };

        let err = RpcError::ErrorResp(error_payload);
        assert_eq!(err.backoff_hint(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_backoff_hint_missing() {
        let error_payload = ErrorPayload { code: -32005, message: "Some error".into(), data: None };
        let err = RpcError::<TransportErrorKind>::ErrorResp(error_payload);
        assert_eq!(err.backoff_hint(), None);
    }

    /// Transient errors (429) are retried until the request succeeds.
    #[tokio::test]
    async fn test_retry_on_rate_limit_then_succeed() {
        let mut server = mockito::Server::new_async().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_clone = request_count.clone();

        let _mock_rate_limit = mock_rate_limited(&mut server, 3).await;
        let _mock_success = mock_success(&mut server).await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy = RetryPolicy::for_testing();

        let result = policy
            .retry_request(|| async {
                request_count_clone.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await;

        assert_eq!(result.unwrap(), "0xabc");
        assert_eq!(
            request_count.load(Ordering::SeqCst),
            4,
            "Expected 4 requests (3 failures + 1 success)"
        );
    }

    /// Permanent errors (400) fail immediately without retry.
    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let mut server = mockito::Server::new_async().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_clone = request_count.clone();

        let _mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid Request"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy = RetryPolicy::for_testing();

        let result = policy
            .retry_request(|| async {
                request_count_clone.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await;

        assert!(result.is_err(), "Expected immediate failure on non-retryable error");
        assert_eq!(request_count.load(Ordering::SeqCst), 1);
    }

    /// Retries stop once max_retries attempts are exhausted.
    #[tokio::test]
    async fn test_retries_exhausted() {
        let mut server = mockito::Server::new_async().await;

        // 1 initial attempt + 2 retries
        let _mock = mock_rate_limited(&mut server, 3).await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy: RetryPolicy = RpcRetryConfig::new(2, 1, 5).into();

        let result = policy
            .retry_request(|| async {
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await;

        assert!(result.is_err(), "Expected failure once retries are exhausted");
    }
}
