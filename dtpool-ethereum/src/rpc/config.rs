use serde::{Deserialize, Serialize};

/// Configuration for RPC retry behavior.
///
/// Applies to idempotent requests only (reads, estimates, receipt lookups);
/// `eth_sendTransaction` is never retried by the client, since a blind resend
/// of a state-mutating call risks duplicate effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRetryConfig {
    /// Maximum number of retry attempts for failed requests (default: 3)
    pub max_retries: usize,
    /// Initial backoff delay in milliseconds (default: 100ms)
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds (default: 5000ms)
    pub max_backoff_ms: u64,
}

impl RpcRetryConfig {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self { max_retries, initial_backoff_ms, max_backoff_ms }
    }

    /// A config that disables retries entirely.
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }
}

impl Default for RpcRetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_backoff_ms: 100, max_backoff_ms: 5000 }
    }
}
