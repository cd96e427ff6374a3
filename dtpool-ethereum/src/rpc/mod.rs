//! Thin Ethereum JSON-RPC client used by every contract facade.

use std::time::Duration;

use alloy::{
    primitives::{Bytes, B256, U256},
    rpc::{
        client::{ClientBuilder, ReqwestClient},
        types::{BlockNumberOrTag, TransactionRequest},
    },
    transports::{http::reqwest, RpcError as TransportError, TransportErrorKind},
};
use tracing::instrument;

use crate::{tx::TxReceipt, RpcError};

pub mod config;
mod retry;

use crate::rpc::{config::RpcRetryConfig, retry::RetryPolicy};

/// Wraps a [`ReqwestClient`] with the subset of Ethereum RPC methods the
/// client needs, plus retry logic for idempotent requests.
///
/// Cheap to clone: the `inner` client holds its transport behind an Arc.
#[derive(Clone, Debug)]
pub struct EthereumRpcClient {
    inner: ReqwestClient,
    retry_policy: RetryPolicy,
    url: String,
}

impl EthereumRpcClient {
    /// Creates a new client for the given RPC URL with default retry
    /// behavior (max retries 3, initial backoff 100ms, max backoff 5000ms).
    pub fn new(rpc_url: &str) -> Result<Self, RpcError> {
        let url = rpc_url
            .parse()
            .map_err(|e| RpcError::SetupError(format!("Invalid RPC URL: {e}")))?;

        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RpcError::SetupError(format!("Failed to create HTTP client: {e}")))?;

        let inner = ClientBuilder::default().http_with_client(http_client, url);
        let retry_policy = RpcRetryConfig::default().into();

        Ok(Self { inner, retry_policy, url: rpc_url.to_string() })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_retry_config(&self) -> RpcRetryConfig {
        (&self.retry_policy).into()
    }

    pub fn with_retry(mut self, retry_config: RpcRetryConfig) -> Self {
        self.retry_policy = retry_config.into();
        self
    }

    /// Gets the current gas price in wei via `eth_gasPrice`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_gas_price(&self) -> Result<u128, RpcError> {
        let gas_price: U256 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_gasPrice")
                    .await
            })
            .await
            .map_err(|e| RpcError::from_transport("Failed to get gas price", e))?;

        Ok(gas_price.to::<u128>())
    }

    /// Executes a read-only `eth_call` against the latest block and returns
    /// the raw return data.
    #[instrument(level = "debug", skip(self, request))]
    pub async fn call(&self, request: &TransactionRequest) -> Result<Bytes, RpcError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_call", (request, BlockNumberOrTag::Latest))
                    .await
            })
            .await
            .map_err(|e| Self::map_execution_error("eth_call failed", e))
    }

    /// Asks the node to estimate the gas the given transaction would use.
    #[instrument(level = "debug", skip(self, request))]
    pub async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, RpcError> {
        let estimate: U256 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_estimateGas", (request,))
                    .await
            })
            .await
            .map_err(|e| Self::map_execution_error("eth_estimateGas failed", e))?;

        u64::try_from(estimate)
            .map_err(|_| RpcError::InvalidResponse(format!("gas estimate out of range: {estimate}")))
    }

    /// Submits a transaction for signing and broadcast by the node's managed
    /// account via `eth_sendTransaction`.
    ///
    /// Issues exactly one attempt. A resend after an ambiguous failure could
    /// double-execute the call, so retrying is left to the caller.
    #[instrument(level = "debug", skip(self, request))]
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcError> {
        self.inner
            .request("eth_sendTransaction", (request,))
            .await
            .map_err(|e| Self::map_execution_error("eth_sendTransaction failed", e))
    }

    /// Fetches the receipt for a transaction hash, `None` while pending.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TxReceipt>, RpcError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getTransactionReceipt", (tx_hash,))
                    .await
            })
            .await
            .map_err(|e| {
                RpcError::from_transport(format!("Failed to get receipt for {tx_hash}"), e)
            })
    }

    /// Polls for the receipt of `tx_hash` until the node reports one.
    ///
    /// Inclusion time is unbounded on a congested chain, so there is no
    /// client-side timeout; callers wanting one should wrap this future in
    /// `tokio::time::timeout`.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        poll_interval: Duration,
    ) -> Result<TxReceipt, RpcError> {
        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Preserves revert payloads from execution-style requests so callers can
    /// decode the reason; everything else degrades to a request error.
    fn map_execution_error(
        context: &str,
        err: TransportError<TransportErrorKind>,
    ) -> RpcError {
        if let TransportError::ErrorResp(payload) = &err {
            let message = payload.message.to_string();
            // Geth-style nodes report reverts as code 3 with ABI-encoded
            // return data; older ones only mention it in the message.
            if payload.code == 3 ||
                message
                    .to_lowercase()
                    .contains("revert")
            {
                let data = payload
                    .try_data_as::<String>()
                    .and_then(Result::ok);
                return RpcError::ExecutionReverted { message, data };
            }
        }
        RpcError::from_transport(context, err)
    }
}
