//! EVM-facing half of the dtpool client.
//!
//! Wraps a JSON-RPC node behind [`rpc::EthereumRpcClient`], runs every
//! state-mutating call through the estimate-then-submit pipeline in [`tx`],
//! and exposes contract facades for the weighted pool ([`pool`]), the
//! data-NFT ([`nft`]) and the factory ([`factory`]). Construction starts at
//! [`client::DtpoolClient`].

pub mod abi;
pub mod client;
pub mod factory;
pub mod gas;
pub mod nft;
pub mod pool;
pub mod rpc;
pub mod tx;
pub mod units;

use dtpool_common::ClientError;
use thiserror::Error;

pub use client::{ClientConfig, DtpoolClient};
pub use tx::{Executed, TxOptions, TxReceipt};

/// Transport-level failures, below the user-facing [`ClientError`] taxonomy.
///
/// Read paths convert these into [`ClientError::QueryFailed`]; the
/// transaction pipeline maps them per state (estimation vs. submission).
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC setup error: {0}")]
    SetupError(String),
    #[error("request error: {0}")]
    RequestError(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    /// The node rejected an `eth_call` or `eth_estimateGas` because the
    /// underlying execution reverted. `data` carries the raw ABI-encoded
    /// revert payload when the node supplied one.
    #[error("execution reverted: {message}")]
    ExecutionReverted { message: String, data: Option<String> },
}

impl RpcError {
    pub(crate) fn from_transport(
        context: impl std::fmt::Display,
        err: alloy::transports::RpcError<alloy::transports::TransportErrorKind>,
    ) -> Self {
        Self::RequestError(format!("{context}: {err}"))
    }
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        ClientError::QueryFailed(err.to_string())
    }
}
