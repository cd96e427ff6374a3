//! The estimate-then-submit pipeline every state-mutating call runs through.
//!
//! Lifecycle: build calldata, ask the node for a gas estimate (falling back
//! to a configured default if estimation fails), then either return the
//! estimate (`estimate_only`) or submit via the node's managed account and
//! poll until a receipt lands. A receipt with status 0 is replayed as a
//! read-only call to recover the revert reason before failing.

use std::{sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, Bytes, B256, U64},
    sol_types::SolEvent,
};
use dtpool_common::{traits::GasPricePolicy, ClientError};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    abi::call_request,
    gas::GasConfig,
    rpc::EthereumRpcClient,
    RpcError,
};

/// Per-call options for a mutating operation.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    /// Stop after estimation and return the gas cost without submitting.
    pub estimate_only: bool,
}

impl TxOptions {
    pub fn estimate_only() -> Self {
        Self { estimate_only: true }
    }
}

/// Outcome of a mutating operation: either the gas estimate (when the caller
/// asked for `estimate_only`) or the confirmed result.
#[derive(Debug, Clone, PartialEq)]
pub enum Executed<T> {
    Estimate(u64),
    Confirmed(T),
}

impl<T> Executed<T> {
    pub fn is_estimate(&self) -> bool {
        matches!(self, Self::Estimate(_))
    }

    pub fn estimate(&self) -> Option<u64> {
        match self {
            Self::Estimate(gas) => Some(*gas),
            Self::Confirmed(_) => None,
        }
    }

    pub fn confirmed(self) -> Option<T> {
        match self {
            Self::Estimate(_) => None,
            Self::Confirmed(value) => Some(value),
        }
    }

    pub(crate) fn try_map<U>(
        self,
        f: impl FnOnce(T) -> Result<U, ClientError>,
    ) -> Result<Executed<U>, ClientError> {
        match self {
            Self::Estimate(gas) => Ok(Executed::Estimate(gas)),
            Self::Confirmed(value) => Ok(Executed::Confirmed(f(value)?)),
        }
    }
}

/// A submitted-but-unconfirmed mutation. Held only inside the pipeline while
/// polling; it resolves to a receipt or a propagated failure, never cached.
#[derive(Debug, Clone, Copy)]
pub struct PendingTransaction {
    pub hash: B256,
}

/// A single log entry from a transaction receipt.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The confirmed receipt of a mutating call.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    /// Set when the transaction deployed a contract.
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub status: U64,
    pub gas_used: U64,
    #[serde(default)]
    pub logs: Vec<EventLog>,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == U64::from(1)
    }

    /// Extracts and decodes the first emitted event of type `E`.
    ///
    /// Fails when the receipt holds no matching log; mutating operations
    /// that promise an event payload treat its absence as an error.
    pub fn decode_event<E: SolEvent>(&self) -> Result<E, ClientError> {
        let log = self
            .logs
            .iter()
            .find(|log| log.topics.first() == Some(&E::SIGNATURE_HASH))
            .ok_or_else(|| {
                ClientError::QueryFailed(format!(
                    "event {} not found in receipt {}",
                    E::SIGNATURE,
                    self.transaction_hash
                ))
            })?;

        E::decode_raw_log(log.topics.iter().copied(), &log.data)
            .map_err(|e| ClientError::QueryFailed(format!("failed to decode {}: {e}", E::SIGNATURE)))
    }
}

/// Revert reason markers the role contracts use; any of these means the
/// sender lacked an on-chain role rather than hitting a pool limit.
const PERMISSION_MARKERS: &[&str] = &[
    "NOT MANAGER",
    "NOT OWNER",
    "ONLY MANAGER",
    "ONLY OWNER",
    "NOT ERC20DEPLOYER",
    "NOT METADATA",
    "NOT 725",
    "NOT CONTROLLER",
    "NOT MINTER",
    "NOT AUTHORIZED",
    "UNAUTHORIZED",
    "PERMISSION",
];

/// Maps a revert reason to the matching error variant.
pub(crate) fn classify_revert(reason: String, tx_hash: Option<B256>) -> ClientError {
    let upper = reason.to_uppercase();
    if PERMISSION_MARKERS
        .iter()
        .any(|marker| upper.contains(marker))
    {
        ClientError::PermissionDenied(reason)
    } else {
        ClientError::SubmissionReverted {
            tx_hash: tx_hash.map(|h| h.to_string()),
            reason,
        }
    }
}

/// Decodes the ABI payload of a solidity `Error(string)` revert.
pub(crate) fn decode_revert_reason(data: &str) -> Option<String> {
    const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).ok()?;
    // selector + offset word + length word
    if bytes.len() < 68 || bytes[..4] != ERROR_SELECTOR {
        return None;
    }
    let len = usize::try_from(u64::from_be_bytes(bytes[60..68].try_into().ok()?)).ok()?;
    let text = bytes.get(68..68 + len)?;
    String::from_utf8(text.to_vec()).ok()
}

/// Runs mutating calls through the uniform estimate-then-submit protocol.
///
/// Cheap to clone; facades for different contracts share one executor.
#[derive(Clone)]
pub struct TransactionExecutor {
    rpc: EthereumRpcClient,
    gas_policy: Arc<dyn GasPricePolicy>,
    from: Address,
    default_gas_limit: u64,
    gas_margin: u64,
    receipt_poll_interval: Duration,
}

impl TransactionExecutor {
    pub fn new(
        rpc: EthereumRpcClient,
        gas_policy: Arc<dyn GasPricePolicy>,
        from: Address,
        gas: &GasConfig,
        receipt_poll_interval: Duration,
    ) -> Self {
        Self {
            rpc,
            gas_policy,
            from,
            default_gas_limit: gas.default_gas_limit,
            gas_margin: gas.gas_margin,
            receipt_poll_interval,
        }
    }

    pub fn sender(&self) -> Address {
        self.from
    }

    /// Strict gas estimation: no default fallback, failures surface as
    /// [`ClientError::EstimationFailed`].
    pub async fn estimate(&self, to: Address, calldata: Vec<u8>) -> Result<u64, ClientError> {
        let request = call_request(Some(self.from), to, calldata);
        self.rpc
            .estimate_gas(&request)
            .await
            .map_err(|e| ClientError::EstimationFailed(e.to_string()))
    }

    /// Executes a mutating call end to end.
    ///
    /// Estimation failure is non-fatal here: the configured default gas
    /// limit keeps the submission path available when a node refuses to
    /// estimate. The submission itself is attempted exactly once.
    #[instrument(level = "debug", skip(self, calldata, options), fields(to = %to))]
    pub async fn execute(
        &self,
        to: Address,
        calldata: Vec<u8>,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        let gas_limit = match self.estimate(to, calldata.clone()).await {
            Ok(estimate) => estimate,
            Err(err) => {
                warn!(%err, default = self.default_gas_limit, "Gas estimation failed, using default limit");
                self.default_gas_limit
            }
        };

        if options.estimate_only {
            return Ok(Executed::Estimate(gas_limit));
        }

        let gas_price = self.gas_policy.fair_gas_price().await?;

        let mut request = call_request(Some(self.from), to, calldata.clone());
        request.gas = Some(gas_limit.saturating_add(self.gas_margin));
        request.gas_price = Some(gas_price);

        let hash = self
            .rpc
            .send_transaction(&request)
            .await
            .map_err(|e| match e {
                RpcError::ExecutionReverted { message, data } => {
                    let reason = data
                        .as_deref()
                        .and_then(decode_revert_reason)
                        .unwrap_or(message);
                    classify_revert(reason, None)
                }
                other => ClientError::from(other),
            })?;
        let pending = PendingTransaction { hash };
        debug!(tx_hash = %pending.hash, gas_limit, gas_price, "Transaction submitted");

        let receipt = self
            .rpc
            .wait_for_receipt(pending.hash, self.receipt_poll_interval)
            .await?;

        if receipt.succeeded() {
            debug!(tx_hash = %receipt.transaction_hash, gas_used = %receipt.gas_used, "Transaction confirmed");
            return Ok(Executed::Confirmed(receipt));
        }

        let reason = self
            .revert_reason(to, calldata)
            .await
            .unwrap_or_else(|| "reverted without a reason".to_string());
        Err(classify_revert(reason, Some(pending.hash)))
    }

    /// Replays the failed call read-only to recover the revert reason.
    async fn revert_reason(&self, to: Address, calldata: Vec<u8>) -> Option<String> {
        let request = call_request(Some(self.from), to, calldata);
        match self.rpc.call(&request).await {
            Err(RpcError::ExecutionReverted { message, data }) => Some(
                data.as_deref()
                    .and_then(decode_revert_reason)
                    .unwrap_or(message),
            ),
            // the replay sees newer state than the failed transaction did,
            // so it may well succeed; nothing to recover then
            _ => None,
        }
    }
}
