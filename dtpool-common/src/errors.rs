use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::bounds::BoundKind;

/// User-facing errors of the dtpool client.
///
/// Every operation returns a typed, distinguishable failure instead of a null
/// or empty value, so callers can always tell "it failed" apart from "the
/// answer really is zero/empty".
///
/// Variants:
/// - `InvalidDecimals`: a decimal-precision input or on-chain query produced
///   something that cannot be used for conversion.
/// - `InvalidAmount`: a requested amount is negative or does not fit the
///   256-bit base-unit representation.
/// - `AmountExceedsBound`: the request is larger than the reserve-derived
///   maximum the pool itself would accept. Carries the computed bound so the
///   caller can retry with a valid value.
/// - `QueryFailed`: a read-only contract call failed.
/// - `EstimationFailed`: gas estimation failed. The transaction pipeline
///   recovers from this locally with a configured default; it only surfaces
///   through the strict estimation entry point.
/// - `SubmissionReverted`: the chain rejected a submitted transaction.
///   Carries the revert reason when one could be extracted.
/// - `PermissionDenied`: the contract refused the call because the sender
///   lacks an on-chain role. Passed through as reported, never re-validated
///   client-side.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid decimals: {0}")]
    InvalidDecimals(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount {amount} exceeds the {kind} bound of {bound}")]
    AmountExceedsBound { kind: BoundKind, amount: BigDecimal, bound: BigDecimal },

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("gas estimation failed: {0}")]
    EstimationFailed(String),

    #[error("transaction reverted: {reason}")]
    SubmissionReverted { tx_hash: Option<String>, reason: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl ClientError {
    /// True if the failure is an on-chain rejection of a submitted mutation
    /// (as opposed to a client-side validation or transport problem).
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::SubmissionReverted { .. } | Self::PermissionDenied(_))
    }
}
