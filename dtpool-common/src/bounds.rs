//! Reserve-derived ceilings on trade and liquidity size.
//!
//! The pool contract enforces hard per-operation limits as a fraction of the
//! relevant token's reserve. Computing the same limit client-side lets a
//! request fail fast instead of paying for a submission that will revert.
//! The fractions are configuration: they must mirror the deployed contract's
//! own constants exactly, and deployments may differ per operation.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// Which per-operation limit a bound check is mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    SwapExactIn,
    SwapExactOut,
    AddLiquidity,
    RemoveLiquidity,
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundKind::SwapExactIn => "swap-exact-in",
            BoundKind::SwapExactOut => "swap-exact-out",
            BoundKind::AddLiquidity => "add-liquidity",
            BoundKind::RemoveLiquidity => "remove-liquidity",
        };
        write!(f, "{name}")
    }
}

/// The per-operation reserve fractions.
///
/// Defaults follow the weighted-pool hard limits: inbound amounts (tokens
/// entering the pool) are capped at 1/2 of the reserve, outbound amounts at
/// 1/3, both expressed as exact 18-decimal constants the way the contract
/// stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsConfig {
    pub max_swap_in_ratio: BigDecimal,
    pub max_swap_out_ratio: BigDecimal,
    pub max_add_liquidity_ratio: BigDecimal,
    pub max_remove_liquidity_ratio: BigDecimal,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        // 0.5 and 0.333333333333333333 (the contract's 1/3 at 18 decimals).
        let half = BigDecimal::new(BigInt::from(5), 1);
        let third = BigDecimal::new(BigInt::from(333_333_333_333_333_333u64), 18);
        Self {
            max_swap_in_ratio: half.clone(),
            max_swap_out_ratio: third.clone(),
            max_add_liquidity_ratio: half,
            max_remove_liquidity_ratio: third,
        }
    }
}

impl BoundsConfig {
    fn ratio(&self, kind: BoundKind) -> &BigDecimal {
        match kind {
            BoundKind::SwapExactIn => &self.max_swap_in_ratio,
            BoundKind::SwapExactOut => &self.max_swap_out_ratio,
            BoundKind::AddLiquidity => &self.max_add_liquidity_ratio,
            BoundKind::RemoveLiquidity => &self.max_remove_liquidity_ratio,
        }
    }

    /// The maximum amount the given operation may move, derived from the
    /// token's current reserve in the pool.
    ///
    /// Pure arithmetic over a snapshot: reserves change with every confirmed
    /// trade, so the result must be recomputed from a fresh reserve read
    /// immediately before each mutating call, never cached.
    pub fn max_amount(&self, kind: BoundKind, reserve: &BigDecimal) -> BigDecimal {
        reserve * self.ratio(kind)
    }

    /// Fails with [`ClientError::AmountExceedsBound`] when `amount` is larger
    /// than the derived maximum, carrying the bound for the caller to retry
    /// against.
    pub fn ensure_within(
        &self,
        kind: BoundKind,
        amount: &BigDecimal,
        reserve: &BigDecimal,
    ) -> Result<(), ClientError> {
        let bound = self.max_amount(kind, reserve);
        if amount > &bound {
            return Err(ClientError::AmountExceedsBound {
                kind,
                amount: amount.clone(),
                bound,
            });
        }
        Ok(())
    }
}
