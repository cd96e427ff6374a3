use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Static description of a weighted pool: its bound token pair, the parties
/// that control it and collect its fees, and its current swap fee.
///
/// Reserves and weights are deliberately not part of this struct; they change
/// with every confirmed trade and must be read fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub address: Address,
    pub controller: Address,
    pub base_token: Address,
    pub datatoken: Address,
    /// Swap fee as a decimal fraction, e.g. 0.01 for 1%.
    pub swap_fee: BigDecimal,
    /// Once finalized, the pool's bindings and weights can no longer change.
    pub finalized: bool,
    pub protocol_fee_collector: Address,
    pub publish_market_fee_collector: Address,
}

/// The decomposed economics of one quoted swap.
///
/// `amount` is the gross result of the quote: the output amount for an
/// exact-in quote, the required input amount for an exact-out quote. The four
/// fee components are each already converted to the display precision of the
/// token they are charged in (the input-side token).
///
/// Ephemeral by design: a quote is only valid while the pool's reserves are
/// believed unchanged and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub amount: BigDecimal,
    pub lp_fee: BigDecimal,
    pub protocol_fee: BigDecimal,
    pub publish_market_fee: BigDecimal,
    pub consume_market_fee: BigDecimal,
}

impl SwapQuote {
    /// Sum of all four fee components.
    pub fn total_fees(&self) -> BigDecimal {
        &self.lp_fee + &self.protocol_fee + &self.publish_market_fee + &self.consume_market_fee
    }
}

/// The roles a user holds on a data-NFT, as reported by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RolePermissions {
    pub manager: bool,
    pub deploy_datatoken: bool,
    pub update_metadata: bool,
    pub store: bool,
}

impl RolePermissions {
    pub fn has_any(&self) -> bool {
        self.manager || self.deploy_datatoken || self.update_metadata || self.store
    }
}

/// A registered datatoken template on the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTemplate {
    pub address: Address,
    pub is_active: bool,
}
