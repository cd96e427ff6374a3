use std::hash::{Hash, Hasher};

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An ERC20-style token as the client sees it: its address, display symbol and
/// decimal precision.
///
/// Decimal precision is immutable once a token is deployed, so carrying it
/// here lets hot paths convert amounts without re-querying the chain. Two
/// tokens are equal iff their addresses are equal.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u32,
}

impl Token {
    pub fn new(address: Address, symbol: &str, decimals: u32) -> Self {
        Self { address, symbol: symbol.to_string(), decimals }
    }

    /// One whole token in base units, e.g. 10^18 for an 18-decimals token.
    pub fn base_unit(&self) -> U256 {
        U256::from(10u8).pow(U256::from(self.decimals))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}
