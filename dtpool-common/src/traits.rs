use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{errors::ClientError, models::Wei};

/// Supplies the gas price a submission should pay.
///
/// Queried fresh on every submission; implementations must not cache across
/// calls, since the fair price drifts with network conditions.
#[async_trait]
pub trait GasPricePolicy: Send + Sync {
    async fn fair_gas_price(&self) -> Result<Wei, ClientError>;
}

/// Resolves a token's decimal precision when the caller does not supply one.
#[async_trait]
pub trait DecimalsOracle: Send + Sync {
    async fn decimals(&self, token: Address) -> Result<u32, ClientError>;
}
