//! Gas pricing for submissions.

use async_trait::async_trait;
use dtpool_common::{
    models::Wei,
    traits::GasPricePolicy,
    ClientError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rpc::EthereumRpcClient;

/// Gas parameters of the transaction pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasConfig {
    /// Gas limit used when the node refuses to estimate.
    pub default_gas_limit: u64,
    /// Fixed safety margin added on top of every estimate.
    pub gas_margin: u64,
    /// Multiplier applied to the node-reported gas price, in basis points.
    /// 11_000 pays 10% over the node's answer.
    pub price_multiplier_bps: u32,
    /// Hard ceiling on the gas price in wei, if any.
    pub max_gas_price: Option<Wei>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: 1_000_000,
            gas_margin: 25_000,
            price_multiplier_bps: 11_000,
            max_gas_price: None,
        }
    }
}

/// Prices every submission from a fresh `eth_gasPrice` read, scaled by the
/// configured multiplier and clamped to the ceiling.
#[derive(Clone, Debug)]
pub struct NodeGasPricePolicy {
    rpc: EthereumRpcClient,
    price_multiplier_bps: u32,
    max_gas_price: Option<Wei>,
}

impl NodeGasPricePolicy {
    pub fn new(rpc: EthereumRpcClient, config: &GasConfig) -> Self {
        Self {
            rpc,
            price_multiplier_bps: config.price_multiplier_bps,
            max_gas_price: config.max_gas_price,
        }
    }
}

#[async_trait]
impl GasPricePolicy for NodeGasPricePolicy {
    async fn fair_gas_price(&self) -> Result<Wei, ClientError> {
        let node_price = self.rpc.get_gas_price().await?;

        let mut price = node_price
            .saturating_mul(self.price_multiplier_bps as u128) /
            10_000;
        if let Some(cap) = self.max_gas_price {
            price = price.min(cap);
        }
        debug!(node_price, price, "Resolved gas price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, ServerGuard};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rpc::config::RpcRetryConfig;

    async fn mock_gas_price(server: &mut ServerGuard, wei_hex: &str) {
        server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method":"eth_gasPrice""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":"{wei_hex}"}}"#))
            .expect(1)
            .create_async()
            .await;
    }

    fn policy(server: &ServerGuard, config: &GasConfig) -> NodeGasPricePolicy {
        let rpc = EthereumRpcClient::new(&server.url())
            .unwrap()
            .with_retry(RpcRetryConfig::disabled());
        NodeGasPricePolicy::new(rpc, config)
    }

    #[tokio::test]
    async fn test_multiplier_applied() {
        let mut server = mockito::Server::new_async().await;
        // 1 gwei
        mock_gas_price(&mut server, "0x3b9aca00").await;

        let price = policy(&server, &GasConfig::default())
            .fair_gas_price()
            .await
            .unwrap();

        assert_eq!(price, 1_100_000_000);
    }

    #[tokio::test]
    async fn test_cap_enforced() {
        let mut server = mockito::Server::new_async().await;
        mock_gas_price(&mut server, "0x3b9aca00").await;

        let config = GasConfig { max_gas_price: Some(1_000_000_000), ..Default::default() };
        let price = policy(&server, &config)
            .fair_gas_price()
            .await
            .unwrap();

        assert_eq!(price, 1_000_000_000);
    }
}
