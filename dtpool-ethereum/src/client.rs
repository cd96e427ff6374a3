//! Top-level client construction and configuration.

use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;
use dtpool_common::{bounds::BoundsConfig, traits::GasPricePolicy, ClientError};
use serde::{Deserialize, Serialize};

use crate::{
    factory::FactoryClient,
    gas::{GasConfig, NodeGasPricePolicy},
    nft::NftClient,
    pool::PoolClient,
    rpc::{config::RpcRetryConfig, EthereumRpcClient},
    tx::TransactionExecutor,
    units::UnitConverter,
};

fn default_receipt_poll_interval_ms() -> u64 {
    3000
}

/// Everything needed to build a [`DtpoolClient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// HTTP JSON-RPC endpoint of a node that manages the sender's key.
    pub rpc_url: String,
    /// Account transactions are sent from.
    pub from: Address,
    #[serde(default)]
    pub retry: RpcRetryConfig,
    #[serde(default)]
    pub gas: GasConfig,
    /// Must mirror the deployed pool contract's own limits.
    #[serde(default)]
    pub bounds: BoundsConfig,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

impl ClientConfig {
    pub fn new(rpc_url: &str, from: Address) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            from,
            retry: RpcRetryConfig::default(),
            gas: GasConfig::default(),
            bounds: BoundsConfig::default(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

/// Entry point of the library: hands out contract facades that share one
/// RPC connection and one transaction pipeline.
#[derive(Clone)]
pub struct DtpoolClient {
    rpc: EthereumRpcClient,
    executor: TransactionExecutor,
    converter: UnitConverter,
    bounds: BoundsConfig,
}

impl DtpoolClient {
    /// Builds a client pricing gas from the node via [`NodeGasPricePolicy`].
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let rpc = EthereumRpcClient::new(&config.rpc_url)?.with_retry(config.retry.clone());
        let policy = Arc::new(NodeGasPricePolicy::new(rpc.clone(), &config.gas));
        Ok(Self::with_gas_policy(config, rpc, policy))
    }

    /// Builds a client with a caller-supplied gas price policy.
    pub fn with_gas_policy(
        config: &ClientConfig,
        rpc: EthereumRpcClient,
        policy: Arc<dyn GasPricePolicy>,
    ) -> Self {
        let executor = TransactionExecutor::new(
            rpc.clone(),
            policy,
            config.from,
            &config.gas,
            Duration::from_millis(config.receipt_poll_interval_ms),
        );
        let converter = UnitConverter::new(rpc.clone());
        Self { rpc, executor, converter, bounds: config.bounds.clone() }
    }

    /// Facade for the pool at `address`.
    pub fn pool(&self, address: Address) -> PoolClient {
        PoolClient::new(address, self.rpc.clone(), self.executor.clone(), self.bounds.clone())
    }

    /// Facade for the data-NFT at `address`.
    pub fn nft(&self, address: Address) -> NftClient {
        NftClient::new(address, self.rpc.clone(), self.executor.clone())
    }

    /// Facade for the factory at `address`.
    pub fn factory(&self, address: Address) -> FactoryClient {
        FactoryClient::new(address, self.rpc.clone(), self.executor.clone())
    }

    /// Unit conversion with on-chain decimals discovery.
    pub fn units(&self) -> &UnitConverter {
        &self.converter
    }

    pub fn sender(&self) -> Address {
        self.executor.sender()
    }
}
