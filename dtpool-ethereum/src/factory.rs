//! Facade over the factory contract: data-NFT deployment and datatoken
//! template management.

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use dtpool_common::{models::TokenTemplate, ClientError};
use tracing::instrument;

use crate::{
    abi::{call_request, factory},
    rpc::EthereumRpcClient,
    tx::{Executed, TransactionExecutor, TxOptions, TxReceipt},
};

/// Parameters for deploying a new data-NFT.
#[derive(Debug, Clone)]
pub struct DataNftParams {
    pub name: String,
    pub symbol: String,
    pub template_index: u64,
    pub token_uri: String,
}

/// Client for the factory contract.
#[derive(Clone)]
pub struct FactoryClient {
    address: Address,
    rpc: EthereumRpcClient,
    executor: TransactionExecutor,
}

impl FactoryClient {
    pub fn new(address: Address, rpc: EthereumRpcClient, executor: TransactionExecutor) -> Self {
        Self { address, rpc, executor }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, ClientError> {
        let request = call_request(None, self.address, call.abi_encode());
        let data = self
            .rpc
            .call(&request)
            .await
            .map_err(|e| ClientError::QueryFailed(format!("{} failed: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(&data)
            .map_err(|e| ClientError::QueryFailed(format!("undecodable {} answer: {e}", C::SIGNATURE)))
    }

    /// Deploys a new data-NFT and returns its address from the creation
    /// event.
    #[instrument(level = "debug", skip(self, params, options), fields(factory = %self.address, name = %params.name))]
    pub async fn deploy_data_nft(
        &self,
        params: &DataNftParams,
        options: &TxOptions,
    ) -> Result<Executed<Address>, ClientError> {
        let calldata = factory::deployERC721ContractCall {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            templateIndex: U256::from(params.template_index),
            tokenURI: params.token_uri.clone(),
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: factory::NFTCreated = receipt.decode_event()?;
                Ok(event.newTokenAddress)
            })
    }

    /// Registers a new datatoken template and returns its index.
    #[instrument(level = "debug", skip(self, options), fields(factory = %self.address))]
    pub async fn add_token_template(
        &self,
        template: Address,
        options: &TxOptions,
    ) -> Result<Executed<u64>, ClientError> {
        let calldata = factory::addTokenTemplateCall { templateAddress: template }.abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: factory::TemplateAdded = receipt.decode_event()?;
                u64::try_from(event.index).map_err(|_| {
                    ClientError::QueryFailed(format!(
                        "template index out of range: {}",
                        event.index
                    ))
                })
            })
    }

    pub async fn disable_token_template(
        &self,
        index: u64,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        let calldata = factory::disableTokenTemplateCall { index: U256::from(index) }.abi_encode();
        self.executor
            .execute(self.address, calldata, options)
            .await
    }

    pub async fn reactivate_token_template(
        &self,
        index: u64,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        let calldata =
            factory::reactivateTokenTemplateCall { index: U256::from(index) }.abi_encode();
        self.executor
            .execute(self.address, calldata, options)
            .await
    }

    /// Looks up a registered datatoken template by index.
    pub async fn token_template(&self, index: u64) -> Result<TokenTemplate, ClientError> {
        let result = self
            .read(factory::getTokenTemplateCall { index: U256::from(index) })
            .await?;
        Ok(TokenTemplate { address: result.templateAddress, is_active: result.isActive })
    }

    /// Number of registered datatoken templates.
    pub async fn template_count(&self) -> Result<u64, ClientError> {
        let count = self
            .read(factory::getCurrentTemplateCountCall {})
            .await?;
        u64::try_from(count)
            .map_err(|_| ClientError::QueryFailed(format!("template count out of range: {count}")))
    }
}
