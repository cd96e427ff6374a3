//! Facade over a data-NFT contract: role queries, role mutations and
//! datatoken deployment.
//!
//! The role state machine itself lives on-chain. This layer never
//! re-validates permissions client-side; a refused call surfaces as
//! [`ClientError::PermissionDenied`] with the contract's own reason.

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use bigdecimal::BigDecimal;
use dtpool_common::{models::RolePermissions, units::to_base_units, ClientError};
use tracing::instrument;

use crate::{
    abi::{call_request, nft},
    rpc::EthereumRpcClient,
    tx::{Executed, TransactionExecutor, TxOptions, TxReceipt},
};

/// Parameters for deploying a datatoken from the NFT.
#[derive(Debug, Clone)]
pub struct DatatokenParams {
    pub template_index: u64,
    pub name: String,
    pub symbol: String,
    /// Maximum supply in display units; datatokens use 18 decimals.
    pub cap: BigDecimal,
    pub minter: Address,
}

/// Client for a single data-NFT contract.
#[derive(Clone)]
pub struct NftClient {
    address: Address,
    rpc: EthereumRpcClient,
    executor: TransactionExecutor,
}

impl NftClient {
    pub fn new(address: Address, rpc: EthereumRpcClient, executor: TransactionExecutor) -> Self {
        Self { address, rpc, executor }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Roles `user` currently holds on this NFT.
    #[instrument(level = "debug", skip(self), fields(nft = %self.address))]
    pub async fn permissions(&self, user: Address) -> Result<RolePermissions, ClientError> {
        let request = call_request(None, self.address, nft::getPermissionsCall { user }.abi_encode());
        let data = self
            .rpc
            .call(&request)
            .await
            .map_err(|e| ClientError::QueryFailed(format!("getPermissions failed: {e}")))?;
        let perms = nft::getPermissionsCall::abi_decode_returns(&data)
            .map_err(|e| ClientError::QueryFailed(format!("undecodable permissions answer: {e}")))?;

        Ok(RolePermissions {
            manager: perms.manager,
            deploy_datatoken: perms.deployERC20,
            update_metadata: perms.updateMetadata,
            store: perms.store,
        })
    }

    async fn mutate<C: SolCall>(
        &self,
        call: C,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.executor
            .execute(self.address, call.abi_encode(), options)
            .await
    }

    pub async fn add_manager(
        &self,
        manager: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::addManagerCall { manager }, options)
            .await
    }

    pub async fn remove_manager(
        &self,
        manager: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::removeManagerCall { manager }, options)
            .await
    }

    /// Grants `account` the right to deploy datatokens from this NFT.
    pub async fn grant_deploy_datatoken(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::addToCreateERC20ListCall { account }, options)
            .await
    }

    pub async fn revoke_deploy_datatoken(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::removeFromCreateERC20ListCall { account }, options)
            .await
    }

    pub async fn grant_update_metadata(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::addToMetadataListCall { account }, options)
            .await
    }

    pub async fn revoke_update_metadata(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::removeFromMetadataListCall { account }, options)
            .await
    }

    pub async fn grant_store(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::addTo725StoreListCall { account }, options)
            .await
    }

    pub async fn revoke_store(
        &self,
        account: Address,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::removeFrom725StoreListCall { account }, options)
            .await
    }

    /// Revokes every role from every holder except the NFT owner.
    pub async fn clean_permissions(
        &self,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        self.mutate(nft::cleanPermissionsCall {}, options)
            .await
    }

    /// Deploys a new datatoken bound to this NFT and returns its address
    /// from the creation event.
    #[instrument(level = "debug", skip(self, params, options), fields(nft = %self.address, name = %params.name))]
    pub async fn create_datatoken(
        &self,
        params: &DatatokenParams,
        options: &TxOptions,
    ) -> Result<Executed<Address>, ClientError> {
        let calldata = nft::createERC20Call {
            templateIndex: U256::from(params.template_index),
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            cap: to_base_units(&params.cap, 18)?,
            minter: params.minter,
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: nft::TokenCreated = receipt.decode_event()?;
                Ok(event.newTokenAddress)
            })
    }
}
