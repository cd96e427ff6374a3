//! On-chain decimals discovery layered over the pure unit conversions.

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use dtpool_common::{
    traits::DecimalsOracle,
    units::{from_base_units, to_base_units, MAX_DECIMALS},
    ClientError,
};
use tracing::{instrument, warn};

use crate::{
    abi::{call_request, erc20},
    rpc::EthereumRpcClient,
};

/// Precision assumed for tokens that expose no `decimals()` function.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Converts between display amounts and base units, resolving each token's
/// precision from the chain unless the caller supplies an override.
#[derive(Clone, Debug)]
pub struct UnitConverter {
    rpc: EthereumRpcClient,
}

impl UnitConverter {
    pub fn new(rpc: EthereumRpcClient) -> Self {
        Self { rpc }
    }

    /// Resolves the precision to use for `token`.
    ///
    /// An override wins when given; otherwise the token's `decimals()` is
    /// queried. Only a token without the function at all (empty return data)
    /// falls back to [`DEFAULT_DECIMALS`]; a failed query or undecodable
    /// answer is an error, since a silently wrong precision mis-scales every
    /// amount derived from it.
    pub async fn resolve_decimals(
        &self,
        token: Address,
        decimals_override: Option<u32>,
    ) -> Result<u32, ClientError> {
        match decimals_override {
            Some(decimals) if decimals > MAX_DECIMALS => Err(ClientError::InvalidDecimals(
                format!("{decimals} exceeds the supported maximum of {MAX_DECIMALS}"),
            )),
            Some(decimals) => Ok(decimals),
            None => self.query_decimals(token).await,
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn query_decimals(&self, token: Address) -> Result<u32, ClientError> {
        let request = call_request(None, token, erc20::decimalsCall {}.abi_encode());
        let data = self
            .rpc
            .call(&request)
            .await
            .map_err(|e| {
                ClientError::InvalidDecimals(format!("decimals query for {token} failed: {e}"))
            })?;

        if data.is_empty() {
            warn!(%token, "Token exposes no decimals function, assuming {DEFAULT_DECIMALS}");
            return Ok(DEFAULT_DECIMALS);
        }

        // validating decode: a word that does not fit u8 (e.g. 1024) must
        // error, not truncate to a wrong precision
        let decimals = erc20::decimalsCall::abi_decode_returns_validate(&data).map_err(|e| {
            ClientError::InvalidDecimals(format!("undecodable decimals answer from {token}: {e}"))
        })?;
        Ok(decimals as u32)
    }

    /// Converts a display amount of `token` to integer base units.
    pub async fn to_units(
        &self,
        token: Address,
        amount: &BigDecimal,
        decimals_override: Option<u32>,
    ) -> Result<U256, ClientError> {
        let decimals = self
            .resolve_decimals(token, decimals_override)
            .await?;
        to_base_units(amount, decimals)
    }

    /// Converts integer base units of `token` back to a display amount.
    pub async fn to_amount(
        &self,
        token: Address,
        units: U256,
        decimals_override: Option<u32>,
    ) -> Result<BigDecimal, ClientError> {
        let decimals = self
            .resolve_decimals(token, decimals_override)
            .await?;
        from_base_units(units, decimals)
    }
}

#[async_trait]
impl DecimalsOracle for UnitConverter {
    async fn decimals(&self, token: Address) -> Result<u32, ClientError> {
        self.query_decimals(token).await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy::primitives::address;
    use mockito::{Matcher, Mock, ServerGuard};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rpc::config::RpcRetryConfig;

    fn converter(server: &ServerGuard) -> UnitConverter {
        let rpc = EthereumRpcClient::new(&server.url())
            .unwrap()
            .with_retry(RpcRetryConfig::disabled());
        UnitConverter::new(rpc)
    }

    fn token() -> Address {
        address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
    }

    async fn mock_call(server: &mut ServerGuard, result: &str) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method":"eth_call""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":{result}}}"#))
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_override_skips_query() {
        let server = mockito::Server::new_async().await;
        // no mock registered: any request would error and fail the test
        let decimals = converter(&server)
            .resolve_decimals(token(), Some(6))
            .await
            .unwrap();
        assert_eq!(decimals, 6);
    }

    #[tokio::test]
    async fn test_override_above_maximum_rejected() {
        let server = mockito::Server::new_async().await;
        let err = converter(&server)
            .resolve_decimals(token(), Some(78))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidDecimals(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_queried_decimals_used_for_conversion() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_call(
            &mut server,
            r#""0x0000000000000000000000000000000000000000000000000000000000000006""#,
        )
        .await;

        let units = converter(&server)
            .to_units(token(), &BigDecimal::from_str("1.5").unwrap(), None)
            .await
            .unwrap();

        assert_eq!(units, U256::from(1_500_000u64));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_decimals_function_defaults_to_18() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_call(&mut server, r#""0x""#).await;

        let decimals = converter(&server)
            .resolve_decimals(token(), None)
            .await
            .unwrap();

        assert_eq!(decimals, DEFAULT_DECIMALS);
    }

    #[tokio::test]
    async fn test_failed_query_is_an_error_not_a_default() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method":"eth_call""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32602,"message":"invalid argument"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = converter(&server)
            .resolve_decimals(token(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidDecimals(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_undecodable_decimals_rejected() {
        let mut server = mockito::Server::new_async().await;
        // 1024 does not fit u8
        let _mock = mock_call(
            &mut server,
            r#""0x0000000000000000000000000000000000000000000000000000000000000400""#,
        )
        .await;

        let err = converter(&server)
            .resolve_decimals(token(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidDecimals(_)), "got {err:?}");
    }
}
