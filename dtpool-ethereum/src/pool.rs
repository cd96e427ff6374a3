//! Facade over one weighted base-token/datatoken pool.
//!
//! Reads feed quotes and bound checks; every mutation first re-reads the
//! relevant reserve, validates the request against the derived bound and only
//! then enters the transaction pipeline, so a call the contract would reject
//! never pays for submission.

use alloy::{primitives::Address, sol_types::SolCall};
use bigdecimal::BigDecimal;
use dtpool_common::{
    bounds::{BoundKind, BoundsConfig},
    models::{PoolInfo, SwapQuote, Token, TxHash},
    units::{from_base_units, to_base_units},
    ClientError,
};
use tracing::instrument;

use crate::{
    abi::{call_request, erc20, pool},
    rpc::EthereumRpcClient,
    tx::{Executed, TransactionExecutor, TxOptions, TxReceipt},
};

/// Precision of the pool's own fixed-point values: fee rates, weights and
/// pool shares are all reported at 18 decimals regardless of the tokens.
pub const POOL_DECIMALS: u32 = 18;

/// Parameters of an exact-in swap: spend `amount_in` of `token_in`, insist on
/// at least `min_amount_out` of `token_out`.
#[derive(Debug, Clone)]
pub struct SwapExactInSpec {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: BigDecimal,
    pub min_amount_out: BigDecimal,
    /// Upper limit on the marginal price after the swap, in the pool's
    /// fixed-point representation.
    pub max_price: BigDecimal,
    pub consume_market_fee_collector: Address,
    /// Consume-market fee rate as a decimal fraction, e.g. 0.001.
    pub consume_market_fee: BigDecimal,
}

/// Parameters of an exact-out swap: receive `amount_out` of `token_out`,
/// spending at most `max_amount_in` of `token_in`.
#[derive(Debug, Clone)]
pub struct SwapExactOutSpec {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_out: BigDecimal,
    pub max_amount_in: BigDecimal,
    pub max_price: BigDecimal,
    pub consume_market_fee_collector: Address,
    pub consume_market_fee: BigDecimal,
}

/// Confirmed result of a swap, with both legs converted back to each token's
/// display precision.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapOutcome {
    pub tx_hash: TxHash,
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
}

/// Confirmed result of a single-sided liquidity change.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityOutcome {
    pub tx_hash: TxHash,
    /// Token amount that entered or left the pool.
    pub token_amount: BigDecimal,
    /// Pool shares minted (join) or burned (exit).
    pub pool_shares: BigDecimal,
}

/// Client for a single pool contract.
///
/// Cheap to clone; holds no pool state beyond the address, every answer
/// comes from a fresh read.
#[derive(Clone)]
pub struct PoolClient {
    address: Address,
    rpc: EthereumRpcClient,
    executor: TransactionExecutor,
    bounds: BoundsConfig,
}

impl PoolClient {
    pub fn new(
        address: Address,
        rpc: EthereumRpcClient,
        executor: TransactionExecutor,
        bounds: BoundsConfig,
    ) -> Self {
        Self { address, rpc, executor, bounds }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read_at<C: SolCall>(&self, target: Address, call: C) -> Result<C::Return, ClientError> {
        let request = call_request(None, target, call.abi_encode());
        let data = self
            .rpc
            .call(&request)
            .await
            .map_err(|e| ClientError::QueryFailed(format!("{} failed: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(&data)
            .map_err(|e| ClientError::QueryFailed(format!("undecodable {} answer: {e}", C::SIGNATURE)))
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, ClientError> {
        self.read_at(self.address, call).await
    }

    /// Current reserve of `token` held by the pool, in display units.
    ///
    /// Zero is a valid answer (an unbound or drained token), not an error.
    pub async fn reserve(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        let units = self
            .read(pool::getBalanceCall { token: token.address })
            .await?;
        from_base_units(units, token.decimals)
    }

    pub async fn normalized_weight(&self, token: Address) -> Result<BigDecimal, ClientError> {
        let units = self
            .read(pool::getNormalizedWeightCall { token })
            .await?;
        from_base_units(units, POOL_DECIMALS)
    }

    pub async fn denormalized_weight(&self, token: Address) -> Result<BigDecimal, ClientError> {
        let units = self
            .read(pool::getDenormalizedWeightCall { token })
            .await?;
        from_base_units(units, POOL_DECIMALS)
    }

    /// Swap fee rate as a decimal fraction.
    pub async fn swap_fee(&self) -> Result<BigDecimal, ClientError> {
        let units = self.read(pool::getSwapFeeCall {}).await?;
        from_base_units(units, POOL_DECIMALS)
    }

    pub async fn is_finalized(&self) -> Result<bool, ClientError> {
        self.read(pool::isFinalizedCall {}).await
    }

    pub async fn controller(&self) -> Result<Address, ClientError> {
        self.read(pool::getControllerCall {}).await
    }

    pub async fn base_token(&self) -> Result<Address, ClientError> {
        self.read(pool::getBaseTokenAddressCall {})
            .await
    }

    pub async fn datatoken(&self) -> Result<Address, ClientError> {
        self.read(pool::getDatatokenAddressCall {})
            .await
    }

    /// The pool's bound tokens, base token first.
    pub async fn current_tokens(&self) -> Result<Vec<Address>, ClientError> {
        self.read(pool::getCurrentTokensCall {}).await
    }

    pub async fn protocol_fee_collector(&self) -> Result<Address, ClientError> {
        self.read(pool::getProtocolFeeCollectorCall {})
            .await
    }

    pub async fn publish_market_fee_collector(&self) -> Result<Address, ClientError> {
        self.read(pool::getPublishMarketFeeCollectorCall {})
            .await
    }

    /// Protocol fees accumulated in `token`, collectable by the protocol
    /// fee collector.
    pub async fn collectable_protocol_fee(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        let units = self
            .read(pool::getProtocolFeesCall { token: token.address })
            .await?;
        from_base_units(units, token.decimals)
    }

    /// Publish-market fees accumulated in `token`.
    pub async fn collectable_publish_market_fee(
        &self,
        token: &Token,
    ) -> Result<BigDecimal, ClientError> {
        let units = self
            .read(pool::getPublishMarketFeesCall { token: token.address })
            .await?;
        from_base_units(units, token.decimals)
    }

    /// `owner`'s wallet balance of `token`, in display units. This is the
    /// account balance, not the pool reserve.
    pub async fn balance_of(&self, token: &Token, owner: Address) -> Result<BigDecimal, ClientError> {
        let units = self
            .read_at(token.address, erc20::balanceOfCall { owner })
            .await?;
        from_base_units(units, token.decimals)
    }

    /// Amount of `token` the pool is currently approved to pull from
    /// `owner`'s account, in display units.
    pub async fn allowance(&self, token: &Token, owner: Address) -> Result<BigDecimal, ClientError> {
        let units = self
            .read_at(token.address, erc20::allowanceCall { owner, spender: self.address })
            .await?;
        from_base_units(units, token.decimals)
    }

    /// Approves the pool to spend `amount` of `token` from the sender's
    /// account. Swaps and joins pull the input token via `transferFrom`, so
    /// the allowance must cover the spend before they can succeed.
    #[instrument(level = "debug", skip(self, token, options), fields(pool = %self.address))]
    pub async fn approve(
        &self,
        token: &Token,
        amount: &BigDecimal,
        options: &TxOptions,
    ) -> Result<Executed<TxReceipt>, ClientError> {
        let calldata = erc20::approveCall {
            spender: self.address,
            value: to_base_units(amount, token.decimals)?,
        }
        .abi_encode();

        self.executor
            .execute(token.address, calldata, options)
            .await
    }

    /// Assembles the pool's static description from individual reads.
    #[instrument(level = "debug", skip(self), fields(pool = %self.address))]
    pub async fn info(&self) -> Result<PoolInfo, ClientError> {
        Ok(PoolInfo {
            address: self.address,
            controller: self.controller().await?,
            base_token: self.base_token().await?,
            datatoken: self.datatoken().await?,
            swap_fee: self.swap_fee().await?,
            finalized: self.is_finalized().await?,
            protocol_fee_collector: self.protocol_fee_collector().await?,
            publish_market_fee_collector: self
                .publish_market_fee_collector()
                .await?,
        })
    }

    async fn max_amount(&self, kind: BoundKind, token: &Token) -> Result<BigDecimal, ClientError> {
        let reserve = self.reserve(token).await?;
        Ok(self.bounds.max_amount(kind, &reserve))
    }

    /// Largest `token` amount an exact-in swap may currently spend.
    pub async fn max_swap_exact_in(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        self.max_amount(BoundKind::SwapExactIn, token)
            .await
    }

    /// Largest `token` amount an exact-out swap may currently withdraw.
    pub async fn max_swap_exact_out(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        self.max_amount(BoundKind::SwapExactOut, token)
            .await
    }

    /// Largest `token` amount a single-sided join may currently deposit.
    pub async fn max_add_liquidity(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        self.max_amount(BoundKind::AddLiquidity, token)
            .await
    }

    /// Largest `token` amount a single-sided exit may currently withdraw.
    pub async fn max_remove_liquidity(&self, token: &Token) -> Result<BigDecimal, ClientError> {
        self.max_amount(BoundKind::RemoveLiquidity, token)
            .await
    }

    async fn ensure_within(
        &self,
        kind: BoundKind,
        amount: &BigDecimal,
        token: &Token,
    ) -> Result<(), ClientError> {
        let reserve = self.reserve(token).await?;
        self.bounds
            .ensure_within(kind, amount, &reserve)
    }

    /// Quotes an exact-in swap without touching state.
    ///
    /// The returned amount is in `token_out` precision; all four fee
    /// components are charged in, and converted at, `token_in` precision.
    #[instrument(level = "debug", skip(self, token_in, token_out), fields(pool = %self.address))]
    pub async fn quote_exact_in(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: &BigDecimal,
        consume_market_fee: &BigDecimal,
    ) -> Result<SwapQuote, ClientError> {
        self.ensure_within(BoundKind::SwapExactIn, amount_in, token_in)
            .await?;

        let result = self
            .read(pool::getAmountOutExactInCall {
                tokenIn: token_in.address,
                tokenOut: token_out.address,
                tokenAmountIn: to_base_units(amount_in, token_in.decimals)?,
                consumeMarketSwapFee: to_base_units(consume_market_fee, POOL_DECIMALS)?,
            })
            .await?;

        Ok(SwapQuote {
            amount: from_base_units(result.tokenAmountOut, token_out.decimals)?,
            lp_fee: from_base_units(result.lpFee, token_in.decimals)?,
            protocol_fee: from_base_units(result.protocolFee, token_in.decimals)?,
            publish_market_fee: from_base_units(result.publishMarketFee, token_in.decimals)?,
            consume_market_fee: from_base_units(result.consumeMarketFee, token_in.decimals)?,
        })
    }

    /// Quotes an exact-out swap without touching state.
    ///
    /// The returned amount is the required input in `token_in` precision;
    /// fees are charged in `token_in` precision as well.
    #[instrument(level = "debug", skip(self, token_in, token_out), fields(pool = %self.address))]
    pub async fn quote_exact_out(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_out: &BigDecimal,
        consume_market_fee: &BigDecimal,
    ) -> Result<SwapQuote, ClientError> {
        self.ensure_within(BoundKind::SwapExactOut, amount_out, token_out)
            .await?;

        let result = self
            .read(pool::getAmountInExactOutCall {
                tokenIn: token_in.address,
                tokenOut: token_out.address,
                tokenAmountOut: to_base_units(amount_out, token_out.decimals)?,
                consumeMarketSwapFee: to_base_units(consume_market_fee, POOL_DECIMALS)?,
            })
            .await?;

        Ok(SwapQuote {
            amount: from_base_units(result.tokenAmountIn, token_in.decimals)?,
            lp_fee: from_base_units(result.lpFee, token_in.decimals)?,
            protocol_fee: from_base_units(result.protocolFee, token_in.decimals)?,
            publish_market_fee: from_base_units(result.publishMarketFee, token_in.decimals)?,
            consume_market_fee: from_base_units(result.consumeMarketFee, token_in.decimals)?,
        })
    }

    /// Swaps an exact amount of `token_in` for `token_out`.
    #[instrument(level = "debug", skip(self, spec, options), fields(pool = %self.address))]
    pub async fn swap_exact_amount_in(
        &self,
        spec: &SwapExactInSpec,
        options: &TxOptions,
    ) -> Result<Executed<SwapOutcome>, ClientError> {
        self.ensure_within(BoundKind::SwapExactIn, &spec.amount_in, &spec.token_in)
            .await?;

        let calldata = pool::swapExactAmountInCall {
            tokenIn: spec.token_in.address,
            tokenAmountIn: to_base_units(&spec.amount_in, spec.token_in.decimals)?,
            tokenOut: spec.token_out.address,
            minAmountOut: to_base_units(&spec.min_amount_out, spec.token_out.decimals)?,
            maxPrice: to_base_units(&spec.max_price, POOL_DECIMALS)?,
            consumeMarketFeeCollector: spec.consume_market_fee_collector,
            consumeMarketSwapFee: to_base_units(&spec.consume_market_fee, POOL_DECIMALS)?,
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: pool::Swapped = receipt.decode_event()?;
                Ok(SwapOutcome {
                    tx_hash: receipt.transaction_hash,
                    amount_in: from_base_units(event.tokenAmountIn, spec.token_in.decimals)?,
                    amount_out: from_base_units(event.tokenAmountOut, spec.token_out.decimals)?,
                })
            })
    }

    /// Swaps `token_in` for an exact amount of `token_out`.
    #[instrument(level = "debug", skip(self, spec, options), fields(pool = %self.address))]
    pub async fn swap_exact_amount_out(
        &self,
        spec: &SwapExactOutSpec,
        options: &TxOptions,
    ) -> Result<Executed<SwapOutcome>, ClientError> {
        self.ensure_within(BoundKind::SwapExactOut, &spec.amount_out, &spec.token_out)
            .await?;

        let calldata = pool::swapExactAmountOutCall {
            tokenIn: spec.token_in.address,
            maxAmountIn: to_base_units(&spec.max_amount_in, spec.token_in.decimals)?,
            tokenOut: spec.token_out.address,
            tokenAmountOut: to_base_units(&spec.amount_out, spec.token_out.decimals)?,
            maxPrice: to_base_units(&spec.max_price, POOL_DECIMALS)?,
            consumeMarketFeeCollector: spec.consume_market_fee_collector,
            consumeMarketSwapFee: to_base_units(&spec.consume_market_fee, POOL_DECIMALS)?,
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: pool::Swapped = receipt.decode_event()?;
                Ok(SwapOutcome {
                    tx_hash: receipt.transaction_hash,
                    amount_in: from_base_units(event.tokenAmountIn, spec.token_in.decimals)?,
                    amount_out: from_base_units(event.tokenAmountOut, spec.token_out.decimals)?,
                })
            })
    }

    /// Deposits `amount_in` of `token` single-sided, minting pool shares.
    #[instrument(level = "debug", skip(self, token, options), fields(pool = %self.address))]
    pub async fn add_liquidity(
        &self,
        token: &Token,
        amount_in: &BigDecimal,
        min_pool_shares: &BigDecimal,
        options: &TxOptions,
    ) -> Result<Executed<LiquidityOutcome>, ClientError> {
        self.ensure_within(BoundKind::AddLiquidity, amount_in, token)
            .await?;

        let calldata = pool::joinswapExternAmountInCall {
            tokenAmountIn: to_base_units(amount_in, token.decimals)?,
            minPoolAmountOut: to_base_units(min_pool_shares, POOL_DECIMALS)?,
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: pool::LiquidityAdded = receipt.decode_event()?;
                Ok(LiquidityOutcome {
                    tx_hash: receipt.transaction_hash,
                    token_amount: from_base_units(event.tokenAmountIn, token.decimals)?,
                    pool_shares: from_base_units(event.poolAmountOut, POOL_DECIMALS)?,
                })
            })
    }

    /// Withdraws exactly `amount_out` of `token` single-sided, burning at
    /// most `max_pool_shares`.
    #[instrument(level = "debug", skip(self, token, options), fields(pool = %self.address))]
    pub async fn remove_liquidity(
        &self,
        token: &Token,
        amount_out: &BigDecimal,
        max_pool_shares: &BigDecimal,
        options: &TxOptions,
    ) -> Result<Executed<LiquidityOutcome>, ClientError> {
        self.ensure_within(BoundKind::RemoveLiquidity, amount_out, token)
            .await?;

        let calldata = pool::exitswapExternAmountOutCall {
            tokenAmountOut: to_base_units(amount_out, token.decimals)?,
            maxPoolAmountIn: to_base_units(max_pool_shares, POOL_DECIMALS)?,
        }
        .abi_encode();

        self.executor
            .execute(self.address, calldata, options)
            .await?
            .try_map(|receipt| {
                let event: pool::LiquidityRemoved = receipt.decode_event()?;
                Ok(LiquidityOutcome {
                    tx_hash: receipt.transaction_hash,
                    token_amount: from_base_units(event.tokenAmountOut, token.decimals)?,
                    pool_shares: from_base_units(event.poolAmountIn, POOL_DECIMALS)?,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, sync::Arc, time::Duration};

    use alloy::{
        primitives::{address, U256},
        sol_types::SolEvent,
    };
    use bigdecimal::Zero;
    use mockito::{Matcher, Mock, ServerGuard};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        gas::{GasConfig, NodeGasPricePolicy},
        rpc::config::RpcRetryConfig,
    };

    const TX_HASH: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn base_token() -> Token {
        Token::new(address!("967da4048cd07ab37855c090aaf366e4ce1b9f48"), "BASE", 18)
    }

    fn datatoken() -> Token {
        Token::new(address!("1d4177ec9d467cbfedf6577dbd5e73bbb84a8d74"), "DT", 18)
    }

    fn pool_client(server: &ServerGuard) -> PoolClient {
        let rpc = EthereumRpcClient::new(&server.url())
            .unwrap()
            .with_retry(RpcRetryConfig::disabled());
        let gas = GasConfig::default();
        let policy = Arc::new(NodeGasPricePolicy::new(rpc.clone(), &gas));
        let executor = TransactionExecutor::new(
            rpc.clone(),
            policy,
            address!("00000000000000000000000000000000000000aa"),
            &gas,
            Duration::from_millis(1),
        );
        PoolClient::new(
            address!("00000000000000000000000000000000000000bb"),
            rpc,
            executor,
            BoundsConfig::default(),
        )
    }

    async fn mock_rpc(server: &mut ServerGuard, method: &str, result: &str) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::Regex(format!(r#""method":"{method}""#)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":{result}}}"#))
            .expect(1)
            .create_async()
            .await
    }

    fn word(value: u64) -> String {
        hex::encode(U256::from(value).to_be_bytes::<32>())
    }

    /// 1000 tokens at 18 decimals, as a bare eth_call result word.
    fn reserve_1000() -> String {
        let units = to_base_units(&dec("1000"), 18).unwrap();
        format!(r#""0x{}""#, hex::encode(units.to_be_bytes::<32>()))
    }

    fn quote_result(amounts: [&str; 5]) -> String {
        let words: String = amounts
            .iter()
            .map(|a| {
                let units = to_base_units(&dec(a), 18).unwrap();
                hex::encode(units.to_be_bytes::<32>())
            })
            .collect();
        format!(r#""0x{words}""#)
    }

    /// A request equal to the full reserve is rejected before any quote call
    /// reaches the node.
    #[tokio::test]
    async fn test_quote_of_full_reserve_exceeds_bound() {
        let mut server = mockito::Server::new_async().await;
        let balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;

        let err = pool_client(&server)
            .quote_exact_in(&base_token(), &datatoken(), &dec("1000"), &BigDecimal::zero())
            .await
            .unwrap_err();

        match err {
            ClientError::AmountExceedsBound { kind, amount, bound } => {
                assert_eq!(kind, BoundKind::SwapExactIn);
                assert_eq!(amount, dec("1000"));
                assert_eq!(bound, dec("500.0"));
            }
            other => panic!("expected AmountExceedsBound, got {other:?}"),
        }
        balance.assert_async().await;
    }

    /// A small request passes the bound check and decomposes into four
    /// non-negative fee components consistent with the gross input.
    #[tokio::test]
    async fn test_quote_exact_in_decomposes_fees() {
        let mut server = mockito::Server::new_async().await;
        let _balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;
        let _quote = mock_rpc(
            &mut server,
            "eth_call",
            &quote_result(["0.97", "0.01", "0.005", "0.01", "0.005"]),
        )
        .await;

        let quote = pool_client(&server)
            .quote_exact_in(&base_token(), &datatoken(), &dec("1"), &dec("0.005"))
            .await
            .unwrap();

        assert_eq!(quote.amount, dec("0.97"));
        assert_eq!(quote.lp_fee, dec("0.01"));
        assert_eq!(quote.protocol_fee, dec("0.005"));
        assert_eq!(quote.publish_market_fee, dec("0.01"));
        assert_eq!(quote.consume_market_fee, dec("0.005"));
        for fee in [
            &quote.lp_fee,
            &quote.protocol_fee,
            &quote.publish_market_fee,
            &quote.consume_market_fee,
        ] {
            assert!(fee >= &BigDecimal::zero());
        }
        // fees plus net output account for the gross input
        assert_eq!(quote.total_fees() + &quote.amount, dec("1"));
    }

    /// Fee components convert at the input token's precision, the gross
    /// amount at the output token's.
    #[tokio::test]
    async fn test_quote_converts_each_side_at_its_own_precision() {
        let mut server = mockito::Server::new_async().await;
        let coarse_in = Token::new(address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "USDC", 6);

        // reserve of the 6-decimals input token: 1000 * 10^6
        let _balance =
            mock_rpc(&mut server, "eth_call", &format!(r#""0x{}""#, word(1_000_000_000))).await;
        // raw integers straight from the contract: output at 18 decimals,
        // fees at 6
        let words = format!(
            r#""0x{}{}{}{}{}""#,
            hex::encode(
                to_base_units(&dec("0.97"), 18)
                    .unwrap()
                    .to_be_bytes::<32>()
            ),
            word(10_000),
            word(5_000),
            word(10_000),
            word(5_000),
        );
        let _quote = mock_rpc(&mut server, "eth_call", &words).await;

        let quote = pool_client(&server)
            .quote_exact_in(&coarse_in, &datatoken(), &dec("1"), &dec("0.005"))
            .await
            .unwrap();

        assert_eq!(quote.amount, dec("0.97"));
        assert_eq!(quote.lp_fee, dec("0.01"));
        assert_eq!(quote.protocol_fee, dec("0.005"));
    }

    #[tokio::test]
    async fn test_quote_exact_out_bound_checks_output_reserve() {
        let mut server = mockito::Server::new_async().await;
        // reserve of the output token
        let balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;

        // 1/3 of 1000 is ~333.3; 400 exceeds it
        let err = pool_client(&server)
            .quote_exact_out(&base_token(), &datatoken(), &dec("400"), &BigDecimal::zero())
            .await
            .unwrap_err();

        assert!(
            matches!(err, ClientError::AmountExceedsBound { kind: BoundKind::SwapExactOut, .. }),
            "got {err:?}"
        );
        balance.assert_async().await;
    }

    #[tokio::test]
    async fn test_reserve_zero_is_a_valid_answer() {
        let mut server = mockito::Server::new_async().await;
        let _balance = mock_rpc(&mut server, "eth_call", &format!(r#""0x{}""#, word(0))).await;

        let reserve = pool_client(&server)
            .reserve(&base_token())
            .await
            .unwrap();

        assert_eq!(reserve, BigDecimal::zero());
    }

    #[tokio::test]
    async fn test_max_swap_exact_in_derived_from_reserve() {
        let mut server = mockito::Server::new_async().await;
        let _balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;

        let max = pool_client(&server)
            .max_swap_exact_in(&base_token())
            .await
            .unwrap();

        assert_eq!(max, dec("500.0"));
    }

    /// estimate_only on a swap returns the cost estimate and never submits.
    #[tokio::test]
    async fn test_swap_estimate_only_does_not_submit() {
        let mut server = mockito::Server::new_async().await;
        let _balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;
        let _estimate = mock_rpc(&mut server, "eth_estimateGas", r#""0x30d40""#).await;

        let spec = SwapExactInSpec {
            token_in: base_token(),
            token_out: datatoken(),
            amount_in: dec("1"),
            min_amount_out: dec("0.9"),
            max_price: dec("0"),
            consume_market_fee_collector: Address::ZERO,
            consume_market_fee: dec("0.005"),
        };
        let result = pool_client(&server)
            .swap_exact_amount_in(&spec, &TxOptions::estimate_only())
            .await
            .unwrap();

        assert_eq!(result, Executed::Estimate(200_000));
    }

    /// A confirmed swap decodes the emitted event into display amounts.
    #[tokio::test]
    async fn test_swap_confirms_and_decodes_event() {
        let mut server = mockito::Server::new_async().await;
        let spec = SwapExactInSpec {
            token_in: base_token(),
            token_out: datatoken(),
            amount_in: dec("1"),
            min_amount_out: dec("0.9"),
            max_price: dec("0"),
            consume_market_fee_collector: Address::ZERO,
            consume_market_fee: dec("0.005"),
        };

        let _balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;
        let _estimate = mock_rpc(&mut server, "eth_estimateGas", r#""0x30d40""#).await;
        let _gas_price = mock_rpc(&mut server, "eth_gasPrice", r#""0x3b9aca00""#).await;
        let _send = mock_rpc(&mut server, "eth_sendTransaction", &format!(r#""{TX_HASH}""#)).await;

        let caller = address!("00000000000000000000000000000000000000aa");
        let pad = |a: Address| format!("0x000000000000000000000000{}", hex::encode(a));
        let amount_in_units = to_base_units(&dec("1"), 18).unwrap();
        let amount_out_units = to_base_units(&dec("0.97"), 18).unwrap();
        let log_data = format!(
            "0x{}{}",
            hex::encode(amount_in_units.to_be_bytes::<32>()),
            hex::encode(amount_out_units.to_be_bytes::<32>()),
        );
        let receipt = format!(
            r#"{{"transactionHash":"{TX_HASH}","status":"0x1","gasUsed":"0x30d40","contractAddress":null,"logs":[{{"address":"0x{}","topics":["{}","{}","{}","{}"],"data":"{log_data}"}}]}}"#,
            hex::encode(pool_client(&server).address()),
            pool::Swapped::SIGNATURE_HASH,
            pad(caller),
            pad(spec.token_in.address),
            pad(spec.token_out.address),
        );
        let _receipt = mock_rpc(&mut server, "eth_getTransactionReceipt", &receipt).await;

        let outcome = pool_client(&server)
            .swap_exact_amount_in(&spec, &TxOptions::default())
            .await
            .unwrap()
            .confirmed()
            .unwrap();

        assert_eq!(outcome.amount_in, dec("1"));
        assert_eq!(outcome.amount_out, dec("0.97"));
        assert_eq!(outcome.tx_hash.to_string(), TX_HASH);
    }

    /// allowance targets the token contract and reports in the token's own
    /// precision, with the pool as the spender.
    #[tokio::test]
    async fn test_allowance_reads_token_precision() {
        let mut server = mockito::Server::new_async().await;
        let usdc = Token::new(address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "USDC", 6);
        // 25 USDC at 6 decimals
        let _allowance =
            mock_rpc(&mut server, "eth_call", &format!(r#""0x{}""#, word(25_000_000))).await;

        let allowance = pool_client(&server)
            .allowance(&usdc, address!("00000000000000000000000000000000000000aa"))
            .await
            .unwrap();

        assert_eq!(allowance, dec("25"));
    }

    #[tokio::test]
    async fn test_balance_of_reads_owner_account() {
        let mut server = mockito::Server::new_async().await;
        let _balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;

        let balance = pool_client(&server)
            .balance_of(&base_token(), address!("00000000000000000000000000000000000000aa"))
            .await
            .unwrap();

        assert_eq!(balance, dec("1000"));
    }

    /// approve runs through the same pipeline as other mutations, so
    /// estimate_only costs it without submitting.
    #[tokio::test]
    async fn test_approve_estimate_only_does_not_submit() {
        let mut server = mockito::Server::new_async().await;
        let estimate = mock_rpc(&mut server, "eth_estimateGas", r#""0xc350""#).await;

        let result = pool_client(&server)
            .approve(&base_token(), &dec("100"), &TxOptions::estimate_only())
            .await
            .unwrap();

        assert_eq!(result, Executed::Estimate(50_000));
        estimate.assert_async().await;
    }

    /// An add-liquidity request over the join bound fails before submission.
    #[tokio::test]
    async fn test_add_liquidity_over_bound_never_submits() {
        let mut server = mockito::Server::new_async().await;
        let balance = mock_rpc(&mut server, "eth_call", &reserve_1000()).await;

        let err = pool_client(&server)
            .add_liquidity(&base_token(), &dec("600"), &dec("0"), &TxOptions::default())
            .await
            .unwrap_err();

        assert!(
            matches!(err, ClientError::AmountExceedsBound { kind: BoundKind::AddLiquidity, .. }),
            "got {err:?}"
        );
        balance.assert_async().await;
    }

    #[tokio::test]
    async fn test_info_assembles_pool_description() {
        let mut server = mockito::Server::new_async().await;
        let controller = address!("00000000000000000000000000000000000000c0");
        let collector = address!("00000000000000000000000000000000000000c1");
        let market = address!("00000000000000000000000000000000000000c2");
        let addr_word = |a: Address| {
            format!(r#""0x000000000000000000000000{}""#, hex::encode(a))
        };

        // reads happen in struct order: controller, base token, datatoken,
        // swap fee, finalized, protocol collector, market collector
        let _controller = mock_rpc(&mut server, "eth_call", &addr_word(controller)).await;
        let _base = mock_rpc(&mut server, "eth_call", &addr_word(base_token().address)).await;
        let _dt = mock_rpc(&mut server, "eth_call", &addr_word(datatoken().address)).await;
        let fee_units = to_base_units(&dec("0.01"), 18).unwrap();
        let _fee = mock_rpc(
            &mut server,
            "eth_call",
            &format!(r#""0x{}""#, hex::encode(fee_units.to_be_bytes::<32>())),
        )
        .await;
        let _finalized = mock_rpc(&mut server, "eth_call", &format!(r#""0x{}""#, word(1))).await;
        let _collector = mock_rpc(&mut server, "eth_call", &addr_word(collector)).await;
        let _market = mock_rpc(&mut server, "eth_call", &addr_word(market)).await;

        let info = pool_client(&server).info().await.unwrap();

        assert_eq!(
            info,
            PoolInfo {
                address: address!("00000000000000000000000000000000000000bb"),
                controller,
                base_token: base_token().address,
                datatoken: datatoken().address,
                swap_fee: dec("0.01"),
                finalized: true,
                protocol_fee_collector: collector,
                publish_market_fee_collector: market,
            }
        );
    }
}
