//! Contract interface definitions and calldata helpers.
//!
//! Each on-chain contract gets its own module so generated call and event
//! types cannot collide across interfaces.

use alloy::{
    primitives::Address,
    rpc::types::{TransactionInput, TransactionRequest},
};

/// ERC20 subset needed for precision discovery, balance reads and pool
/// spending approvals.
pub mod erc20 {
    use alloy::core::sol;

    sol! {
        function decimals() public view returns (uint8);
        function balanceOf(address owner) public view returns (uint256 balance);
        function approve(address spender, uint256 value) public returns (bool success);
        function allowance(address owner, address spender) public view returns (uint256 remaining);
    }
}

/// The weighted pool holding a base-token/datatoken pair.
pub mod pool {
    use alloy::core::sol;

    sol! {
        function getBalance(address token) public view returns (uint256);
        function getNormalizedWeight(address token) public view returns (uint256);
        function getDenormalizedWeight(address token) public view returns (uint256);
        function getSwapFee() public view returns (uint256);
        function isFinalized() public view returns (bool);
        function getController() public view returns (address);
        function getBaseTokenAddress() public view returns (address);
        function getDatatokenAddress() public view returns (address);
        function getCurrentTokens() public view returns (address[] memory);
        function getProtocolFeeCollector() public view returns (address);
        function getPublishMarketFeeCollector() public view returns (address);
        function getProtocolFees(address token) public view returns (uint256);
        function getPublishMarketFees(address token) public view returns (uint256);

        function getAmountOutExactIn(
            address tokenIn,
            address tokenOut,
            uint256 tokenAmountIn,
            uint256 consumeMarketSwapFee
        ) public view returns (
            uint256 tokenAmountOut,
            uint256 lpFee,
            uint256 protocolFee,
            uint256 publishMarketFee,
            uint256 consumeMarketFee
        );
        function getAmountInExactOut(
            address tokenIn,
            address tokenOut,
            uint256 tokenAmountOut,
            uint256 consumeMarketSwapFee
        ) public view returns (
            uint256 tokenAmountIn,
            uint256 lpFee,
            uint256 protocolFee,
            uint256 publishMarketFee,
            uint256 consumeMarketFee
        );

        function swapExactAmountIn(
            address tokenIn,
            uint256 tokenAmountIn,
            address tokenOut,
            uint256 minAmountOut,
            uint256 maxPrice,
            address consumeMarketFeeCollector,
            uint256 consumeMarketSwapFee
        ) public returns (uint256 tokenAmountOut, uint256 spotPriceAfter);
        function swapExactAmountOut(
            address tokenIn,
            uint256 maxAmountIn,
            address tokenOut,
            uint256 tokenAmountOut,
            uint256 maxPrice,
            address consumeMarketFeeCollector,
            uint256 consumeMarketSwapFee
        ) public returns (uint256 tokenAmountIn, uint256 spotPriceAfter);
        function joinswapExternAmountIn(
            uint256 tokenAmountIn,
            uint256 minPoolAmountOut
        ) public returns (uint256 poolAmountOut);
        function exitswapExternAmountOut(
            uint256 tokenAmountOut,
            uint256 maxPoolAmountIn
        ) public returns (uint256 poolAmountIn);

        event Swapped(
            address indexed caller,
            address indexed tokenIn,
            address indexed tokenOut,
            uint256 tokenAmountIn,
            uint256 tokenAmountOut
        );
        event LiquidityAdded(
            address indexed provider,
            address indexed tokenIn,
            uint256 tokenAmountIn,
            uint256 poolAmountOut
        );
        event LiquidityRemoved(
            address indexed provider,
            address indexed tokenOut,
            uint256 tokenAmountOut,
            uint256 poolAmountIn
        );
    }
}

/// The data-NFT contract: role registry plus datatoken deployment.
pub mod nft {
    use alloy::core::sol;

    sol! {
        function addManager(address manager) public;
        function removeManager(address manager) public;
        function addToCreateERC20List(address account) public;
        function removeFromCreateERC20List(address account) public;
        function addToMetadataList(address account) public;
        function removeFromMetadataList(address account) public;
        function addTo725StoreList(address account) public;
        function removeFrom725StoreList(address account) public;
        function cleanPermissions() public;
        function getPermissions(address user) public view returns (
            bool manager,
            bool deployERC20,
            bool updateMetadata,
            bool store
        );

        function createERC20(
            uint256 templateIndex,
            string name,
            string symbol,
            uint256 cap,
            address minter
        ) public returns (address);

        event TokenCreated(
            address indexed newTokenAddress,
            address indexed templateAddress,
            address indexed creator,
            string name,
            string symbol,
            uint256 cap
        );
    }
}

/// The factory deploying data-NFTs and managing datatoken templates.
pub mod factory {
    use alloy::core::sol;

    sol! {
        function deployERC721Contract(
            string name,
            string symbol,
            uint256 templateIndex,
            string tokenURI
        ) public returns (address);

        function addTokenTemplate(address templateAddress) public returns (uint256);
        function disableTokenTemplate(uint256 index) public;
        function reactivateTokenTemplate(uint256 index) public;
        function getTokenTemplate(uint256 index) public view returns (
            address templateAddress,
            bool isActive
        );
        function getCurrentTemplateCount() public view returns (uint256);

        event NFTCreated(
            address indexed newTokenAddress,
            address indexed templateAddress,
            address indexed admin,
            string tokenName,
            string symbol,
            string tokenURI
        );
        event TemplateAdded(address indexed templateAddress, uint256 indexed index);
    }
}

/// Builds a transaction request carrying the given calldata.
///
/// `from` matters for reads too: permission-gated views resolve `msg.sender`
/// from it.
pub fn call_request(from: Option<Address>, to: Address, data: Vec<u8>) -> TransactionRequest {
    let mut request = TransactionRequest::default()
        .to(to)
        .input(TransactionInput::both(data.into()));
    request.from = from;
    request
}
