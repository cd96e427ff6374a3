pub mod pool;
pub mod token;

pub use pool::{PoolInfo, RolePermissions, SwapQuote, TokenTemplate};
pub use token::Token;

use alloy::primitives::B256;

/// Transaction hash literal type to uniquely identify a submitted transaction.
pub type TxHash = B256;

/// Gas prices and other native-currency quantities are carried in wei.
pub type Wei = u128;
