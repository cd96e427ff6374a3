//! Shared building blocks for the dtpool client: the data model, the error
//! taxonomy, exact unit-conversion math and the reserve-derived trade bounds.
//!
//! Everything here is chain-agnostic and side-effect free; the RPC-facing
//! counterparts live in `dtpool-ethereum`.

pub mod bounds;
pub mod errors;
pub mod models;
pub mod traits;
pub mod units;

pub use bounds::{BoundKind, BoundsConfig};
pub use errors::ClientError;
pub use models::{
    pool::{PoolInfo, RolePermissions, SwapQuote, TokenTemplate},
    token::Token,
};
