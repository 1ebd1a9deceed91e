#[macro_use]
extern crate lazy_static;

pub mod authorization;
pub mod cli;
pub mod core;
pub mod discovery;
pub mod pipeline;
pub mod quotes;
pub mod selection;
pub mod trade;
pub mod transaction;
pub mod utils;

// Re-export commonly used types
pub use authorization::{AuthState, Authorization, Authorizer};
pub use core::{Config, Currency, CurrencyAmount, Pool, SwapError, SwapResult, TradeType};
pub use discovery::{PoolDiscovery, PoolNormalizer};
pub use pipeline::{PreparedSwap, SwapPipeline, SwapRequest};
pub use selection::TradeSearch;
pub use trade::{RouteType, Trade};
pub use transaction::{ChainClient, MethodParameters, SwapRouter};
