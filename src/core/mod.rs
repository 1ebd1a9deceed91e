pub mod abi;
pub mod config;
pub mod constants;
pub mod error;
pub mod pool;
pub mod retry;
pub mod tokens;
pub mod types;

pub use config::{Config, Contracts};
pub use constants::*;
pub use error::{ErrorKind, SwapError, SwapResult};
pub use pool::*;
pub use retry::{retry_read, RetryConfig};
pub use tokens::TokenRegistry;
pub use types::*;
