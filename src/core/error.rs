use alloy::primitives::TxHash;
use thiserror::Error;

pub type SwapResult<T> = Result<T, SwapError>;

/// Coarse error classes used for reporting and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    NoRoute,
    UnsupportedPoolKind,
    Network,
    Authorization,
    Internal,
}

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Trade type {0} is not supported")]
    UnsupportedTradeType(String),

    #[error("No route found from {0} to {1}")]
    NoRouteFound(String, String),

    #[error("Unsupported pool kind '{kind}' (pool {id})")]
    UnsupportedPoolKind { kind: String, id: String },

    #[error("Invalid pool state: {0}")]
    InvalidPoolState(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout: operation took longer than {0} seconds")]
    Timeout(u64),

    #[error("Authorization failed: {0}")]
    AuthorizationError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {0} broadcast but not confirmed in time")]
    TransactionPending(TxHash),

    #[error("Math overflow in calculation")]
    MathOverflow,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SwapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SwapError::InvalidArgument(_)
            | SwapError::InvalidAmount(_)
            | SwapError::TokenNotFound(_)
            | SwapError::PoolNotFound(_)
            | SwapError::UnsupportedTradeType(_)
            | SwapError::ConfigError(_) => ErrorKind::Input,
            SwapError::NoRouteFound(..) => ErrorKind::NoRoute,
            SwapError::UnsupportedPoolKind { .. } => ErrorKind::UnsupportedPoolKind,
            SwapError::NetworkError(_)
            | SwapError::Timeout(_)
            | SwapError::TransactionFailed(_)
            | SwapError::TransactionPending(_) => ErrorKind::Network,
            SwapError::AuthorizationError(_) => ErrorKind::Authorization,
            SwapError::InvalidPoolState(_)
            | SwapError::InvalidRoute(_)
            | SwapError::MathOverflow
            | SwapError::SerializationError(_)
            | SwapError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Only read-side failures may be retried; a broadcast transaction never is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::NetworkError(_) | SwapError::Timeout(_))
    }
}

impl From<anyhow::Error> for SwapError {
    fn from(err: anyhow::Error) -> Self {
        SwapError::Other(err.to_string())
    }
}

impl From<alloy::contract::Error> for SwapError {
    fn from(err: alloy::contract::Error) -> Self {
        SwapError::NetworkError(err.to_string())
    }
}

impl From<alloy::transports::TransportError> for SwapError {
    fn from(err: alloy::transports::TransportError) -> Self {
        SwapError::NetworkError(err.to_string())
    }
}

impl From<alloy::providers::PendingTransactionError> for SwapError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        SwapError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        SwapError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for SwapError {
    fn from(err: std::io::Error) -> Self {
        SwapError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SwapError::TokenNotFound("XYZ".to_string()).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            SwapError::NoRouteFound("BNB".to_string(), "KGEN".to_string()).kind(),
            ErrorKind::NoRoute
        );
        assert_eq!(
            SwapError::UnsupportedPoolKind {
                kind: "HOOKED".to_string(),
                id: "0x01".to_string()
            }
            .kind(),
            ErrorKind::UnsupportedPoolKind
        );
        assert_eq!(
            SwapError::AuthorizationError("denied".to_string()).kind(),
            ErrorKind::Authorization
        );
    }

    #[test]
    fn test_only_reads_are_retryable() {
        assert!(SwapError::NetworkError("reset".to_string()).is_retryable());
        assert!(SwapError::Timeout(30).is_retryable());
        assert!(!SwapError::TransactionFailed("reverted".to_string()).is_retryable());
        assert!(!SwapError::TransactionPending(TxHash::ZERO).is_retryable());
        assert!(!SwapError::AuthorizationError("x".to_string()).is_retryable());
    }
}
