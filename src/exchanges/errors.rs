//! Exchange client error types
//!
//! All exchange-related errors are wrapped in ExchangeError enum
//! which implements thiserror for consistent error handling.

use thiserror::Error;

/// Exchange-specific error types for client operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// HTTP transport failure (connect, timeout, TLS, non-success status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or unexpected response from exchange
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Exchange was marked unavailable after a failed market load
    #[error("Exchange unavailable: {0}")]
    Unavailable(String),

    /// Venue id not present in the supported-exchange table
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),
}

/// Result type alias for exchange operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
