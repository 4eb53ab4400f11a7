/**
* filename : error
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Connection capacity exceeded: {0} active connections")]
    CapacityExceeded(usize),

    #[error("Client already registered: {0}")]
    DuplicateClient(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Insufficient market data: required {required}, available {available}")]
    InsufficientMarketData { required: usize, available: usize },

    #[error("Slice generation failed: {0}")]
    GenerationFailure(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Already running: {0}")]
    AlreadyRunning(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
