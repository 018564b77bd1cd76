//! Error handling for reqkit

use thiserror::Error;

/// Main error type for reqkit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("JSON encode error: {0}")]
    Serialization(serde_json::Error),

    #[error("JSON decode error: {0}")]
    Deserialization(serde_json::Error),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Cookie jar disabled: client was built without cookies")]
    CookiesDisabled,
}

/// Result type alias for reqkit operations
pub type Result<T> = std::result::Result<T, Error>;
