//! Error types for umbot.

use thiserror::Error;

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Top-level error returned by the runner and the public API.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation failed for {model}: {message}")]
    Validation { model: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound webhook could not be mapped onto the controller.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{platform}: empty request")]
    EmptyRequest { platform: &'static str },

    #[error("{platform}: missing field `{field}`")]
    MissingField {
        platform: &'static str,
        field: &'static str,
    },

    #[error("{platform}: unsupported event `{event}`")]
    UnsupportedEvent { platform: &'static str, event: String },

    #[error("unknown platform `{0}`")]
    Unknown(String),
}

/// Upstream REST call failed.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("{service}: token is not configured")]
    MissingToken { service: &'static str },

    #[error("response parse: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence backend failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table `{0}` lock poisoned")]
    Poisoned(String),
}
