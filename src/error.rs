//! Unified error types for the agent.

use thiserror::Error;

use crate::market::MarketType;

/// Unified error type for the agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market backend error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Social platform error.
    #[error("social error: {0}")]
    Social(#[from] SocialError),

    /// Text generation error.
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Long-term memory error.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp '{input}': {source}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Underlying parse error.
        source: chrono::ParseError,
    },

    /// An agent function was called with arguments it cannot use.
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        /// Function name.
        function: String,
        /// What was wrong.
        reason: String,
    },

    /// Message could not be decompressed.
    #[error("compression error: {0}")]
    Compression(String),

    /// Key or address error.
    #[error("signing error: {0}")]
    Signing(String),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Market backend errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// No client is registered for the requested market type.
    #[error("market type {0} is not supported")]
    UnsupportedMarket(MarketType),

    /// Failed to fetch data from the backend.
    #[error("failed to fetch {what}: {reason}")]
    FetchFailed {
        /// What was being fetched.
        what: String,
        /// Reason for failure.
        reason: String,
    },

    /// JSON-RPC call returned an error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The transaction relay rejected a request.
    #[error("{operation} failed: HTTP {status} - {body}")]
    RelayFailed {
        /// Operation name.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Failed to parse backend data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Social platform posting errors.
#[derive(Error, Debug)]
pub enum SocialError {
    /// The platform answered with a non-success status.
    #[error("{platform} post failed: HTTP {status} - {body}")]
    PostFailed {
        /// Platform name.
        platform: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Required credentials are not configured.
    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),

    /// Response could not be parsed.
    #[error("failed to parse {platform} response: {reason}")]
    ParseError {
        /// Platform name.
        platform: &'static str,
        /// Reason for failure.
        reason: String,
    },

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Text generation errors.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The completion endpoint answered with a non-success status.
    #[error("completion request failed: HTTP {status} - {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Response could not be parsed.
    #[error("failed to parse completion: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Long-term memory errors.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AgentError>;
