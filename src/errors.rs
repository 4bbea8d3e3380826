//! Error types for IG Fetcher
//!
//! This module defines the error types for every component of the acquisition
//! pipeline. Errors are designed to be actionable and provide clear context for
//! debugging and user feedback.
//!
//! Only contract violations cross the orchestrator boundary as errors. Network
//! failures, session expiry and markup drift are logged and degrade to "no data".

use std::path::PathBuf;
use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing environment variables for credentials
    #[error(
        "Missing IG credentials. Set IG_MEMBER_ID, IG_PIN and IG_ADMIN_PASSWORD environment variables or run 'auth setup'"
    )]
    MissingCredentials,

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// HTTP request failed during authentication
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// Primary member login was rejected
    #[error("Primary login failed with HTTP {status}")]
    PrimaryLoginFailed { status: u16 },

    /// Admin step-up login was rejected
    #[error("Step-up (admin) login failed with HTTP {status}")]
    StepUpFailed { status: u16 },

    /// Login sequence exceeded its time budget
    #[error("Login timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invalid member identifier format
    #[error("Invalid member id: {reason}")]
    InvalidMemberId { reason: String },

    /// Login endpoint could not be resolved against the base URL
    #[error("Invalid login endpoint {path}: {error}")]
    InvalidEndpoint { path: String, error: String },

    /// File I/O error during credential storage
    #[error("Failed to save credentials to file")]
    CredentialStorage(#[from] std::io::Error),
}

/// Report fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Request timed out
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Server returned a non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// JSON envelope could not be decoded
    #[error("Malformed JSON envelope")]
    Envelope(#[from] serde_json::Error),

    /// JSON envelope decoded but carried no markup
    #[error("JSON envelope contained no html actions")]
    EmptyEnvelope,

    /// Login-required page persisted after the forced re-login
    #[error("Session still expired after re-authentication for {url}")]
    SessionExpired { url: String },
}

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be serialized or deserialized
    #[error("Cache value serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// Cache key is empty or whitespace
    #[error("Invalid cache key: {key:?}")]
    InvalidKey { key: String },

    /// Time-to-live of zero requested
    #[error("Invalid cache TTL for key {key}: TTL must be greater than zero")]
    InvalidTtl { key: String },
}

/// Report parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Required cell missing or empty in a row
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// Cell present but its value is unusable
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// No table with the expected header layout was found
    #[error("No table matching the {report} layout was found")]
    TableNotFound { report: &'static str },

    /// CSS selector error
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    /// Column rule pattern could not be compiled
    #[error("Invalid column rule pattern")]
    InvalidPattern(#[from] regex::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("Configuration could not be serialized")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Caller broke the acquisition contract
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Create a contract-violation error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(FetchError::Timeout { .. })
            | AppError::Fetch(FetchError::Http(_))
            | AppError::Fetch(FetchError::ServerError { .. })
            | AppError::Fetch(FetchError::SessionExpired { .. })
            | AppError::Auth(AuthError::Http(_))
            | AppError::Auth(AuthError::Timeout { .. }) => true,

            AppError::Auth(AuthError::PrimaryLoginFailed { .. })
            | AppError::Auth(AuthError::StepUpFailed { .. })
            | AppError::Auth(AuthError::MissingCredentials)
            | AppError::InvalidRequest { .. }
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Fetch(_) => "fetch",
            AppError::Cache(_) => "cache",
            AppError::Parse(_) => "parse",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::InvalidRequest { .. } => "request",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Parse result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;
