//! Error types for the feed import pipeline
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Only a handful of these terminate a batch (empty feeds and file I/O).
//! Tamper failures are contained by the pipeline and turned into state
//! messages instead.

use thiserror::Error;

/// The main error type for the import pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Tamper Plugin Errors
    // ============================================================================
    #[error("Tamper plugin '{id}' is not registered")]
    UnknownPlugin { id: String },

    #[error("Tamper plugin '{id}' is already registered")]
    DuplicatePlugin { id: String },

    #[error("Plugin \"{plugin}\" has invalid itemUsage \"{value}\". Allowed: required, optional, ignored.")]
    InvalidItemUsage { plugin: String, value: String },

    #[error("The {plugin} plugin requires a tamperable item.")]
    MissingItem { plugin: String },

    #[error("{message}")]
    Tamper { message: String },

    // ============================================================================
    // Fetch / File Errors
    // ============================================================================
    #[error("The feed is empty.")]
    EmptyFeed,

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File is not readable: {path}")]
    FileNotReadable { path: String },

    #[error("File is not writable: {path}")]
    FileNotWritable { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Parse Errors
    // ============================================================================
    #[error("Failed to decode source: {message}")]
    Decode { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a tamper runtime error
    pub fn tamper(message: impl Into<String>) -> Self {
        Self::Tamper {
            message: message.into(),
        }
    }

    /// Create an unknown plugin error
    pub fn unknown_plugin(id: impl Into<String>) -> Self {
        Self::UnknownPlugin { id: id.into() }
    }

    /// Create a missing item error
    pub fn missing_item(plugin: impl Into<String>) -> Self {
        Self::MissingItem {
            plugin: plugin.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Whether this error terminates the current batch
    ///
    /// Plugin errors are recovered by the pipeline; only empty feeds and
    /// file system failures abort a batch.
    pub fn is_fatal_to_batch(&self) -> bool {
        matches!(
            self,
            Error::EmptyFeed
                | Error::FileNotFound { .. }
                | Error::FileNotReadable { .. }
                | Error::FileNotWritable { .. }
                | Error::Io(_)
        )
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
