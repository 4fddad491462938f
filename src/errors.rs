/*!
 * Error types for the booktranslate pipeline.
 *
 * This module contains custom error types for the different stages of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * Segment-level failures (`TranslationError`) never abort a document, and
 * document-level failures (`PipelineError`) never abort a batch.
 */

use thiserror::Error;

/// Errors that can occur when talking to an external engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not finish within its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that fail a single segment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Error from the provider API that was not retried
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Every attempt allowed by the retry policy failed
    #[error("Translation failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: ProviderError,
    },

    /// The segment cannot be processed at all
    #[error("Invalid segment: {0}")]
    Validation(String),

    /// The caller aborted the run
    #[error("Translation cancelled")]
    Cancelled,
}

/// Cache lookups and inserts; always degraded to a miss by the caller
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cache error: {0}")]
pub struct CacheError(pub String);

/// Errors raised by content, cache and glossary stores
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend failure (I/O, SQL, lock poisoning)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded
    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<anyhow::Error> for StorageError {
    fn from(error: anyhow::Error) -> Self {
        Self::Backend(format!("{:#}", error))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Corrupt(error.to_string())
    }
}

impl From<StorageError> for CacheError {
    fn from(error: StorageError) -> Self {
        Self(error.to_string())
    }
}

/// Missing credentials, engine identifiers or invalid settings.
///
/// Raised before any segment is processed and never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A required credential is absent
    #[error("{0} is not configured")]
    MissingCredential(String),

    /// An engine identifier (assistant id, model) is absent
    #[error("Engine identifier {0} is not configured")]
    MissingEngineIdentifier(String),

    /// A setting has a value the pipeline cannot work with
    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting {
        /// Name of the offending setting
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors that fail a whole document
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration rejected at entry
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The requested glossary could not be loaded
    #[error("Failed to load glossary {glossary_id}: {source}")]
    Glossary {
        /// Glossary that was requested
        glossary_id: String,
        /// Underlying store error
        #[source]
        source: StorageError,
    },

    /// The caller aborted the run
    #[error("Processing cancelled")]
    Cancelled,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from a store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
