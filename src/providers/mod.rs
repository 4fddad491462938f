/*!
 * Provider implementations for the external engines.
 *
 * This module contains client implementations for the engines the pipeline
 * consumes:
 * - DeepL: machine translation
 * - OpenAI: assistant-based review of a translation
 * - Mock: scripted engines for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Machine translation engine
///
/// Implementations translate one piece of text per call and may fail with
/// transient errors; retrying is the caller's business.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Translate `text` into `target_language`
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;
}

/// State of a submitted review
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewPoll {
    /// Still running; `partial` carries any text produced so far
    Pending { partial: Option<String> },
    /// Finished with the improved text
    Completed(String),
    /// Ended without a usable result
    Failed { reason: String, partial: Option<String> },
}

/// Review engine speaking a session protocol: open a session, submit the
/// text, then poll until the review completes.
#[async_trait]
pub trait ReviewEngine: Send + Sync + Debug {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Open a review session and return its id
    async fn open_session(&self) -> Result<String, ProviderError>;

    /// Submit text and instructions; returns the id of the started run
    async fn submit(
        &self,
        session_id: &str,
        text: &str,
        instructions: &str,
    ) -> Result<String, ProviderError>;

    /// Current state of a run
    async fn poll(&self, session_id: &str, run_id: &str) -> Result<ReviewPoll, ProviderError>;

    /// Abandon a run that is no longer awaited
    async fn abandon(&self, _session_id: &str, _run_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Map a transport error from reqwest
pub(crate) fn map_request_error(error: reqwest::Error, timeout_ms: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_ms)
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status
pub(crate) fn map_status_error(status_code: u16, message: String) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError { status_code, message },
    }
}

pub mod deepl;
pub mod mock;
pub mod openai;
