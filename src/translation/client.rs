/*!
 * Resilient front-end over a translation engine.
 *
 * Every call is bounded by a per-attempt timeout and retried with backoff on
 * transient errors. Authentication and parse failures fail immediately.
 */

use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;

use super::cancel::CancelToken;
use super::retry::{RetryError, RetryPolicy};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::TranslationEngine;

/// Translation engine wrapped with timeout and retry
#[derive(Debug, Clone)]
pub struct TranslationClient {
    engine: Arc<dyn TranslationEngine>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl TranslationClient {
    pub fn new(engine: Arc<dyn TranslationEngine>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self { engine, retry, timeout }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Translate one segment
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        cancel: &CancelToken,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::Validation("segment is empty".to_string()));
        }

        let timeout_ms = self.timeout.as_millis() as u64;
        let result = self
            .retry
            .run(cancel, ProviderError::is_transient, |attempt| {
                let engine = self.engine.clone();
                async move {
                    debug!(
                        "Translating {} chars with {} (attempt {})",
                        text.chars().count(),
                        engine.name(),
                        attempt
                    );
                    match tokio::time::timeout(self.timeout, engine.translate(text, target_language)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout(timeout_ms)),
                    }
                }
            })
            .await;

        result.map_err(|e| match e {
            RetryError::Exhausted { attempts, last_error } => {
                error!("Translation gave up after {} attempts: {}", attempts, last_error);
                TranslationError::Exhausted { attempts, last_error }
            }
            RetryError::Fatal(error) => {
                error!("Translation failed without retry: {}", error);
                TranslationError::Provider(error)
            }
            RetryError::Cancelled => TranslationError::Cancelled,
        })
    }
}
