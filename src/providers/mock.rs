/*!
 * Mock engine implementations for testing.
 *
 * This module provides scripted engines that simulate different behaviors:
 * - `MockTranslator::working()` - Always succeeds with a tagged translation
 * - `MockTranslator::intermittent(n)` - Fails every n-th request
 * - `MockTranslator::failing()` - Always fails with a transient error
 * - `MockReviewer::improving()` - Completes reviews after a few polls
 * - `MockReviewer::stalled()` - Never completes
 *
 * Both count their invocations so tests can assert on call volume.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::{ReviewEngine, ReviewPoll, TranslationEngine};
use crate::errors::ProviderError;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails with a transient error on every n-th request
    Intermittent { fail_every: usize },
    /// Always fails with a transient error
    Failing,
    /// Always fails with an authentication error
    Unauthorized,
    /// Fails whenever the predicate matches the input text
    FailingWhen(fn(&str) -> bool),
    /// Succeeds after a delay (for timeout and cancellation testing)
    Slow { delay_ms: u64 },
}

/// Mock translation engine
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Shared across clones
    request_count: Arc<AtomicUsize>,
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn failing_when(predicate: fn(&str) -> bool) -> Self {
        Self::new(MockBehavior::FailingWhen(predicate))
    }

    /// Set a custom response generator taking `(text, target_language)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of translate calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn respond(&self, text: &str, target_language: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(text, target_language),
            None => format!("[{}] {}", target_language, text),
        }
    }
}

#[async_trait]
impl TranslationEngine for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(text, target_language)),
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure on request {}", count + 1),
                    })
                } else {
                    Ok(self.respond(text, target_language))
                }
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError(
                "Simulated invalid API key".to_string(),
            )),
            MockBehavior::FailingWhen(predicate) => {
                if predicate(text) {
                    Err(ProviderError::ConnectionError("Simulated failure for input".to_string()))
                } else {
                    Ok(self.respond(text, target_language))
                }
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(text, target_language))
            }
        }
    }
}

/// Behavior mode for the mock reviewer
#[derive(Debug, Clone, Copy)]
pub enum ReviewBehavior {
    /// Completes after `polls_needed` polls
    Improving { polls_needed: usize },
    /// Stays pending forever, exposing a partial result when `with_partial`
    Stalled { with_partial: bool },
    /// Every call fails
    Failing,
}

#[derive(Debug, Default)]
struct ReviewSession {
    text: String,
    polls: usize,
}

/// Mock review engine
#[derive(Debug, Clone)]
pub struct MockReviewer {
    behavior: ReviewBehavior,
    /// Submitted reviews, shared across clones
    submissions: Arc<AtomicUsize>,
    polls: Arc<AtomicUsize>,
    sessions: Arc<Mutex<HashMap<String, ReviewSession>>>,
}

impl MockReviewer {
    pub fn new(behavior: ReviewBehavior) -> Self {
        Self {
            behavior,
            submissions: Arc::new(AtomicUsize::new(0)),
            polls: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn improving() -> Self {
        Self::new(ReviewBehavior::Improving { polls_needed: 1 })
    }

    pub fn stalled(with_partial: bool) -> Self {
        Self::new(ReviewBehavior::Stalled { with_partial })
    }

    pub fn failing() -> Self {
        Self::new(ReviewBehavior::Failing)
    }

    /// Reviews submitted so far
    pub fn review_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Status polls made so far
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Text the mock returns for a reviewed input
    pub fn reviewed(text: &str) -> String {
        format!("{} (reviewed)", text)
    }

    fn fail_if_failing(&self) -> Result<(), ProviderError> {
        match self.behavior {
            ReviewBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated review failure".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ReviewEngine for MockReviewer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open_session(&self) -> Result<String, ProviderError> {
        self.fail_if_failing()?;
        let session_id = format!("thread_{}", Uuid::new_v4().simple());
        self.sessions.lock().insert(session_id.clone(), ReviewSession::default());
        Ok(session_id)
    }

    async fn submit(
        &self,
        session_id: &str,
        text: &str,
        _instructions: &str,
    ) -> Result<String, ProviderError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.fail_if_failing()?;

        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ProviderError::RequestFailed(format!("unknown session {}", session_id)))?;
        session.text = text.to_string();
        Ok(format!("run_{}", Uuid::new_v4().simple()))
    }

    async fn poll(&self, session_id: &str, _run_id: &str) -> Result<ReviewPoll, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ProviderError::RequestFailed(format!("unknown session {}", session_id)))?;
        session.polls += 1;

        Ok(match self.behavior {
            ReviewBehavior::Improving { polls_needed } if session.polls >= polls_needed => {
                ReviewPoll::Completed(Self::reviewed(&session.text))
            }
            ReviewBehavior::Improving { .. } => ReviewPoll::Pending { partial: None },
            ReviewBehavior::Stalled { with_partial } => ReviewPoll::Pending {
                partial: with_partial.then(|| format!("{} (partial)", session.text)),
            },
            ReviewBehavior::Failing => return self.fail_if_failing().map(|_| ReviewPoll::Pending { partial: None }),
        })
    }
}
