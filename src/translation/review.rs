/*!
 * Review stage.
 *
 * Review is an optional capability selected by configuration:
 * - `ReviewClient` drives a `ReviewEngine` session with a bounded wait
 * - `PassthroughReview` keeps every translation as is
 *
 * Neither can fail a segment. When the engine errors or runs out of time the
 * best partial result is used, or the prior translation is kept.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::cancel::CancelToken;
use super::document::ReviewSkipReason;
use crate::app_config::ReviewStyle;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{ReviewEngine, ReviewPoll};

/// Reviewer guidance used when no custom instructions are configured
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are a professional translation reviewer helping to refine book translations.

Your task:
1. Review the provided text that has been translated to the target language
2. Improve the translation by making it more natural, idiomatic, and faithful to the original style
3. Correct any errors, awkward phrasing, or literal translations that don't work well
4. Ensure terms are used consistently throughout the text
5. Preserve the author's original tone, style and voice in the target language
6. If the text already seems high quality, return it unchanged

Important guidelines:
- Focus on making the translation read naturally in the target language
- Preserve cultural references but adapt them when necessary
- Pay special attention to idioms, metaphors, and figurative language
- Maintain consistent tense, perspective, and terminology
- Avoid introducing new information that wasn't in the original
- Respect the text's register (formal/informal) and genre

Return ONLY the improved translation text without explanation, notes, or your thinking process.";

/// Build the instructions sent along with each review
pub fn compose_instructions(
    custom_instructions: Option<&str>,
    target_language: &str,
    style: ReviewStyle,
) -> String {
    let language = language_utils::get_language_name(target_language)
        .unwrap_or_else(|_| target_language.to_string());
    let guidance = custom_instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTIONS);

    format!(
        "You are a {language} language expert reviewing translations.\n\
         {guidance}\n\n\
         Target Language: {target_language}\n\
         Review Style: {style}\n\n\
         Important: You are reviewing text that has already been translated to {language}.\n\
         Focus on improving the {language} language quality, naturalness, and accuracy.",
        language = language,
        guidance = guidance,
        target_language = target_language,
        style = style.instructions(),
    )
}

/// Result of reviewing one segment
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// The review finished with improved text
    Improved(String),
    /// The review did not finish but produced usable text
    Partial(String),
    /// The prior translation stays
    Kept(ReviewSkipReason),
}

/// Review capability consumed by the pipeline
#[async_trait]
pub trait ReviewStage: Send + Sync {
    /// Whether segments can be reviewed at all
    fn is_enabled(&self) -> bool;

    /// Review `text`; never fails
    async fn review(&self, text: &str, instructions: &str, cancel: &CancelToken) -> ReviewOutcome;
}

/// Review stage used when review is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughReview;

#[async_trait]
impl ReviewStage for PassthroughReview {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn review(&self, _text: &str, _instructions: &str, _cancel: &CancelToken) -> ReviewOutcome {
        ReviewOutcome::Kept(ReviewSkipReason::ReviewDisabled)
    }
}

/// Where a review got to before it ended
#[derive(Debug, Default)]
struct ReviewProgress {
    run: Option<(String, String)>,
    partial: Option<String>,
}

impl ReviewProgress {
    fn keep_partial(&mut self, partial: Option<String>) {
        if let Some(text) = partial.filter(|t| !t.trim().is_empty()) {
            self.partial = Some(text);
        }
    }
}

/// Session-based review with a bounded wait
#[derive(Debug, Clone)]
pub struct ReviewClient {
    engine: Arc<dyn ReviewEngine>,
    max_wait: Duration,
    poll_interval: Duration,
}

impl ReviewClient {
    pub fn new(engine: Arc<dyn ReviewEngine>, max_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            engine,
            max_wait,
            poll_interval,
        }
    }

    async fn drive(
        &self,
        text: &str,
        instructions: &str,
        progress: &mut ReviewProgress,
    ) -> Result<ReviewPoll, ProviderError> {
        let session = self.engine.open_session().await?;
        let run = self.engine.submit(&session, text, instructions).await?;
        progress.run = Some((session.clone(), run.clone()));

        loop {
            match self.engine.poll(&session, &run).await? {
                ReviewPoll::Pending { partial } => {
                    progress.keep_partial(partial);
                    tokio::time::sleep(self.poll_interval).await;
                }
                finished => return Ok(finished),
            }
        }
    }

    async fn abandon(&self, progress: &ReviewProgress) {
        if let Some((session, run)) = &progress.run {
            if let Err(e) = self.engine.abandon(session, run).await {
                debug!("Failed to abandon review run {}: {}", run, e);
            }
        }
    }

    fn fallback(progress: ReviewProgress, reason: ReviewSkipReason) -> ReviewOutcome {
        match progress.partial {
            Some(partial) => ReviewOutcome::Partial(partial),
            None => ReviewOutcome::Kept(reason),
        }
    }
}

#[async_trait]
impl ReviewStage for ReviewClient {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn review(&self, text: &str, instructions: &str, cancel: &CancelToken) -> ReviewOutcome {
        let mut progress = ReviewProgress::default();
        let result = cancel
            .run(tokio::time::timeout(
                self.max_wait,
                self.drive(text, instructions, &mut progress),
            ))
            .await;

        match result {
            None => {
                debug!("Review cancelled");
                self.abandon(&progress).await;
                ReviewOutcome::Kept(ReviewSkipReason::ReviewFailed)
            }
            Some(Err(_)) => {
                warn!(
                    "Review did not finish within {:?} with {}",
                    self.max_wait,
                    self.engine.name()
                );
                self.abandon(&progress).await;
                Self::fallback(progress, ReviewSkipReason::ReviewTimeout)
            }
            Some(Ok(Err(e))) => {
                warn!("Review failed, keeping prior translation: {}", e);
                Self::fallback(progress, ReviewSkipReason::ReviewFailed)
            }
            Some(Ok(Ok(ReviewPoll::Completed(improved)))) if !improved.trim().is_empty() => {
                ReviewOutcome::Improved(improved)
            }
            Some(Ok(Ok(ReviewPoll::Completed(_)))) => {
                warn!("Review returned empty text, keeping prior translation");
                Self::fallback(progress, ReviewSkipReason::ReviewFailed)
            }
            Some(Ok(Ok(ReviewPoll::Failed { reason, partial }))) => {
                warn!("Review ended without result: {}", reason);
                progress.keep_partial(partial);
                Self::fallback(progress, ReviewSkipReason::ReviewFailed)
            }
            Some(Ok(Ok(ReviewPoll::Pending { partial }))) => {
                progress.keep_partial(partial);
                Self::fallback(progress, ReviewSkipReason::ReviewTimeout)
            }
        }
    }
}
