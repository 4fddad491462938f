/*!
 * Segment model carried through the pipeline.
 *
 * A `Segment` is created by the segmenter in `Pending` state, moves to
 * `Translated` once a translation is known (from the cache or the engine),
 * optionally to `Reviewed`, and ends either there or in `Failed`.
 */

use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;

/// Lifecycle state of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Pending,
    Translated,
    Reviewed,
    Failed,
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Translated => "translated",
            Self::Reviewed => "reviewed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Why a translated segment did not go through (or come out of) review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSkipReason {
    /// Complexity score below the smart-review threshold
    LowComplexity,
    /// Review stage switched off
    ReviewDisabled,
    /// Review did not finish in time and produced nothing usable
    ReviewTimeout,
    /// Review engine failed; the prior translation was kept
    ReviewFailed,
}

impl ReviewSkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowComplexity => "low_complexity",
            Self::ReviewDisabled => "review_disabled",
            Self::ReviewTimeout => "review_timeout",
            Self::ReviewFailed => "review_failed",
        }
    }
}

/// Cache bookkeeping for one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Fingerprint of the segment text and target language
    pub source_hash: String,
    /// Whether the translation came from the cache
    pub hit: bool,
}

/// A bounded unit of document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the source document
    #[serde(rename = "id")]
    pub order_index: usize,

    pub original_text: String,

    pub translated_text: String,

    pub status: SegmentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_metadata: Option<CacheMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_skipped_reason: Option<ReviewSkipReason>,

    /// Glossary replacements applied to the final text
    #[serde(default)]
    pub glossary_hit_count: usize,

    /// Failure description for failed segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Segment {
    /// Create a pending segment
    pub fn new(order_index: usize, original_text: impl Into<String>) -> Self {
        Self {
            order_index,
            original_text: original_text.into(),
            translated_text: String::new(),
            status: SegmentStatus::Pending,
            cache_metadata: None,
            review_skipped_reason: None,
            glossary_hit_count: 0,
            error: None,
        }
    }

    /// Whether the segment can no longer change
    pub fn is_final(&self) -> bool {
        matches!(self.status, SegmentStatus::Reviewed | SegmentStatus::Failed)
    }

    /// Record a translation. Ignored once the segment is final.
    pub fn mark_translated(&mut self, text: String, cache_metadata: Option<CacheMetadata>) {
        if self.is_final() {
            return;
        }
        self.translated_text = text;
        self.cache_metadata = cache_metadata;
        self.status = SegmentStatus::Translated;
    }

    /// Record a reviewed text. Only a translated segment can be reviewed.
    pub fn mark_reviewed(&mut self, text: String) {
        if self.status != SegmentStatus::Translated {
            return;
        }
        self.translated_text = text;
        self.status = SegmentStatus::Reviewed;
    }

    /// Note why review did not change the segment
    pub fn skip_review(&mut self, reason: ReviewSkipReason) {
        if self.status == SegmentStatus::Translated {
            self.review_skipped_reason = Some(reason);
        }
    }

    /// Fail the segment
    pub fn fail(&mut self, error: &TranslationError) {
        if self.is_final() {
            return;
        }
        self.status = SegmentStatus::Failed;
        self.error = Some(error.to_string());
    }

    /// Replace the final text after glossary substitution
    pub fn apply_substitution(&mut self, text: String, hits: usize) {
        if self.status == SegmentStatus::Failed {
            return;
        }
        self.translated_text = text;
        self.glossary_hit_count = hits;
    }
}
