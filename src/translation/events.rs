/*!
 * Progress events emitted while a document is processed.
 *
 * A run emits `Started`, one `SegmentExtracted` per segment, then per-segment
 * progress in completion order, and finally exactly one of `Completed` or
 * `Error`. Events serialize to tagged JSON so they can be forwarded to any
 * transport as is.
 */

use futures::channel::mpsc::UnboundedSender;
use serde::{Deserialize, Serialize};

use super::document::ReviewSkipReason;
use super::stats::StatsSummary;

/// One step of a document run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    Started {
        document_id: String,
        target_language: String,
    },
    SegmentExtracted {
        index: usize,
        total: usize,
        chars: usize,
    },
    SegmentTranslated {
        index: usize,
        cached: bool,
    },
    SegmentReviewed {
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skipped_reason: Option<ReviewSkipReason>,
    },
    SegmentFailed {
        index: usize,
        error: String,
    },
    Completed {
        document_id: String,
        failed_segments: usize,
        stats: StatsSummary,
    },
    Error {
        message: String,
    },
}

impl StageEvent {
    /// Whether no event can follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}

/// Optional event sink handed through a run
#[derive(Debug, Clone, Default)]
pub(crate) struct Emitter(Option<UnboundedSender<StageEvent>>);

impl Emitter {
    pub(crate) fn new(sender: UnboundedSender<StageEvent>) -> Self {
        Self(Some(sender))
    }

    pub(crate) fn none() -> Self {
        Self(None)
    }

    /// Send an event; a consumer that went away is not an error
    pub(crate) fn emit(&self, event: StageEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.unbounded_send(event);
        }
    }
}
