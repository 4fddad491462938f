/*!
 * Document translation pipeline.
 *
 * This module contains the processing core. It is split into several
 * submodules:
 *
 * - `segmenter`: Splitting text into bounded segments
 * - `cache`: Content-addressable translation reuse
 * - `retry` / `client`: Resilient calls to the translation engine
 * - `complexity`: Smart-review gate
 * - `review`: Review stage (engine-backed or passthrough)
 * - `glossary`: Domain term substitution
 * - `stats`: Per-document and batch statistics
 * - `pagination`: Editing pages over stored content
 * - `events`: Progress events of a run
 * - `pipeline`: Orchestration of all of the above
 */

// Re-export main types for easier usage
pub use self::cancel::CancelToken;
pub use self::document::{CacheMetadata, ReviewSkipReason, Segment, SegmentStatus};
pub use self::events::StageEvent;
pub use self::glossary::GlossaryEntry;
pub use self::pagination::{EditingWorkspace, Page, PageStatus};
pub use self::pipeline::{
    BatchDocument, BatchResult, DocumentInput, DocumentOutcome, DocumentResult, Pipeline,
    ProcessOptions,
};
pub use self::stats::{DocumentStats, StatsAggregator, StatsSummary};

// Submodules
pub mod cache;
pub mod cancel;
pub mod client;
pub mod complexity;
pub mod document;
pub mod events;
pub mod glossary;
pub mod pagination;
pub mod pipeline;
pub mod retry;
pub mod review;
pub mod segmenter;
pub mod stats;
