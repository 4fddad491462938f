/*!
 * Document processing pipeline.
 *
 * For every segment of a document:
 * 1. Cache lookup (a hit skips the translation engine)
 * 2. Translation with retry
 * 3. Complexity gate, then review
 * 4. Glossary substitution
 *
 * Segments of a document run concurrently and are reassembled by index.
 * Documents of a batch also run concurrently; their statistics are folded in
 * input order once all of them have finished. Every external call takes a
 * permit from one shared semaphore, so `concurrent_requests` bounds the whole
 * pipeline, not each document.
 */

use futures::channel::mpsc::{self, UnboundedSender};
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::cache::CacheIndex;
use super::cancel::CancelToken;
use super::client::TranslationClient;
use super::complexity::ComplexityGate;
use super::document::{CacheMetadata, ReviewSkipReason, Segment, SegmentStatus};
use super::events::{Emitter, StageEvent};
use super::glossary::{self, GlossaryEntry};
use super::retry::RetryPolicy;
use super::review::{self, PassthroughReview, ReviewClient, ReviewOutcome, ReviewStage};
use super::segmenter;
use super::stats::{DocumentStats, SegmentCounts, StatsAggregator, StatsSummary};
use crate::app_config::{Config, ReviewProvider, ReviewStyle, TranslationProvider};
use crate::errors::{ConfigurationError, PipelineError, StorageError, TranslationError};
use crate::language_utils;
use crate::providers::TranslationEngine;
use crate::providers::deepl::DeepL;
use crate::providers::mock::{MockReviewer, MockTranslator};
use crate::providers::openai::OpenAIAssistant;
use crate::storage::{CachePersistence, GlossaryStore};

/// Per-call processing options
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub use_cache: bool,
    pub smart_review: bool,
    pub complexity_threshold: f64,
    pub glossary_id: Option<String>,
    pub custom_instructions: Option<String>,
    /// Owner recorded on cache entries
    pub owner: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            smart_review: true,
            complexity_threshold: super::complexity::DEFAULT_THRESHOLD,
            glossary_id: None,
            custom_instructions: None,
            owner: "local".to_string(),
        }
    }
}

impl ProcessOptions {
    /// Options carried by a configuration file
    pub fn from_config(config: &Config) -> Self {
        Self {
            use_cache: config.pipeline.use_cache,
            smart_review: config.pipeline.smart_review,
            complexity_threshold: config.pipeline.complexity_threshold,
            glossary_id: None,
            custom_instructions: config.review.instructions.clone(),
            owner: config.owner.clone(),
        }
    }

    pub fn with_glossary(mut self, glossary_id: impl Into<String>) -> Self {
        self.glossary_id = Some(glossary_id.into());
        self
    }
}

/// A processed document
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub document_id: String,
    pub target_language: String,
    /// In source order
    pub segments: Vec<Segment>,
    pub stats: DocumentStats,
    /// Translated segments joined by blank lines; failed segments are left out
    pub combined_text: String,
}

impl DocumentResult {
    pub fn summary(&self) -> StatsSummary {
        self.stats.summary()
    }

    pub fn failed_segments(&self) -> usize {
        self.stats.counts.failed
    }

    /// Whether no segment produced a translation
    pub fn is_failed(&self) -> bool {
        self.stats.counts.all_failed()
    }
}

/// A document handed to a batch
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub name: String,
    pub text: String,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// How one document of a batch ended
#[derive(Debug)]
pub enum DocumentOutcome {
    Completed(DocumentResult),
    Failed {
        error: String,
        /// Segment results, when the document got as far as translation
        partial: Option<DocumentResult>,
    },
}

/// One entry of a batch result, in input order
#[derive(Debug)]
pub struct BatchDocument {
    pub name: String,
    pub outcome: DocumentOutcome,
}

impl BatchDocument {
    pub fn result(&self) -> Option<&DocumentResult> {
        match &self.outcome {
            DocumentOutcome::Completed(result) => Some(result),
            DocumentOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Failed { .. })
    }
}

/// Outcome of a batch; statistics cover completed documents only
#[derive(Debug)]
pub struct BatchResult {
    pub documents: Vec<BatchDocument>,
    pub summary: StatsSummary,
}

impl BatchResult {
    pub fn completed(&self) -> impl Iterator<Item = (&str, &DocumentResult)> {
        self.documents
            .iter()
            .filter_map(|d| d.result().map(|r| (d.name.as_str(), r)))
    }

    pub fn failed_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_failed()).count()
    }
}

/// Everything a segment worker needs, shared by the workers of one document
struct SegmentContext<'a> {
    target_language: &'a str,
    options: &'a ProcessOptions,
    gate: ComplexityGate,
    instructions: &'a str,
    glossary: &'a [GlossaryEntry],
    events: &'a Emitter,
}

/// Translation pipeline over injected engines and stores
#[derive(Clone)]
pub struct Pipeline {
    translator: TranslationClient,
    review: Arc<dyn ReviewStage>,
    review_style: ReviewStyle,
    cache: Option<CacheIndex>,
    glossaries: Option<Arc<dyn GlossaryStore>>,
    max_segment_chars: usize,
    concurrent_requests: usize,
    concurrent_documents: usize,
    limiter: Arc<Semaphore>,
    cancel: CancelToken,
}

const DEFAULT_SEGMENT_CHARS: usize = 4000;
const DEFAULT_CONCURRENT_REQUESTS: usize = 4;
const DEFAULT_CONCURRENT_DOCUMENTS: usize = 2;

impl Pipeline {
    /// Create a pipeline without cache or glossary support
    pub fn new(translator: TranslationClient, review: Arc<dyn ReviewStage>) -> Self {
        Self {
            translator,
            review,
            review_style: ReviewStyle::default(),
            cache: None,
            glossaries: None,
            max_segment_chars: DEFAULT_SEGMENT_CHARS,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            concurrent_documents: DEFAULT_CONCURRENT_DOCUMENTS,
            limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
            cancel: CancelToken::new(),
        }
    }

    /// Build engines and stages from a validated configuration
    pub fn from_config(
        config: &Config,
        cache: Arc<dyn CachePersistence>,
        glossaries: Arc<dyn GlossaryStore>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let translation = &config.translation;
        let engine: Arc<dyn TranslationEngine> = match translation.provider {
            TranslationProvider::DeepL => Arc::new(DeepL::new(
                translation.api_key.clone(),
                translation.endpoint.clone(),
                translation.timeout(),
            )),
            TranslationProvider::Mock => Arc::new(MockTranslator::working()),
        };
        let retry = RetryPolicy::new(
            translation.retry_count,
            Duration::from_millis(translation.retry_backoff_ms),
            translation.retry_multiplier,
        );
        let translator = TranslationClient::new(engine, retry, translation.timeout());

        let review_config = &config.review;
        let max_wait = Duration::from_secs(review_config.max_wait_secs);
        let poll_interval = Duration::from_millis(review_config.poll_interval_ms);
        let review: Arc<dyn ReviewStage> = match review_config.provider {
            ReviewProvider::OpenAI => Arc::new(ReviewClient::new(
                Arc::new(OpenAIAssistant::new(
                    review_config.api_key.clone(),
                    review_config.assistant_id.clone(),
                    review_config.endpoint.clone(),
                    translation.timeout(),
                )),
                max_wait,
                poll_interval,
            )),
            ReviewProvider::Mock => Arc::new(ReviewClient::new(
                Arc::new(MockReviewer::improving()),
                max_wait,
                poll_interval,
            )),
            ReviewProvider::Disabled => Arc::new(PassthroughReview),
        };

        info!(
            "Pipeline ready: {} translation, {} review, {} concurrent requests",
            translation.provider.display_name(),
            review_config.provider,
            config.pipeline.concurrent_requests
        );

        Ok(Self::new(translator, review)
            .with_review_style(review_config.style)
            .with_cache(
                CacheIndex::with_sample_chars(cache, config.pipeline.fingerprint_sample_chars)
                    .with_timeout(translation.timeout()),
            )
            .with_glossaries(glossaries)
            .with_segment_size(config.pipeline.max_segment_chars)
            .with_concurrency(
                config.pipeline.concurrent_requests,
                config.pipeline.concurrent_documents,
            ))
    }

    pub fn with_cache(mut self, cache: CacheIndex) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_glossaries(mut self, glossaries: Arc<dyn GlossaryStore>) -> Self {
        self.glossaries = Some(glossaries);
        self
    }

    pub fn with_review_style(mut self, style: ReviewStyle) -> Self {
        self.review_style = style;
        self
    }

    pub fn with_segment_size(mut self, max_segment_chars: usize) -> Self {
        self.max_segment_chars = max_segment_chars.max(1);
        self
    }

    /// Bound in-flight external calls and documents processed at once
    pub fn with_concurrency(mut self, requests: usize, documents: usize) -> Self {
        self.concurrent_requests = requests.max(1);
        self.concurrent_documents = documents.max(1);
        self.limiter = Arc::new(Semaphore::new(self.concurrent_requests));
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token aborting every run of this pipeline and its clones
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Translate one document
    pub async fn process_document(
        &self,
        text: &str,
        target_language: &str,
        options: &ProcessOptions,
    ) -> Result<DocumentResult, PipelineError> {
        let target_language = normalize_language(target_language)?;
        self.run_document(text, &target_language, options, &Emitter::none())
            .await
    }

    /// Translate one document, reporting progress to `events`. The last event
    /// sent is always `Completed` or `Error`.
    pub async fn process_document_with_events(
        &self,
        text: &str,
        target_language: &str,
        options: &ProcessOptions,
        events: UnboundedSender<StageEvent>,
    ) -> Result<DocumentResult, PipelineError> {
        let emitter = Emitter::new(events);
        let result = match normalize_language(target_language) {
            Ok(language) => self.run_document(text, &language, options, &emitter).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(document) => emitter.emit(StageEvent::Completed {
                document_id: document.document_id.clone(),
                failed_segments: document.failed_segments(),
                stats: document.summary(),
            }),
            Err(e) => emitter.emit(StageEvent::Error { message: e.to_string() }),
        }
        result
    }

    /// Lazy event sequence of one document run. Nothing happens until the
    /// stream is first polled; every call starts a fresh run. The run is
    /// driven by the stream itself, so dropping the stream aborts it.
    pub fn event_stream(
        &self,
        text: impl Into<String>,
        target_language: impl Into<String>,
        options: ProcessOptions,
    ) -> impl Stream<Item = StageEvent> + Send + 'static {
        let pipeline = self.clone();
        let text = text.into();
        let target_language = target_language.into();

        stream::once(async move {
            let (sender, receiver) = mpsc::unbounded();
            let run = stream::once(async move {
                let _ = pipeline
                    .process_document_with_events(&text, &target_language, &options, sender)
                    .await;
            })
            .filter_map(|()| future::ready(None::<StageEvent>));
            stream::select(receiver, run)
        })
        .flatten()
    }

    /// Translate several documents. One document failing never affects the
    /// others; only an invalid target language rejects the whole batch.
    pub async fn process_batch(
        &self,
        documents: Vec<DocumentInput>,
        target_language: &str,
        options: &ProcessOptions,
    ) -> Result<BatchResult, PipelineError> {
        let target_language = normalize_language(target_language)?;
        let total = documents.len();
        let start_time = Instant::now();
        info!("Processing batch of {} documents into {}", total, target_language);

        let results: Vec<(String, Result<DocumentResult, PipelineError>)> = stream::iter(documents)
            .map(|document| {
                let target_language = target_language.as_str();
                async move {
                    let result = self
                        .run_document(&document.text, target_language, options, &Emitter::none())
                        .await;
                    (document.name, result)
                }
            })
            .buffered(self.concurrent_documents)
            .collect()
            .await;

        let mut aggregator = StatsAggregator::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (name, result) in results {
            let outcome = match result {
                Ok(document) if document.is_failed() => {
                    error!("Document {} failed: all {} segments failed", name, document.segments.len());
                    DocumentOutcome::Failed {
                        error: format!("all {} segments failed", document.segments.len()),
                        partial: Some(document),
                    }
                }
                Ok(document) => {
                    aggregator.fold(&document.stats);
                    DocumentOutcome::Completed(document)
                }
                Err(e) => {
                    error!("Document {} failed: {}", name, e);
                    DocumentOutcome::Failed {
                        error: e.to_string(),
                        partial: None,
                    }
                }
            };
            outcomes.push(BatchDocument { name, outcome });
        }

        info!(
            "Batch finished in {:.1}s: {} of {} documents completed",
            start_time.elapsed().as_secs_f64(),
            aggregator.documents(),
            total
        );
        Ok(BatchResult {
            documents: outcomes,
            summary: aggregator.summary(),
        })
    }

    async fn run_document(
        &self,
        text: &str,
        target_language: &str,
        options: &ProcessOptions,
        events: &Emitter,
    ) -> Result<DocumentResult, PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let document_id = Uuid::new_v4().to_string();
        events.emit(StageEvent::Started {
            document_id: document_id.clone(),
            target_language: target_language.to_string(),
        });

        let glossary = self.load_glossary(options.glossary_id.as_deref()).await?;

        let chunks = segmenter::split(text, self.max_segment_chars);
        let total = chunks.len();
        debug!("Document {} split into {} segments", document_id, total);
        for (index, chunk) in chunks.iter().enumerate() {
            events.emit(StageEvent::SegmentExtracted {
                index,
                total,
                chars: chunk.chars().count(),
            });
        }

        let instructions = if self.review.is_enabled() {
            review::compose_instructions(
                options.custom_instructions.as_deref(),
                target_language,
                self.review_style,
            )
        } else {
            String::new()
        };
        let context = SegmentContext {
            target_language,
            options,
            gate: ComplexityGate::new(options.smart_review, options.complexity_threshold),
            instructions: &instructions,
            glossary: &glossary,
            events,
        };

        let mut results: Vec<(Segment, BTreeSet<String>)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| self.process_segment(&context, index, chunk))
            .buffer_unordered(self.concurrent_requests)
            .collect()
            .await;
        results.sort_by_key(|(segment, _)| segment.order_index);

        if self.cancel.is_cancelled() {
            warn!("Document {} cancelled after {} segments", document_id, results.len());
            return Err(PipelineError::Cancelled);
        }

        let mut counts = SegmentCounts::default();
        for (segment, terms) in &results {
            counts.record(segment, terms);
        }
        let segments: Vec<Segment> = results.into_iter().map(|(segment, _)| segment).collect();
        let combined_text = segments
            .iter()
            .filter(|s| s.status != SegmentStatus::Failed)
            .map(|s| s.translated_text.as_str())
            .collect::<Vec<_>>()
            .join(segmenter::PARAGRAPH_SEPARATOR);

        if counts.failed > 0 {
            warn!("Document {}: {} of {} segments failed", document_id, counts.failed, counts.total);
        }

        Ok(DocumentResult {
            document_id,
            target_language: target_language.to_string(),
            segments,
            stats: DocumentStats::from_counts(counts),
            combined_text,
        })
    }

    async fn load_glossary(&self, glossary_id: Option<&str>) -> Result<Vec<GlossaryEntry>, PipelineError> {
        let Some(glossary_id) = glossary_id else {
            return Ok(Vec::new());
        };

        let entries = match &self.glossaries {
            Some(store) => store.list_entries(glossary_id).await,
            None => Err(StorageError::NotFound("no glossary store configured".to_string())),
        }
        .map_err(|source| PipelineError::Glossary {
            glossary_id: glossary_id.to_string(),
            source,
        })?;

        debug!("Loaded {} glossary entries from {}", entries.len(), glossary_id);
        Ok(glossary::sort_entries(&entries))
    }

    /// Full pipeline for one segment. Never fails; errors end up on the segment.
    async fn process_segment(
        &self,
        context: &SegmentContext<'_>,
        index: usize,
        text: String,
    ) -> (Segment, BTreeSet<String>) {
        let mut segment = Segment::new(index, text);
        let language = context.target_language;

        let cache = self.cache.as_ref().filter(|_| context.options.use_cache);
        let source_hash = cache.map(|c| c.fingerprint(&segment.original_text, language));

        let cached = match (cache, &source_hash) {
            (Some(cache), Some(hash)) => cache.lookup_or_miss(hash, language, &self.cancel).await,
            _ => None,
        };

        let hit = cached.is_some();
        let translated = match cached {
            Some(text) => Ok(text),
            None => self.translate(&segment.original_text, language).await,
        };

        match translated {
            Ok(text) => {
                if let (Some(cache), Some(hash), false) = (cache, &source_hash, hit) {
                    cache
                        .insert_or_log(
                            hash,
                            &segment.original_text,
                            language,
                            &text,
                            &context.options.owner,
                            &self.cancel,
                        )
                        .await;
                }
                let metadata = source_hash.map(|source_hash| CacheMetadata { source_hash, hit });
                segment.mark_translated(text, metadata);
            }
            Err(e) => {
                warn!("Segment {} failed: {}", index, e);
                segment.fail(&e);
                context.events.emit(StageEvent::SegmentFailed {
                    index,
                    error: e.to_string(),
                });
                return (segment, BTreeSet::new());
            }
        }
        context.events.emit(StageEvent::SegmentTranslated { index, cached: hit });

        self.review_segment(context, &mut segment).await;
        context.events.emit(StageEvent::SegmentReviewed {
            index,
            skipped_reason: segment.review_skipped_reason,
        });

        if context.glossary.is_empty() {
            return (segment, BTreeSet::new());
        }
        let substitution = glossary::apply(&segment.translated_text, context.glossary);
        segment.apply_substitution(substitution.text, substitution.hits);
        (segment, substitution.terms_used)
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| TranslationError::Cancelled)?;
        self.translator.translate(text, target_language, &self.cancel).await
    }

    async fn review_segment(&self, context: &SegmentContext<'_>, segment: &mut Segment) {
        if !self.review.is_enabled() {
            segment.skip_review(ReviewSkipReason::ReviewDisabled);
            return;
        }

        let decision = context.gate.evaluate(&segment.original_text);
        if !decision.should_review() {
            debug!("Segment {} below complexity threshold: {:?}", segment.order_index, decision);
            segment.skip_review(ReviewSkipReason::LowComplexity);
            return;
        }

        let outcome = match self.limiter.acquire().await {
            Ok(_permit) => {
                self.review
                    .review(&segment.translated_text, context.instructions, &self.cancel)
                    .await
            }
            Err(_) => ReviewOutcome::Kept(ReviewSkipReason::ReviewFailed),
        };

        match outcome {
            ReviewOutcome::Improved(text) | ReviewOutcome::Partial(text) => segment.mark_reviewed(text),
            ReviewOutcome::Kept(reason) => segment.skip_review(reason),
        }
    }
}

fn normalize_language(target_language: &str) -> Result<String, PipelineError> {
    language_utils::normalize_target_code(target_language).map_err(|e| {
        PipelineError::Configuration(ConfigurationError::InvalidSetting {
            field: "target_language".to_string(),
            reason: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::providers::mock::MockReviewer;
    use crate::providers::TranslationEngine;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn pipeline(engine: MockTranslator) -> Pipeline {
        let client = TranslationClient::new(Arc::new(engine), RetryPolicy::immediate(3), Duration::from_secs(5));
        Pipeline::new(client, Arc::new(PassthroughReview)).with_segment_size(20)
    }

    /// Holds back any text containing "First" and records completion order
    #[derive(Debug, Default)]
    struct SlowFirstEngine {
        completed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TranslationEngine for SlowFirstEngine {
        fn name(&self) -> &str {
            "slow-first"
        }

        async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
            if text.contains("First") {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            self.completed.lock().push(text.to_string());
            Ok(format!("[{}] {}", target_language, text))
        }
    }

    #[tokio::test]
    async fn test_process_document_shouldPreserveSegmentOrder() {
        let text = "First one.\n\nSecond one.\n\nThird one.\n\nFourth one.";
        let result = pipeline(MockTranslator::working())
            .with_concurrency(4, 1)
            .process_document(text, "sv", &ProcessOptions::default())
            .await
            .unwrap();

        let indices: Vec<usize> = result.segments.iter().map(|s| s.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(result.segments[3].translated_text, "[SV] Fourth one.");
        assert_eq!(
            result.combined_text,
            "[SV] First one.\n\n[SV] Second one.\n\n[SV] Third one.\n\n[SV] Fourth one."
        );
    }

    #[tokio::test]
    async fn test_process_document_withSlowFirstSegment_shouldStillOrderByIndex() {
        let engine = Arc::new(SlowFirstEngine::default());
        let client = TranslationClient::new(engine.clone(), RetryPolicy::immediate(1), Duration::from_secs(5));
        let text = "First one.\n\nSecond one.\n\nThird one.\n\nFourth one.";

        let result = Pipeline::new(client, Arc::new(PassthroughReview))
            .with_segment_size(20)
            .with_concurrency(4, 1)
            .process_document(text, "sv", &ProcessOptions::default())
            .await
            .unwrap();

        let completed = engine.completed.lock().clone();
        assert_eq!(completed.len(), 4);
        assert_eq!(completed.last().map(String::as_str), Some("First one."));
        assert_ne!(completed[0], "First one.");

        let indices: Vec<usize> = result.segments.iter().map(|s| s.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(result.segments[0].translated_text, "[SV] First one.");
        assert_eq!(
            result.combined_text,
            "[SV] First one.\n\n[SV] Second one.\n\n[SV] Third one.\n\n[SV] Fourth one."
        );
    }

    #[tokio::test]
    async fn test_process_document_withPassthroughReview_shouldMarkReviewDisabled() {
        let result = pipeline(MockTranslator::working())
            .process_document("Hello.", "SV", &ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(result.segments[0].status, SegmentStatus::Translated);
        assert_eq!(
            result.segments[0].review_skipped_reason,
            Some(ReviewSkipReason::ReviewDisabled)
        );
        assert_eq!(result.summary().smart_review_savings, 0);
    }

    #[tokio::test]
    async fn test_process_document_withInvalidLanguage_shouldFailAtEntry() {
        let engine = MockTranslator::working();
        let result = pipeline(engine.clone())
            .process_document("Hello.", "klingon", &ProcessOptions::default())
            .await;

        assert!(matches!(result, Err(PipelineError::Configuration(_))));
        assert_eq!(engine.request_count(), 0);
    }

    #[tokio::test]
    async fn test_process_document_withMissingGlossary_shouldFailDocument() {
        let store = MemoryStore::new();
        let result = pipeline(MockTranslator::working())
            .with_glossaries(Arc::new(store))
            .process_document("Hello.", "SV", &ProcessOptions::default().with_glossary("missing"))
            .await;

        assert!(matches!(result, Err(PipelineError::Glossary { .. })));
    }

    #[tokio::test]
    async fn test_process_document_withFailingSegment_shouldKeepSiblings() {
        let engine = MockTranslator::failing_when(|text| text.contains("broken"));
        let result = pipeline(engine)
            .process_document("Fine text.\n\nbroken text\n\nMore text.", "SV", &ProcessOptions::default())
            .await
            .unwrap();

        let statuses: Vec<SegmentStatus> = result.segments.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![SegmentStatus::Translated, SegmentStatus::Failed, SegmentStatus::Translated]
        );
        assert_eq!(result.failed_segments(), 1);
        assert!(!result.is_failed());
        assert_eq!(result.combined_text, "[SV] Fine text.\n\n[SV] More text.");
    }

    #[tokio::test]
    async fn test_process_document_withCancelledToken_shouldReturnCancelled() {
        let pipeline = pipeline(MockTranslator::working());
        pipeline.cancel_token().cancel();

        let result = pipeline
            .process_document("Hello.", "SV", &ProcessOptions::default())
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_process_document_withReviewer_shouldReviewComplexSegments() {
        let reviewer = MockReviewer::improving();
        let client = TranslationClient::new(
            Arc::new(MockTranslator::working()),
            RetryPolicy::immediate(1),
            Duration::from_secs(5),
        );
        let review = ReviewClient::new(Arc::new(reviewer.clone()), Duration::from_secs(1), Duration::from_millis(5));
        let options = ProcessOptions {
            complexity_threshold: 0.0,
            ..Default::default()
        };

        let result = Pipeline::new(client, Arc::new(review))
            .process_document("Hello there.", "SV", &options)
            .await
            .unwrap();

        assert_eq!(result.segments[0].status, SegmentStatus::Reviewed);
        assert_eq!(result.segments[0].translated_text, "[SV] Hello there. (reviewed)");
        assert_eq!(reviewer.review_count(), 1);
    }
}
