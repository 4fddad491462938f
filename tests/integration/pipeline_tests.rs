/*!
 * Document and batch processing tests over mock engines
 */

use std::sync::Arc;

use booktranslate::errors::PipelineError;
use booktranslate::providers::mock::{MockBehavior, MockReviewer, MockTranslator};
use booktranslate::storage::MemoryStore;
use booktranslate::translation::cache::CacheIndex;
use booktranslate::translation::{
    DocumentInput, DocumentOutcome, GlossaryEntry, ProcessOptions, ReviewSkipReason, SegmentStatus,
};

use crate::common::{self, COMPLEX_TEXT, SIMPLE_TEXT};

fn poisoned(text: &str) -> bool {
    text.contains("poison")
}

#[tokio::test]
async fn test_processBatch_withOneBrokenDocument_shouldCompleteTheOthers() {
    common::init_test_logging();
    let engine = MockTranslator::failing_when(poisoned);
    let pipeline = common::passthrough_pipeline(engine).with_concurrency(4, 3);

    let documents = vec![
        DocumentInput::new("first", "Once upon a time."),
        DocumentInput::new("second", "poison one.\n\npoison two."),
        DocumentInput::new("third", "The end."),
    ];
    let batch = pipeline
        .process_batch(documents, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    let names: Vec<&str> = batch.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(batch.failed_count(), 1);

    match &batch.documents[1].outcome {
        DocumentOutcome::Failed { partial: Some(partial), .. } => {
            assert!(partial.segments.iter().all(|s| s.status == SegmentStatus::Failed));
        }
        other => panic!("expected a failed document with partial results, got {:?}", other),
    }

    let completed: Vec<String> = batch
        .completed()
        .map(|(_, result)| result.combined_text.clone())
        .collect();
    assert_eq!(completed, vec!["[SV] Once upon a time.".to_string(), "[SV] The end.".to_string()]);
}

#[tokio::test]
async fn test_processBatch_withInvalidLanguage_shouldRejectWholeBatch() {
    let engine = MockTranslator::working();
    let result = common::passthrough_pipeline(engine.clone())
        .process_batch(vec![DocumentInput::new("a", "Hello.")], "nowhere", &ProcessOptions::default())
        .await;

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_smartReview_withSimpleSegment_shouldNeverCallReviewer() {
    let reviewer = MockReviewer::improving();
    let result = common::reviewing_pipeline(MockTranslator::working(), reviewer.clone())
        .process_document(SIMPLE_TEXT, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(reviewer.review_count(), 0);
    assert_eq!(result.segments[0].status, SegmentStatus::Translated);
    assert_eq!(result.segments[0].review_skipped_reason, Some(ReviewSkipReason::LowComplexity));
    assert_eq!(result.summary().smart_review_savings, 1);
}

#[tokio::test]
async fn test_smartReview_withMixedDocument_shouldReviewOnlyComplexSegment() {
    let reviewer = MockReviewer::improving();
    let text = format!("{}\n\n{}", SIMPLE_TEXT, COMPLEX_TEXT);

    let result = common::reviewing_pipeline(MockTranslator::working(), reviewer.clone())
        .with_segment_size(60)
        .process_document(&text, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(result.segments.len(), 2);
    assert_eq!(reviewer.review_count(), 1);
    assert_eq!(result.segments[0].status, SegmentStatus::Translated);
    assert_eq!(result.segments[1].status, SegmentStatus::Reviewed);
    assert_eq!(
        result.segments[1].translated_text,
        MockReviewer::reviewed(&format!("[SV] {}", COMPLEX_TEXT))
    );
    assert!((result.summary().smart_review_ratio - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_smartReview_disabled_shouldReviewEverySegment() {
    let reviewer = MockReviewer::improving();
    let options = ProcessOptions {
        smart_review: false,
        ..Default::default()
    };

    let result = common::reviewing_pipeline(MockTranslator::working(), reviewer.clone())
        .process_document(SIMPLE_TEXT, "SV", &options)
        .await
        .unwrap();

    assert_eq!(reviewer.review_count(), 1);
    assert_eq!(result.segments[0].status, SegmentStatus::Reviewed);
}

#[tokio::test]
async fn test_review_withStalledReviewer_shouldKeepPartialResult() {
    let result = common::reviewing_pipeline(MockTranslator::working(), MockReviewer::stalled(true))
        .process_document(COMPLEX_TEXT, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(result.segments[0].status, SegmentStatus::Reviewed);
    assert_eq!(result.segments[0].translated_text, format!("[SV] {} (partial)", COMPLEX_TEXT));
}

#[tokio::test]
async fn test_review_withStalledReviewerAndNoPartial_shouldKeepTranslation() {
    let result = common::reviewing_pipeline(MockTranslator::working(), MockReviewer::stalled(false))
        .process_document(COMPLEX_TEXT, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(result.segments[0].status, SegmentStatus::Translated);
    assert_eq!(result.segments[0].review_skipped_reason, Some(ReviewSkipReason::ReviewTimeout));
    assert_eq!(result.segments[0].translated_text, format!("[SV] {}", COMPLEX_TEXT));
}

#[tokio::test]
async fn test_review_withFailingReviewer_shouldKeepTranslation() {
    let result = common::reviewing_pipeline(MockTranslator::working(), MockReviewer::failing())
        .process_document(COMPLEX_TEXT, "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(result.segments[0].status, SegmentStatus::Translated);
    assert_eq!(result.segments[0].review_skipped_reason, Some(ReviewSkipReason::ReviewFailed));
}

#[tokio::test]
async fn test_cache_withRepeatedSegment_shouldSkipEngineOnHit() {
    let store = MemoryStore::new();
    let engine = MockTranslator::working();
    let pipeline = common::passthrough_pipeline(engine.clone())
        .with_cache(CacheIndex::new(Arc::new(store.clone())));

    let first = pipeline
        .process_document("Hello there.", "SV", &ProcessOptions::default())
        .await
        .unwrap();
    assert_eq!(engine.request_count(), 1);
    assert_eq!(store.cache_len(), 1);
    assert_eq!(first.summary().cache_hits, 0);

    let second = pipeline
        .process_document("Hello there.", "sv", &ProcessOptions::default())
        .await
        .unwrap();
    assert_eq!(engine.request_count(), 1);
    assert_eq!(store.cache_len(), 1);
    assert_eq!(second.segments[0].translated_text, "[SV] Hello there.");
    assert!(second.segments[0].cache_metadata.as_ref().is_some_and(|m| m.hit));
    assert!((second.summary().cache_ratio - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_cache_withOtherTargetLanguage_shouldMiss() {
    let store = MemoryStore::new();
    let engine = MockTranslator::working();
    let pipeline = common::passthrough_pipeline(engine.clone())
        .with_cache(CacheIndex::new(Arc::new(store.clone())));

    pipeline.process_document("Hello.", "SV", &ProcessOptions::default()).await.unwrap();
    let german = pipeline.process_document("Hello.", "DE", &ProcessOptions::default()).await.unwrap();

    assert_eq!(engine.request_count(), 2);
    assert_eq!(german.segments[0].translated_text, "[DE] Hello.");
}

#[tokio::test]
async fn test_cache_disabledPerCall_shouldAlwaysTranslate() {
    let store = MemoryStore::new();
    let engine = MockTranslator::working();
    let pipeline = common::passthrough_pipeline(engine.clone())
        .with_cache(CacheIndex::new(Arc::new(store.clone())));
    let options = ProcessOptions {
        use_cache: false,
        ..Default::default()
    };

    pipeline.process_document("Hello.", "SV", &options).await.unwrap();
    pipeline.process_document("Hello.", "SV", &options).await.unwrap();

    assert_eq!(engine.request_count(), 2);
    assert_eq!(store.cache_len(), 0);
}

#[tokio::test]
async fn test_retry_withIntermittentEngine_shouldRecoverEverySegment() {
    let engine = MockTranslator::intermittent(2);
    let result = common::passthrough_pipeline(engine.clone())
        .with_concurrency(1, 1)
        .with_segment_size(10)
        .process_document("First.\n\nSecond.", "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(result.failed_segments(), 0);
    assert_eq!(engine.request_count(), 3);
}

#[tokio::test]
async fn test_retry_withAuthenticationError_shouldNotRetry() {
    let engine = MockTranslator::new(MockBehavior::Unauthorized);
    let result = common::passthrough_pipeline(engine.clone())
        .process_document("Hello.", "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(engine.request_count(), 1);
    assert!(result.is_failed());
    assert!(result.segments[0].error.is_some());
}

#[tokio::test]
async fn test_glossary_shouldApplyAfterReview() {
    let store = MemoryStore::new();
    store.add_glossary(
        "legal",
        vec![GlossaryEntry::new("tribunal's", "domstolens"), GlossaryEntry::new("reviewed", "granskad")],
    );
    let options = ProcessOptions::default().with_glossary("legal");

    let result = common::reviewing_pipeline(MockTranslator::working(), MockReviewer::improving())
        .with_glossaries(Arc::new(store))
        .process_document(COMPLEX_TEXT, "SV", &options)
        .await
        .unwrap();

    let text = &result.segments[0].translated_text;
    assert!(text.contains("domstolens"), "glossary missing in {}", text);
    assert!(text.ends_with("(granskad)"), "reviewer output not substituted in {}", text);
    assert_eq!(result.segments[0].glossary_hit_count, 2);

    let summary = result.summary();
    assert_eq!(summary.glossary_hits, 2);
    assert_eq!(summary.unique_terms_used, 2);
}
