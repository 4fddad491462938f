/*!
 * Tests for the stage event stream of a document run
 */

use futures::StreamExt;
use futures::channel::mpsc;
use std::time::Duration;

use booktranslate::providers::mock::{MockBehavior, MockTranslator};
use booktranslate::translation::{ProcessOptions, StageEvent};

use crate::common;

const THREE_PARAGRAPHS: &str = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";

#[tokio::test]
async fn test_eventStream_shouldStartWithStartedAndEndWithCompleted() {
    let pipeline = common::passthrough_pipeline(MockTranslator::working()).with_segment_size(20);

    let events: Vec<StageEvent> = pipeline
        .event_stream(THREE_PARAGRAPHS, "SV", ProcessOptions::default())
        .collect()
        .await;

    assert!(matches!(events.first(), Some(StageEvent::Started { .. })));
    match events.last() {
        Some(StageEvent::Completed { failed_segments, .. }) => assert_eq!(*failed_segments, 0),
        other => panic!("expected completed event, got {:?}", other),
    }
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let extracted: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            StageEvent::SegmentExtracted { index, total, .. } => {
                assert_eq!(*total, 3);
                Some(*index)
            }
            _ => None,
        })
        .collect();
    assert_eq!(extracted, vec![0, 1, 2]);

    let translated = events
        .iter()
        .filter(|e| matches!(e, StageEvent::SegmentTranslated { cached: false, .. }))
        .count();
    assert_eq!(translated, 3);
}

#[tokio::test]
async fn test_eventStream_shouldReportFailedSegments() {
    let engine = MockTranslator::failing_when(|text| text.starts_with("Second"));
    let pipeline = common::passthrough_pipeline(engine).with_segment_size(20);

    let events: Vec<StageEvent> = pipeline
        .event_stream(THREE_PARAGRAPHS, "SV", ProcessOptions::default())
        .collect()
        .await;

    assert!(events.iter().any(|e| matches!(e, StageEvent::SegmentFailed { index: 1, .. })));
    assert!(matches!(
        events.last(),
        Some(StageEvent::Completed { failed_segments: 1, .. })
    ));
}

#[tokio::test]
async fn test_eventStream_withInvalidLanguage_shouldEmitSingleError() {
    let pipeline = common::passthrough_pipeline(MockTranslator::working());

    let events: Vec<StageEvent> = pipeline
        .event_stream("Hello.", "??", ProcessOptions::default())
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StageEvent::Error { .. }));
}

#[tokio::test]
async fn test_eventStream_shouldNotStartBeforeFirstPoll() {
    let engine = MockTranslator::working();
    let pipeline = common::passthrough_pipeline(engine.clone());

    let stream = pipeline.event_stream("Hello.", "SV", ProcessOptions::default());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.request_count(), 0);

    let events: Vec<StageEvent> = stream.collect().await;
    assert_eq!(engine.request_count(), 1);
    assert!(events.last().is_some_and(|e| e.is_terminal()));
}

#[tokio::test]
async fn test_eventStream_whenDropped_shouldStopEngineCalls() {
    let engine = MockTranslator::new(MockBehavior::Slow { delay_ms: 50 });
    let pipeline = common::passthrough_pipeline(engine.clone())
        .with_segment_size(10)
        .with_concurrency(1, 1);
    let text = (1..=10)
        .map(|i| format!("Part {}.", i))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut stream = Box::pin(pipeline.event_stream(text, "SV", ProcessOptions::default()));
    let first = stream.next().await;
    assert!(matches!(first, Some(StageEvent::Started { .. })));
    drop(stream);

    let at_drop = engine.request_count();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(engine.request_count(), at_drop);
    assert!(at_drop < 10);
}

#[tokio::test]
async fn test_processDocumentWithEvents_shouldCloseChannelAfterTerminalEvent() {
    let pipeline = common::passthrough_pipeline(MockTranslator::working());
    let (sender, receiver) = mpsc::unbounded();

    let result = pipeline
        .process_document_with_events("Hello.", "SV", &ProcessOptions::default(), sender)
        .await
        .unwrap();
    let events: Vec<StageEvent> = receiver.collect().await;

    match events.last() {
        Some(StageEvent::Completed { document_id, .. }) => assert_eq!(document_id, &result.document_id),
        other => panic!("expected completed event, got {:?}", other),
    }
}

#[test]
fn test_stageEvent_shouldSerializeAsTaggedJson() {
    let event = StageEvent::SegmentTranslated { index: 2, cached: true };
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["event"], "segment_translated");
    assert_eq!(json["index"], 2);
    assert_eq!(json["cached"], true);
}
