/*!
 * Tests for statistics aggregation
 */

use std::collections::BTreeSet;

use booktranslate::translation::document::{CacheMetadata, ReviewSkipReason, Segment};
use booktranslate::translation::stats::{DocumentStats, SegmentCounts, StatsAggregator};

fn cached_segment(index: usize, hit: bool) -> Segment {
    let mut segment = Segment::new(index, "Hello.");
    segment.mark_translated(
        "Hej.".to_string(),
        Some(CacheMetadata {
            source_hash: "hash".to_string(),
            hit,
        }),
    );
    segment
}

#[test]
fn test_fromCounts_shouldExpressRatiosAsPercentages() {
    let mut counts = SegmentCounts::default();
    for (index, hit) in [true, false, false, false].into_iter().enumerate() {
        let mut segment = cached_segment(index, hit);
        segment.skip_review(ReviewSkipReason::LowComplexity);
        counts.record(&segment, &BTreeSet::new());
    }

    let stats = DocumentStats::from_counts(counts);

    assert_eq!(stats.counts.cache_hits, 1);
    assert!((stats.cache_ratio - 25.0).abs() < 1e-9);
    assert!((stats.smart_review_ratio - 100.0).abs() < 1e-9);
    assert_eq!(stats.glossary_ratio, 0.0);
}

#[test]
fn test_fold_shouldWeighDocumentsEquallyRegardlessOfSize() {
    let mut small = SegmentCounts::default();
    small.record(&cached_segment(0, true), &BTreeSet::new());

    let mut large = SegmentCounts::default();
    for index in 0..9 {
        large.record(&cached_segment(index, false), &BTreeSet::new());
    }

    let mut aggregator = StatsAggregator::new();
    aggregator.fold(&DocumentStats::from_counts(small));
    aggregator.fold(&DocumentStats::from_counts(large));
    let summary = aggregator.summary();

    assert_eq!(aggregator.documents(), 2);
    assert_eq!(summary.cache_hits, 1);
    assert!((summary.cache_ratio - 50.0).abs() < 1e-9);
}
