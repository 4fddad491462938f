/*!
 * Per-document and cross-document statistics.
 *
 * Segment workers only ever produce raw `SegmentCounts`. Ratios are derived
 * once per document by `DocumentStats::from_counts`, and a batch folds
 * documents into a `StatsAggregator` sequentially, after all workers have
 * drained.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::document::{ReviewSkipReason, Segment, SegmentStatus};

/// Raw outcome tallies of one document's segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentCounts {
    pub total: usize,
    pub cache_hits: usize,
    pub smart_review_savings: usize,
    pub reviewed: usize,
    pub failed: usize,
    pub glossary_hits: usize,
    /// Segments with at least one glossary substitution
    pub glossary_segments: usize,
    pub terms_used: BTreeSet<String>,
}

impl SegmentCounts {
    /// Tally one finished segment and the glossary terms it used
    pub fn record(&mut self, segment: &Segment, terms_used: &BTreeSet<String>) {
        self.total += 1;
        if segment.cache_metadata.as_ref().is_some_and(|m| m.hit) {
            self.cache_hits += 1;
        }
        if segment.review_skipped_reason == Some(ReviewSkipReason::LowComplexity) {
            self.smart_review_savings += 1;
        }
        match segment.status {
            SegmentStatus::Reviewed => self.reviewed += 1,
            SegmentStatus::Failed => self.failed += 1,
            _ => {}
        }
        if segment.glossary_hit_count > 0 {
            self.glossary_hits += segment.glossary_hit_count;
            self.glossary_segments += 1;
        }
        self.terms_used.extend(terms_used.iter().cloned());
    }

    /// Every segment failed (and there was at least one)
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failed == self.total
    }
}

/// Statistics of a single document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStats {
    pub counts: SegmentCounts,
    /// Percentage of segments served from the cache
    pub cache_ratio: f64,
    /// Percentage of segments whose review was skipped by the gate
    pub smart_review_ratio: f64,
    /// Percentage of segments touched by the glossary
    pub glossary_ratio: f64,
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl DocumentStats {
    pub fn from_counts(counts: SegmentCounts) -> Self {
        Self {
            cache_ratio: percentage(counts.cache_hits, counts.total),
            smart_review_ratio: percentage(counts.smart_review_savings, counts.total),
            glossary_ratio: percentage(counts.glossary_segments, counts.total),
            counts,
        }
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            cache_hits: self.counts.cache_hits,
            cache_ratio: self.cache_ratio,
            smart_review_savings: self.counts.smart_review_savings,
            smart_review_ratio: self.smart_review_ratio,
            glossary_hits: self.counts.glossary_hits,
            glossary_ratio: self.glossary_ratio,
            unique_terms_used: self.counts.terms_used.len(),
        }
    }
}

/// Statistics reported for a document or a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub cache_hits: usize,
    pub cache_ratio: f64,
    pub smart_review_savings: usize,
    pub smart_review_ratio: f64,
    pub glossary_hits: usize,
    pub glossary_ratio: f64,
    pub unique_terms_used: usize,
}

/// Folds document statistics into batch statistics.
///
/// Counters are summed. Ratios use an equal-weight running mean
/// `new = (old * i + value) / (i + 1)`, so a one-segment document weighs as
/// much as a thousand-segment one.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    folded: usize,
    cache_hits: usize,
    smart_review_savings: usize,
    glossary_hits: usize,
    cache_ratio: f64,
    smart_review_ratio: f64,
    glossary_ratio: f64,
    terms_used: BTreeSet<String>,
}

fn running_mean(average: f64, folded: usize, value: f64) -> f64 {
    let i = folded as f64;
    (average * i + value) / (i + 1.0)
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the next document in
    pub fn fold(&mut self, stats: &DocumentStats) {
        self.cache_ratio = running_mean(self.cache_ratio, self.folded, stats.cache_ratio);
        self.smart_review_ratio =
            running_mean(self.smart_review_ratio, self.folded, stats.smart_review_ratio);
        self.glossary_ratio = running_mean(self.glossary_ratio, self.folded, stats.glossary_ratio);

        self.cache_hits += stats.counts.cache_hits;
        self.smart_review_savings += stats.counts.smart_review_savings;
        self.glossary_hits += stats.counts.glossary_hits;
        self.terms_used.extend(stats.counts.terms_used.iter().cloned());
        self.folded += 1;
    }

    /// Documents folded so far
    pub fn documents(&self) -> usize {
        self.folded
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            cache_hits: self.cache_hits,
            cache_ratio: self.cache_ratio,
            smart_review_savings: self.smart_review_savings,
            smart_review_ratio: self.smart_review_ratio,
            glossary_hits: self.glossary_hits,
            glossary_ratio: self.glossary_ratio,
            unique_terms_used: self.terms_used.len(),
        }
    }
}
