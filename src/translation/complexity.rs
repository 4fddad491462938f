/*!
 * Complexity scoring for smart review.
 *
 * The score (0-100) combines four signals of the source text:
 * - average sentence length (up to 35 points)
 * - sentence length variation (up to 15 points)
 * - share of long, uncommon words (up to 35 points)
 * - punctuation density (up to 15 points)
 *
 * Segments scoring below the threshold skip the review stage. This is a cost
 * heuristic, not a quality judgement.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default score below which review is skipped
pub const DEFAULT_THRESHOLD: f64 = 40.0;

const SENTENCE_LENGTH_WEIGHT: f64 = 35.0;
const VARIATION_WEIGHT: f64 = 15.0;
const RARE_WORD_WEIGHT: f64 = 35.0;
const PUNCTUATION_WEIGHT: f64 = 15.0;

/// Average sentence length (in words) that earns the full length score
const LONG_SENTENCE_WORDS: f64 = 25.0;
/// Rare-word share that earns the full rare-word score
const RARE_WORD_SATURATION: f64 = 0.3;
/// Clause punctuation per word that earns the full punctuation score
const PUNCTUATION_SATURATION: f64 = 0.25;
/// Words shorter than this are never considered rare
const RARE_WORD_MIN_CHARS: usize = 7;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+(\s+|$)").unwrap());

static COMMON_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "because", "between", "through", "without", "another", "nothing", "something",
        "everything", "someone", "everyone", "already", "against", "himself", "herself",
        "thought", "morning", "evening", "brother", "sister", "mother", "father", "children",
        "looking", "getting", "started", "himself", "however", "perhaps", "anything",
        "together", "whether", "suddenly", "little", "another", "walking", "talking",
    ]
    .into_iter()
    .collect()
});

/// Complexity score of `text`, deterministic and in `0.0..=100.0`
pub fn score(text: &str) -> f64 {
    let words = words(text);
    if words.is_empty() {
        return 0.0;
    }

    let sentence_lengths: Vec<f64> = SENTENCE_END
        .split(text)
        .map(|s| words_in(s) as f64)
        .filter(|&n| n > 0.0)
        .collect();
    let sentence_count = sentence_lengths.len().max(1) as f64;
    let word_count = words.len() as f64;

    let average = word_count / sentence_count;
    let length_score = (average / LONG_SENTENCE_WORDS).min(1.0) * SENTENCE_LENGTH_WEIGHT;

    let variation_score = coefficient_of_variation(&sentence_lengths).min(1.0) * VARIATION_WEIGHT;

    let rare = words.iter().filter(|w| is_rare(w)).count() as f64;
    let rare_score = ((rare / word_count) / RARE_WORD_SATURATION).min(1.0) * RARE_WORD_WEIGHT;

    let punctuation = text.chars().filter(|c| is_clause_punctuation(*c)).count() as f64;
    let punctuation_score =
        ((punctuation / word_count) / PUNCTUATION_SATURATION).min(1.0) * PUNCTUATION_WEIGHT;

    length_score + variation_score + rare_score + punctuation_score
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| w.chars().any(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

fn words_in(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| w.chars().any(char::is_alphabetic))
        .count()
}

fn is_rare(word: &str) -> bool {
    word.chars().count() >= RARE_WORD_MIN_CHARS && !COMMON_WORDS.contains(word)
}

fn is_clause_punctuation(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '(' | ')' | '-' | '–' | '—' | '"' | '«' | '»' | '“' | '”')
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Outcome of the gate for one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Send the segment to review
    Review { score: f64 },
    /// Skip review, the segment is too simple to be worth it
    Skip { score: f64 },
    /// Smart review is off; every segment is reviewed
    Bypassed,
}

impl GateDecision {
    pub fn should_review(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

/// Admission control for the review stage
#[derive(Debug, Clone, Copy)]
pub struct ComplexityGate {
    enabled: bool,
    threshold: f64,
}

impl ComplexityGate {
    pub fn new(enabled: bool, threshold: f64) -> Self {
        Self { enabled, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Decide whether `text` goes through review
    pub fn evaluate(&self, text: &str) -> GateDecision {
        if !self.enabled {
            return GateDecision::Bypassed;
        }
        let score = score(text);
        if score < self.threshold {
            GateDecision::Skip { score }
        } else {
            GateDecision::Review { score }
        }
    }
}

impl Default for ComplexityGate {
    fn default() -> Self {
        Self::new(true, DEFAULT_THRESHOLD)
    }
}
