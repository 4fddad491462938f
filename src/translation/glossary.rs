/*!
 * Glossary substitution applied to translated text.
 *
 * Entries are applied longest source term first so that "catalog" wins over
 * "cat". Substitutions run sequentially over the evolving text: a later entry
 * sees the output of earlier ones. Matching is case-sensitive and only
 * replaces whole words.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A source term and its mandated target rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub source_term: String,
    pub target_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GlossaryEntry {
    pub fn new(source_term: impl Into<String>, target_term: impl Into<String>) -> Self {
        Self {
            source_term: source_term.into(),
            target_term: target_term.into(),
            context: None,
            notes: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Result of applying a glossary to one text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    /// Text after all replacements
    pub text: String,
    /// Total number of replacements made
    pub hits: usize,
    /// Source terms that matched at least once
    pub terms_used: BTreeSet<String>,
}

/// Order entries by descending source term length (in characters), keeping
/// the relative order of equally long terms. Entries with an empty source
/// term are dropped.
pub fn sort_entries(entries: &[GlossaryEntry]) -> Vec<GlossaryEntry> {
    let mut sorted: Vec<GlossaryEntry> = entries
        .iter()
        .filter(|e| !e.source_term.is_empty())
        .cloned()
        .collect();
    sorted.sort_by(|a, b| b.source_term.chars().count().cmp(&a.source_term.chars().count()));
    sorted
}

/// Apply `entries` to `text`. Entries are expected in the order produced by
/// [`sort_entries`].
pub fn apply(text: &str, entries: &[GlossaryEntry]) -> Substitution {
    let mut result = Substitution {
        text: text.to_string(),
        ..Default::default()
    };

    for entry in entries {
        let (replaced, count) = replace_whole_words(&result.text, &entry.source_term, &entry.target_term);
        if count > 0 {
            result.text = replaced;
            result.hits += count;
            result.terms_used.insert(entry.source_term.clone());
        }
    }
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn replace_whole_words(text: &str, term: &str, replacement: &str) -> (String, usize) {
    if term.is_empty() {
        return (text.to_string(), 0);
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for (start, matched) in text.match_indices(term) {
        // Overlaps with a previous replacement
        if start < last {
            continue;
        }
        let end = start + matched.len();
        let before_ok = text[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after_ok = text[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if before_ok && after_ok {
            output.push_str(&text[last..start]);
            output.push_str(replacement);
            last = end;
            count += 1;
        }
    }
    output.push_str(&text[last..]);
    (output, count)
}
