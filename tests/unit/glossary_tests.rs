/*!
 * Tests for glossary substitution
 */

use booktranslate::translation::glossary::{self, GlossaryEntry};

fn glossary() -> Vec<GlossaryEntry> {
    glossary::sort_entries(&[
        GlossaryEntry::new("cat", "katt"),
        GlossaryEntry::new("catalog", "katalog").with_context("library"),
        GlossaryEntry::new("", "ignored"),
    ])
}

#[test]
fn test_apply_withPunctuation_shouldTreatItAsWordBoundary() {
    let result = glossary::apply("The catalog, the cat. A cat!", &glossary());

    assert_eq!(result.text, "The katalog, the katt. A katt!");
    assert_eq!(result.hits, 3);
    assert_eq!(
        result.terms_used.into_iter().collect::<Vec<_>>(),
        vec!["cat".to_string(), "catalog".to_string()]
    );
}

#[test]
fn test_apply_withTermInsideWord_shouldNotReplace() {
    let result = glossary::apply("concatenate scatter cats", &glossary());

    assert_eq!(result.text, "concatenate scatter cats");
    assert_eq!(result.hits, 0);
    assert!(result.terms_used.is_empty());
}

#[test]
fn test_sortEntries_shouldDropEmptyTerms() {
    let sorted = glossary();
    assert_eq!(sorted.len(), 2);
    assert_eq!(sorted[0].source_term, "catalog");
}
