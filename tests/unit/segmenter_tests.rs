/*!
 * Tests for document segmentation
 */

use booktranslate::translation::segmenter::{self, PARAGRAPH_SEPARATOR};

#[test]
fn test_split_withLongParagraph_shouldShareTailWithNextParagraph() {
    let chunks = segmenter::split("One. Two. Three.\n\nFour.", 14);
    assert_eq!(chunks, vec!["One. Two.".to_string(), "Three.\n\nFour.".to_string()]);
}

#[test]
fn test_split_withTightLimit_shouldNotMergeOverflowingTail() {
    let chunks = segmenter::split("One. Two. Three.\n\nFour.", 10);
    assert_eq!(
        chunks,
        vec!["One. Two.".to_string(), "Three.".to_string(), "Four.".to_string()]
    );
}

#[test]
fn test_split_withBookChapter_shouldKeepParagraphOrder() {
    let paragraphs: Vec<String> = (1..=40)
        .map(|i| format!("Paragraph number {} tells a short part of the story.", i))
        .collect();
    let text = paragraphs.join("\n\n");

    let chunks = segmenter::split(&text, 200);

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= 200));

    let rejoined: Vec<&str> = chunks
        .iter()
        .flat_map(|c| c.split(PARAGRAPH_SEPARATOR))
        .collect();
    assert_eq!(rejoined.len(), 40);
    assert_eq!(rejoined[0], paragraphs[0]);
    assert_eq!(rejoined[39], paragraphs[39]);
}
