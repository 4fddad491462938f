/*!
 * Tests for pagination and the editing workspace
 */

use std::sync::Arc;

use booktranslate::storage::{ContentKind, ContentStore, MemoryStore};
use booktranslate::translation::pagination::{self, EditingWorkspace, PageStatus};

#[test]
fn test_paginate_withThreeSourceAndTwoTranslatedChunks_shouldPadTranslation() {
    let source = "Alpha alpha.\n\nBravo bravo.\n\nCharlie charlie.";
    let translated = "Alfa alfa.\n\nBrav brav.";

    let pages = pagination::paginate("doc", source, translated, 16);

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[2].source_content, "Charlie charlie.");
    assert_eq!(pages[2].translated_content, "");
    assert_eq!(pages[2].status, PageStatus::Pending);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[0].status, PageStatus::InProgress);
}

#[test]
fn test_paginate_withOnlyTranslation_shouldEstimateHalfDone() {
    let pages = pagination::paginate("doc", "", "Hej.", 100);

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].source_content, "");
    assert_eq!(pages[0].completion_percentage(), 50);
}

#[test]
fn test_paginate_withOnlySource_shouldStartAtZero() {
    let pages = pagination::paginate("doc", "Hello.", "", 100);

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].completion_percentage(), 0);
    assert_eq!(pages[0].status, PageStatus::Pending);
}

#[tokio::test]
async fn test_editingWorkspace_shouldPersistEditsAndCompletion() {
    let store = MemoryStore::new();
    store.put("alice", "doc", ContentKind::Source, "Hello world.").await.unwrap();
    store.put("alice", "doc", ContentKind::Translated, "Hej").await.unwrap();

    let workspace = EditingWorkspace::new(Arc::new(store.clone()), 100);
    let pages = workspace.load_or_create_pages("alice", "doc").await.unwrap();
    assert_eq!(pages.len(), 1);

    let edited = workspace.update_page("alice", "doc", 1, "Hej världen.").await.unwrap();
    assert_eq!(edited.status, PageStatus::InProgress);

    let completed = workspace.complete_page("alice", "doc", 1).await.unwrap();
    assert_eq!(completed.completion_percentage(), 100);

    let reloaded = workspace.load_or_create_pages("alice", "doc").await.unwrap();
    assert_eq!(reloaded[0].translated_content, "Hej världen.");
    assert_eq!(reloaded[0].status, PageStatus::Completed);
}

#[tokio::test]
async fn test_editingWorkspace_withCorruptPages_shouldRegenerate() {
    let store = MemoryStore::new();
    store.put("alice", "doc", ContentKind::Source, "Hello.").await.unwrap();
    store.put("alice", "doc", ContentKind::Pages, "{not json").await.unwrap();

    let workspace = EditingWorkspace::new(Arc::new(store), 100);
    let pages = workspace.load_or_create_pages("alice", "doc").await.unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].source_content, "Hello.");
}
