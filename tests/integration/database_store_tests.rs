/*!
 * Pipeline runs backed by the SQLite store
 */

use std::sync::Arc;

use booktranslate::database::{DatabaseConnection, Repository};
use booktranslate::providers::mock::MockTranslator;
use booktranslate::storage::{ContentKind, ContentStore};
use booktranslate::translation::cache::CacheIndex;
use booktranslate::translation::pagination::EditingWorkspace;
use booktranslate::translation::{GlossaryEntry, ProcessOptions};

use crate::common;

#[tokio::test]
async fn test_sqliteCache_shouldSurviveReopeningDatabase() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("cache.db");

    let first_engine = MockTranslator::working();
    {
        let repo = Repository::new(DatabaseConnection::new(&db_path).unwrap());
        common::passthrough_pipeline(first_engine.clone())
            .with_cache(CacheIndex::new(Arc::new(repo)))
            .process_document("A sentence worth caching.", "SV", &ProcessOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(first_engine.request_count(), 1);

    let second_engine = MockTranslator::working();
    let repo = Repository::new(DatabaseConnection::new(&db_path).unwrap());
    let result = common::passthrough_pipeline(second_engine.clone())
        .with_cache(CacheIndex::new(Arc::new(repo.clone())))
        .process_document("A sentence worth caching.", "SV", &ProcessOptions::default())
        .await
        .unwrap();

    assert_eq!(second_engine.request_count(), 0);
    assert_eq!(result.summary().cache_hits, 1);
    assert_eq!(repo.get_cache_stats().await.unwrap().total_hits, 1);
}

#[tokio::test]
async fn test_sqliteGlossary_shouldApplyStoredEntries() {
    let repo = Repository::new_in_memory().unwrap();
    repo.save_glossary("fiction", "Fiction", "local", vec![GlossaryEntry::new("dragon", "drake")])
        .await
        .unwrap();

    let result = common::passthrough_pipeline(MockTranslator::working())
        .with_glossaries(Arc::new(repo))
        .process_document("A dragon slept.", "SV", &ProcessOptions::default().with_glossary("fiction"))
        .await
        .unwrap();

    assert_eq!(result.combined_text, "[SV] A drake slept.");
}

#[tokio::test]
async fn test_sqliteContent_shouldBackEditingWorkspace() {
    let repo = Repository::new_in_memory().unwrap();
    repo.put("alice", "doc", ContentKind::Source, "One.\n\nTwo.").await.unwrap();
    repo.put("alice", "doc", ContentKind::Translated, "Ett.").await.unwrap();

    let workspace = EditingWorkspace::new(Arc::new(repo.clone()), 5);
    let pages = workspace.load_or_create_pages("alice", "doc").await.unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].translated_content, "");
    assert!(repo.get_content("alice", "doc", ContentKind::Pages).await.unwrap().is_some());
}
