/*!
 * End-to-end tests of the application controller
 */

use std::fs;

use booktranslate::app_controller::{Controller, StoreBackend, TranslateRequest};
use booktranslate::storage::{ContentKind, ContentStore, MemoryStore};

use crate::common;

#[tokio::test]
async fn test_run_withDirectory_shouldWriteTranslationsAndStoreContent() {
    common::init_test_logging();
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "one.txt", "Hello world.").unwrap();
    common::create_test_file(dir.path(), "part/two.md", "Second book.").unwrap();

    let store = MemoryStore::new();
    let controller =
        Controller::with_stores(common::mock_config(), StoreBackend::Memory(store.clone())).unwrap();

    let report = controller
        .run(TranslateRequest {
            input_path: dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(report.written.len(), 2);
    assert!(report.failed.is_empty());

    let output = fs::read_to_string(dir.path().join("one.sv.txt")).unwrap();
    assert_eq!(output, "[SV] Hello world.");
    assert!(dir.path().join("part/two.sv.md").exists());

    let document_id = &report.written[0].document_id;
    assert_eq!(
        store.get("local", document_id, ContentKind::Source).await.unwrap(),
        Some("Hello world.".to_string())
    );
    assert_eq!(
        store.get("local", document_id, ContentKind::Translated).await.unwrap(),
        Some("[SV] Hello world.".to_string())
    );
}

#[tokio::test]
async fn test_run_withUnreadableDocument_shouldTranslateTheOthers() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "a_good.txt", "Readable text.").unwrap();
    fs::write(dir.path().join("b_bad.txt"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
    common::create_test_file(dir.path(), "c_good.txt", "More text.").unwrap();

    let controller = Controller::with_config(common::mock_config()).unwrap();
    let report = controller
        .run(TranslateRequest {
            input_path: dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failed, vec![dir.path().join("b_bad.txt")]);
    assert_eq!(
        fs::read_to_string(dir.path().join("a_good.sv.txt")).unwrap(),
        "[SV] Readable text."
    );
    assert!(dir.path().join("c_good.sv.txt").exists());
}

#[tokio::test]
async fn test_run_withUnwritableOutput_shouldKeepLaterDocuments() {
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "a.txt", "First book.").unwrap();
    common::create_test_file(dir.path(), "b.txt", "Second book.").unwrap();
    common::create_test_file(dir.path(), "c.txt", "Third book.").unwrap();
    // A directory where the output file of b.txt should go
    let output_dir = dir.path().join("out");
    fs::create_dir_all(output_dir.join("b.sv.txt")).unwrap();

    let controller = Controller::with_config(common::mock_config()).unwrap();
    let report = controller
        .run(TranslateRequest {
            input_path: dir.path().to_path_buf(),
            output_dir: Some(output_dir.clone()),
            force_overwrite: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let written: Vec<_> = report.written.iter().map(|w| w.output.clone()).collect();
    assert_eq!(written, vec![output_dir.join("a.sv.txt"), output_dir.join("c.sv.txt")]);
    assert_eq!(report.failed, vec![dir.path().join("b.txt")]);
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "book.txt", "Chapter one.").unwrap();
    let controller = Controller::with_config(common::mock_config()).unwrap();

    let request = TranslateRequest {
        input_path: input,
        ..Default::default()
    };
    assert_eq!(controller.run(request.clone()).await.unwrap().written.len(), 1);

    let second = controller.run(request.clone()).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert!(second.written.is_empty());

    let forced = controller
        .run(TranslateRequest {
            force_overwrite: true,
            ..request
        })
        .await
        .unwrap();
    assert_eq!(forced.written.len(), 1);
}

#[tokio::test]
async fn test_run_withGlossaryFile_shouldImportAndApplyIt() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "tale.txt", "The dragon flew.").unwrap();
    let glossary = common::create_test_file(
        dir.path(),
        "creatures.json",
        r#"[{"source_term": "dragon", "target_term": "drake"}]"#,
    )
    .unwrap();
    let output_dir = dir.path().join("out");

    let controller = Controller::with_config(common::mock_config()).unwrap();
    let report = controller
        .run(TranslateRequest {
            input_path: input,
            output_dir: Some(output_dir.clone()),
            glossary_file: Some(glossary),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(report.summary.glossary_hits, 1);
    let output = fs::read_to_string(output_dir.join("tale.sv.txt")).unwrap();
    assert_eq!(output, "[SV] The drake flew.");
}

#[tokio::test]
async fn test_pages_afterRun_shouldPairSourceAndTranslation() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "short.txt", "Only line.").unwrap();

    let mut config = common::mock_config();
    config.target_language = "de".to_string();
    let controller = Controller::with_config(config).unwrap();

    let report = controller
        .run(TranslateRequest {
            input_path: input,
            ..Default::default()
        })
        .await
        .unwrap();
    let pages = controller.pages(&report.written[0].document_id).await.unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].source_content, "Only line.");
    assert_eq!(pages[0].translated_content, "[DE] Only line.");
    assert!(dir.path().join("short.de.txt").exists());
}

#[tokio::test]
async fn test_pages_withUnknownDocument_shouldFail() {
    let controller = Controller::with_config(common::mock_config()).unwrap();
    assert!(controller.pages("missing").await.is_err());
}

#[test]
fn test_run_withMissingInput_shouldFail() {
    let controller = Controller::with_config(common::mock_config()).unwrap();

    let result = tokio_test::block_on(controller.run(TranslateRequest {
        input_path: "/definitely/not/a/book.txt".into(),
        ..Default::default()
    }));
    assert!(result.is_err());
}

#[test]
fn test_withConfig_withMissingCredentials_shouldFail() {
    let mut config = common::mock_config();
    config.translation.provider = booktranslate::app_config::TranslationProvider::DeepL;
    config.translation.api_key.clear();

    assert!(Controller::with_config(config).is_err());
}

#[tokio::test]
async fn test_cacheMaintenance_withMemoryStore_shouldCountAndClear() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "notes.txt", "Cache me.").unwrap();
    let controller = Controller::with_config(common::mock_config()).unwrap();

    controller
        .run(TranslateRequest {
            input_path: input,
            ..Default::default()
        })
        .await
        .unwrap();

    let stores = controller.stores();
    assert_eq!(stores.cache_stats().await.unwrap().total_entries, 1);
    assert!(stores.database_stats().await.unwrap().is_none());

    assert_eq!(stores.clear_cache().await.unwrap(), 1);
    assert_eq!(stores.cache_stats().await.unwrap().total_entries, 0);
}

#[tokio::test]
async fn test_cacheMaintenance_withSqliteStore_shouldReportDatabaseStats() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "notes.txt", "Cache me.").unwrap();
    let mut config = common::mock_config();
    config.storage.in_memory = false;
    config.storage.database_path = Some(dir.path().join("store.db").to_string_lossy().to_string());
    let controller = Controller::with_config(config).unwrap();

    controller
        .run(TranslateRequest {
            input_path: input,
            ..Default::default()
        })
        .await
        .unwrap();

    let stores = controller.stores();
    let db_stats = stores.database_stats().await.unwrap().unwrap();
    assert_eq!(db_stats.document_count, 1);
    assert_eq!(db_stats.cache_count, 1);

    assert_eq!(stores.clear_cache().await.unwrap(), 1);
    assert_eq!(stores.cache_stats().await.unwrap().total_entries, 0);
    assert_eq!(stores.database_stats().await.unwrap().unwrap().cache_count, 0);
}
