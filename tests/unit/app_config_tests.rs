/*!
 * Tests for configuration parsing and validation
 */

use booktranslate::app_config::{Config, ReviewProvider, ReviewStyle, TranslationProvider};
use booktranslate::errors::ConfigurationError;

use crate::common;

#[test]
fn test_validate_withMockEngines_shouldNotRequireCredentials() {
    assert!(common::mock_config().validate().is_ok());
}

#[test]
fn test_validate_withUnknownTargetLanguage_shouldRejectSetting() {
    let mut config = common::mock_config();
    config.target_language = "xx".to_string();

    match config.validate() {
        Err(ConfigurationError::InvalidSetting { field, .. }) => assert_eq!(field, "target_language"),
        other => panic!("unexpected validation result: {:?}", other),
    }
}

#[test]
fn test_validate_withZeroConcurrency_shouldRejectSetting() {
    let mut config = common::mock_config();
    config.pipeline.concurrent_documents = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigurationError::InvalidSetting { .. })
    ));
}

#[test]
fn test_validate_withMalformedEndpoint_shouldRejectSetting() {
    let mut config = common::mock_config();
    config.translation.provider = TranslationProvider::DeepL;
    config.translation.api_key = "key".to_string();
    config.translation.endpoint = "not a url".to_string();

    match config.validate() {
        Err(ConfigurationError::InvalidSetting { field, .. }) => assert_eq!(field, "translation.endpoint"),
        other => panic!("unexpected validation result: {:?}", other),
    }
}

#[test]
fn test_deserialize_withProviderNames_shouldSelectEngines() {
    let json = r#"{
        "target_language": "EN-GB",
        "owner": "editor",
        "translation": { "provider": "mock" },
        "review": { "provider": "openai", "style": "conservative", "instructions": "Keep names." },
        "pipeline": { "smart_review": false, "concurrent_requests": 8 },
        "storage": { "in_memory": true }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::Mock);
    assert_eq!(config.review.provider, ReviewProvider::OpenAI);
    assert_eq!(config.review.style, ReviewStyle::Conservative);
    assert_eq!(config.review.instructions.as_deref(), Some("Keep names."));
    assert!(!config.pipeline.smart_review);
    assert_eq!(config.pipeline.concurrent_requests, 8);
    assert_eq!(config.pipeline.page_chars, 3000);
    assert!(config.storage.in_memory);
}
