/*!
 * Common test utilities for the booktranslate test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use booktranslate::app_config::{Config, ReviewProvider, TranslationProvider};
use booktranslate::providers::mock::{MockReviewer, MockTranslator};
use booktranslate::translation::client::TranslationClient;
use booktranslate::translation::retry::RetryPolicy;
use booktranslate::translation::review::{PassthroughReview, ReviewClient};
use booktranslate::Pipeline;

/// Scores well below the default complexity threshold
pub const SIMPLE_TEXT: &str = "The cat sat.";

/// Scores well above the default complexity threshold
pub const COMPLEX_TEXT: &str = "Notwithstanding considerable jurisdictional ambiguities, the \
    constitutional tribunal's deliberations, particularly regarding extraterritorial \
    enforcement mechanisms, remained inconclusive; consequently, international \
    arbitration proceedings were postponed indefinitely.";

/// Routes library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration running entirely on mock engines and an in-memory store
pub fn mock_config() -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Mock;
    config.translation.retry_backoff_ms = 0;
    config.review.provider = ReviewProvider::Disabled;
    config.storage.in_memory = true;
    config
}

/// Translation client over a mock engine, retrying without delay
pub fn mock_client(engine: MockTranslator) -> TranslationClient {
    TranslationClient::new(Arc::new(engine), RetryPolicy::immediate(3), Duration::from_secs(5))
}

/// Pipeline with review disabled
pub fn passthrough_pipeline(engine: MockTranslator) -> Pipeline {
    Pipeline::new(mock_client(engine), Arc::new(PassthroughReview))
}

/// Pipeline reviewing through the given mock reviewer
pub fn reviewing_pipeline(engine: MockTranslator, reviewer: MockReviewer) -> Pipeline {
    let review = ReviewClient::new(
        Arc::new(reviewer),
        Duration::from_millis(500),
        Duration::from_millis(5),
    );
    Pipeline::new(mock_client(engine), Arc::new(review))
}
