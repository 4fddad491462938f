/*!
 * Content-addressable translation cache.
 *
 * Translations are keyed by a fingerprint of a normalized text sample plus the
 * target language, so identical content is never sent to the engine twice.
 * The index itself is stateless; entries live in a `CachePersistence`.
 * Backend failures, slow backends and cancelled runs are logged and treated
 * as a miss, never as a failure.
 */

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use super::cancel::CancelToken;
use crate::errors::CacheError;
use crate::storage::CachePersistence;

/// Characters of normalized text that enter a fingerprint by default
pub const DEFAULT_SAMPLE_CHARS: usize = 500;

/// Bound on one backend call unless configured otherwise
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(30);

/// A stored translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source_hash: String,
    pub source_text_sample: String,
    pub target_language: String,
    pub translated_text: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        source_hash: &str,
        source_text_sample: &str,
        target_language: &str,
        translated_text: &str,
        owner: &str,
    ) -> Self {
        Self {
            source_hash: source_hash.to_string(),
            source_text_sample: source_text_sample.to_string(),
            target_language: target_language.to_string(),
            translated_text: translated_text.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Normalized prefix used for fingerprinting: trimmed, first `sample_chars`
/// characters, lowercased
pub fn normalized_sample(text: &str, sample_chars: usize) -> String {
    let prefix: String = text.trim().chars().take(sample_chars).collect();
    prefix.trim_end().to_lowercase()
}

/// Fingerprint with the default sample size
pub fn fingerprint(text: &str, target_language: &str) -> String {
    fingerprint_with_sample(text, target_language, DEFAULT_SAMPLE_CHARS)
}

/// SHA-256 over the normalized sample followed by the target language code
pub fn fingerprint_with_sample(text: &str, target_language: &str, sample_chars: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_sample(text, sample_chars).as_bytes());
    hasher.update(target_language.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lookup/insert front-end over a cache backend
#[derive(Clone)]
pub struct CacheIndex {
    persistence: Arc<dyn CachePersistence>,
    sample_chars: usize,
    timeout: Duration,
}

impl CacheIndex {
    /// Create an index with the default sample size
    pub fn new(persistence: Arc<dyn CachePersistence>) -> Self {
        Self::with_sample_chars(persistence, DEFAULT_SAMPLE_CHARS)
    }

    pub fn with_sample_chars(persistence: Arc<dyn CachePersistence>, sample_chars: usize) -> Self {
        Self {
            persistence,
            sample_chars: sample_chars.max(1),
            timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Bound every backend call made by `lookup_or_miss` and `insert_or_log`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fingerprint using this index's sample size
    pub fn fingerprint(&self, text: &str, target_language: &str) -> String {
        fingerprint_with_sample(text, target_language, self.sample_chars)
    }

    /// Translated text stored under `source_hash`, if any
    pub async fn lookup(
        &self,
        source_hash: &str,
        target_language: &str,
    ) -> Result<Option<String>, CacheError> {
        let result = self
            .persistence
            .get_by_fingerprint(source_hash, target_language)
            .await?;

        match &result {
            Some(_) => debug!("Cache hit for {} ({})", truncate_hash(source_hash), target_language),
            None => debug!("Cache miss for {} ({})", truncate_hash(source_hash), target_language),
        }
        Ok(result)
    }

    /// Store a translation under `source_hash`
    pub async fn insert(
        &self,
        source_hash: &str,
        source_text: &str,
        target_language: &str,
        translated_text: &str,
        owner: &str,
    ) -> Result<(), CacheError> {
        let sample = normalized_sample(source_text, self.sample_chars);
        let entry = CacheEntry::new(source_hash, &sample, target_language, translated_text, owner);
        self.persistence.put(entry).await?;
        debug!("Cached translation for {} ({})", truncate_hash(source_hash), target_language);
        Ok(())
    }

    /// `lookup` bounded by the timeout and `cancel`; errors, timeouts and
    /// cancellation all count as a miss
    pub async fn lookup_or_miss(
        &self,
        source_hash: &str,
        target_language: &str,
        cancel: &CancelToken,
    ) -> Option<String> {
        let lookup = tokio::time::timeout(self.timeout, self.lookup(source_hash, target_language));
        match cancel.run(lookup).await {
            Some(Ok(Ok(found))) => found,
            Some(Ok(Err(e))) => {
                warn!("{}; treating as cache miss", e);
                None
            }
            Some(Err(_)) => {
                warn!("Cache lookup timed out after {:?}; treating as cache miss", self.timeout);
                None
            }
            None => {
                debug!("Cache lookup cancelled");
                None
            }
        }
    }

    /// `insert` bounded by the timeout and `cancel`; failures are logged and dropped
    pub async fn insert_or_log(
        &self,
        source_hash: &str,
        source_text: &str,
        target_language: &str,
        translated_text: &str,
        owner: &str,
        cancel: &CancelToken,
    ) {
        let insert = tokio::time::timeout(
            self.timeout,
            self.insert(source_hash, source_text, target_language, translated_text, owner),
        );
        match cancel.run(insert).await {
            Some(Ok(Ok(()))) => {}
            Some(Ok(Err(e))) => warn!("{}; translation not cached", e),
            Some(Err(_)) => warn!("Cache insert timed out after {:?}; translation not cached", self.timeout),
            None => debug!("Cache insert cancelled"),
        }
    }
}

fn truncate_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
