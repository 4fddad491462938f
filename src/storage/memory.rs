/*!
 * In-process store implementing every store collaborator.
 *
 * Clones share the same underlying maps, so one `MemoryStore` can be handed
 * to the cache index, the glossary loader and the editing workspace at once.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CachePersistence, ContentKind, ContentStore, GlossaryStore};
use crate::errors::StorageError;
use crate::translation::cache::CacheEntry;
use crate::translation::glossary::GlossaryEntry;

type ContentKey = (String, String, ContentKind);

/// Shared in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    content: Arc<RwLock<HashMap<ContentKey, String>>>,

    /// Insertion-ordered; duplicates per fingerprint are kept
    cache: Arc<RwLock<Vec<CacheEntry>>>,

    glossaries: Arc<RwLock<HashMap<String, Vec<GlossaryEntry>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a glossary
    pub fn add_glossary(&self, glossary_id: &str, entries: Vec<GlossaryEntry>) {
        self.glossaries.write().insert(glossary_id.to_string(), entries);
    }

    /// Number of cache rows, duplicates included
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Snapshot of all cache rows in insertion order
    pub fn cache_entries(&self) -> Vec<CacheEntry> {
        self.cache.read().clone()
    }

    /// Drop every cache row; returns how many were removed
    pub fn clear_cache(&self) -> usize {
        let mut cache = self.cache.write();
        let removed = cache.len();
        cache.clear();
        debug!("Cleared {} cached translations", removed);
        removed
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
    ) -> Result<Option<String>, StorageError> {
        let key = (owner.to_string(), document_id.to_string(), kind);
        Ok(self.content.read().get(&key).cloned())
    }

    async fn put(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
        text: &str,
    ) -> Result<(), StorageError> {
        let key = (owner.to_string(), document_id.to_string(), kind);
        self.content.write().insert(key, text.to_string());
        debug!("Stored {} content for document {}", kind.as_str(), document_id);
        Ok(())
    }
}

#[async_trait]
impl CachePersistence for MemoryStore {
    async fn get_by_fingerprint(
        &self,
        source_hash: &str,
        target_language: &str,
    ) -> Result<Option<String>, StorageError> {
        // Latest insert wins when duplicates exist
        let cache = self.cache.read();
        Ok(cache
            .iter()
            .rev()
            .find(|e| e.source_hash == source_hash && e.target_language == target_language)
            .map(|e| e.translated_text.clone()))
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StorageError> {
        self.cache.write().push(entry);
        Ok(())
    }
}

#[async_trait]
impl GlossaryStore for MemoryStore {
    async fn list_entries(&self, glossary_id: &str) -> Result<Vec<GlossaryEntry>, StorageError> {
        self.glossaries
            .read()
            .get(glossary_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("glossary '{}'", glossary_id)))
    }
}
