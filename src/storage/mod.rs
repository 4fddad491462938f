/*!
 * Store collaborators consumed by the pipeline.
 *
 * The pipeline never owns persistence. It talks to three narrow interfaces:
 * - `ContentStore`: source/translated/page content per owner and document
 * - `CachePersistence`: fingerprint-addressed translation reuse
 * - `GlossaryStore`: domain-term lists
 *
 * `memory::MemoryStore` implements all three in process; the `database`
 * module provides the SQLite-backed equivalent.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::translation::cache::CacheEntry;
use crate::translation::glossary::GlossaryEntry;

pub mod memory;

pub use memory::MemoryStore;

/// Kind of content stored per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Original document text
    Source,
    /// Final translated text
    Translated,
    /// Serialized editing pages
    Pages,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Translated => "translated",
            Self::Pages => "pages",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "translated" => Ok(Self::Translated),
            "pages" => Ok(Self::Pages),
            other => Err(StorageError::Corrupt(format!("unknown content kind '{}'", other))),
        }
    }
}

/// Document content storage
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch stored content, `None` when absent
    async fn get(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
    ) -> Result<Option<String>, StorageError>;

    /// Store content, replacing any previous value
    async fn put(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
        text: &str,
    ) -> Result<(), StorageError>;
}

/// Backing storage for the translation cache
#[async_trait]
pub trait CachePersistence: Send + Sync {
    /// Translated text stored under a fingerprint and target language
    async fn get_by_fingerprint(
        &self,
        source_hash: &str,
        target_language: &str,
    ) -> Result<Option<String>, StorageError>;

    /// Record a new entry. Implementations are not required to deduplicate.
    async fn put(&self, entry: CacheEntry) -> Result<(), StorageError>;
}

/// Source of glossary entries
#[async_trait]
pub trait GlossaryStore: Send + Sync {
    /// All entries of a glossary, in no particular order
    async fn list_entries(&self, glossary_id: &str) -> Result<Vec<GlossaryEntry>, StorageError>;
}
