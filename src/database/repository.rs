/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details. `Repository` implements every store
 * interface the pipeline consumes.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::{OptionalExtension, params};

use super::connection::DatabaseConnection;
use crate::errors::StorageError;
use crate::storage::{CachePersistence, ContentKind, ContentStore, GlossaryStore};
use crate::translation::cache::CacheEntry;
use crate::translation::glossary::GlossaryEntry;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

/// Translation cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total_entries: i64,
    pub total_hits: i64,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Content Operations
    // =========================================================================

    /// Get stored content of a document
    pub async fn get_content(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
    ) -> Result<Option<String>> {
        let owner = owner.to_string();
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                let text = conn
                    .query_row(
                        "SELECT text FROM content WHERE owner = ?1 AND document_id = ?2 AND kind = ?3",
                        params![owner, document_id, kind.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(text)
            })
            .await
    }

    /// Store content of a document, replacing any previous value
    pub async fn put_content(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
        text: &str,
    ) -> Result<()> {
        let owner = owner.to_string();
        let document_id = document_id.to_string();
        let text = text.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO content (owner, document_id, kind, text, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(owner, document_id, kind)
                    DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at
                    "#,
                    params![owner, document_id, kind.as_str(), text, Utc::now().to_rfc3339()],
                )?;
                debug!("Stored {} content for document {}", kind.as_str(), document_id);
                Ok(())
            })
            .await
    }

    /// Documents of an owner, most recently updated first
    pub async fn list_documents(&self, owner: &str) -> Result<Vec<String>> {
        let owner = owner.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT document_id FROM content
                    WHERE owner = ?1
                    GROUP BY document_id
                    ORDER BY MAX(updated_at) DESC
                    "#,
                )?;
                let ids = stmt
                    .query_map([owner], |row| row.get(0))?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(ids)
            })
            .await
    }

    // =========================================================================
    // Cache Operations
    // =========================================================================

    /// Get a cached translation; the newest row wins when duplicates exist
    pub async fn get_cached_translation(
        &self,
        source_hash: &str,
        target_language: &str,
    ) -> Result<Option<String>> {
        let source_hash = source_hash.to_string();
        let target_language = target_language.to_string();

        self.db
            .execute_async(move |conn| {
                let result: Option<(i64, String)> = conn
                    .query_row(
                        r#"
                        SELECT id, translated_text
                        FROM translation_cache
                        WHERE source_hash = ?1
                          AND target_language = ?2
                        ORDER BY id DESC
                        LIMIT 1
                        "#,
                        params![source_hash, target_language],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                if let Some((id, translated_text)) = result {
                    conn.execute(
                        "UPDATE translation_cache SET hit_count = hit_count + 1 WHERE id = ?1",
                        [id],
                    )?;
                    Ok(Some(translated_text))
                } else {
                    Ok(None)
                }
            })
            .await
    }

    /// Store a translation in the cache
    pub async fn cache_translation(&self, entry: CacheEntry) -> Result<()> {
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_cache (
                        source_hash, source_text_sample, target_language,
                        translated_text, owner, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        entry.source_hash,
                        entry.source_text_sample,
                        entry.target_language,
                        entry.translated_text,
                        entry.owner,
                        entry.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get cache statistics
    pub async fn get_cache_stats(&self) -> Result<CacheStats> {
        self.db
            .execute_async(|conn| {
                let total_entries: i64 = conn
                    .query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))
                    .unwrap_or(0);

                let total_hits: i64 = conn
                    .query_row(
                        "SELECT COALESCE(SUM(hit_count), 0) FROM translation_cache",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);

                Ok(CacheStats {
                    total_entries,
                    total_hits,
                })
            })
            .await
    }

    /// Clear the translation cache
    pub async fn clear_cache(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM translation_cache", [])?;
                Ok(deleted as i64)
            })
            .await
    }

    // =========================================================================
    // Glossary Operations
    // =========================================================================

    /// Create a glossary with its entries, replacing an existing one
    pub async fn save_glossary(
        &self,
        glossary_id: &str,
        name: &str,
        owner: &str,
        entries: Vec<GlossaryEntry>,
    ) -> Result<()> {
        let glossary_id = glossary_id.to_string();
        let name = name.to_string();
        let owner = owner.to_string();

        self.db
            .transaction_async(move |tx| {
                tx.execute("DELETE FROM glossaries WHERE id = ?1", [&glossary_id])?;
                tx.execute(
                    "INSERT INTO glossaries (id, name, owner, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![glossary_id, name, owner, Utc::now().to_rfc3339()],
                )?;

                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO glossary_entries (glossary_id, source_term, target_term, context, notes)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )?;
                for entry in &entries {
                    stmt.execute(params![
                        glossary_id,
                        entry.source_term,
                        entry.target_term,
                        entry.context,
                        entry.notes,
                    ])?;
                }
                debug!("Saved glossary {} with {} entries", glossary_id, entries.len());
                Ok(())
            })
            .await
    }

    /// Entries of a glossary, `None` when the glossary does not exist
    pub async fn get_glossary_entries(&self, glossary_id: &str) -> Result<Option<Vec<GlossaryEntry>>> {
        let glossary_id = glossary_id.to_string();

        self.db
            .execute_async(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT COUNT(*) FROM glossaries WHERE id = ?1",
                    [&glossary_id],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(None);
                }

                let mut stmt = conn.prepare(
                    r#"
                    SELECT source_term, target_term, context, notes
                    FROM glossary_entries
                    WHERE glossary_id = ?1
                    ORDER BY id
                    "#,
                )?;
                let entries = stmt
                    .query_map([&glossary_id], |row| {
                        Ok(GlossaryEntry {
                            source_term: row.get(0)?,
                            target_term: row.get(1)?,
                            context: row.get(2)?,
                            notes: row.get(3)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(Some(entries))
            })
            .await
    }
}

#[async_trait]
impl ContentStore for Repository {
    async fn get(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
    ) -> Result<Option<String>, StorageError> {
        Ok(self.get_content(owner, document_id, kind).await?)
    }

    async fn put(
        &self,
        owner: &str,
        document_id: &str,
        kind: ContentKind,
        text: &str,
    ) -> Result<(), StorageError> {
        Ok(self.put_content(owner, document_id, kind, text).await?)
    }
}

#[async_trait]
impl CachePersistence for Repository {
    async fn get_by_fingerprint(
        &self,
        source_hash: &str,
        target_language: &str,
    ) -> Result<Option<String>, StorageError> {
        Ok(self.get_cached_translation(source_hash, target_language).await?)
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StorageError> {
        Ok(self.cache_translation(entry).await?)
    }
}

#[async_trait]
impl GlossaryStore for Repository {
    async fn list_entries(&self, glossary_id: &str) -> Result<Vec<GlossaryEntry>, StorageError> {
        self.get_glossary_entries(glossary_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("glossary '{}'", glossary_id)))
    }
}
