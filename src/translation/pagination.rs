/*!
 * Editing pages.
 *
 * Pages re-chunk a document's final source and translated content for
 * paginated editing. Their size is independent of translation segments and
 * they are created lazily, the first time the editing workspace opens a
 * document, then persisted alongside the document content.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::segmenter;
use crate::errors::StorageError;
use crate::storage::{ContentKind, ContentStore};

/// Editing state of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// No translated text yet
    Pending,
    /// Some translated text, not signed off
    InProgress,
    /// Signed off by the editor
    Completed,
}

/// One page of a document in the editing workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub document_id: String,
    /// 1-based
    pub page_number: usize,
    pub source_content: String,
    pub translated_content: String,
    pub status: PageStatus,
    pub completion_percentage: u8,
}

/// Estimated completion of a page from its content lengths
pub fn estimate_completion(source: &str, translated: &str) -> u8 {
    let translated_chars = translated.chars().count();
    if translated_chars == 0 {
        return 0;
    }
    let source_chars = source.chars().count();
    if source_chars == 0 {
        return 50;
    }
    (translated_chars * 100 / source_chars).min(99) as u8
}

impl Page {
    pub fn new(document_id: &str, page_number: usize, source: String, translated: String) -> Self {
        let completion_percentage = estimate_completion(&source, &translated);
        Self {
            document_id: document_id.to_string(),
            page_number,
            source_content: source,
            translated_content: translated,
            status: if completion_percentage == 0 {
                PageStatus::Pending
            } else {
                PageStatus::InProgress
            },
            completion_percentage,
        }
    }

    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    /// Replace the translated text. A completed page stays completed.
    pub fn update_translation(&mut self, text: impl Into<String>) {
        self.translated_content = text.into();
        if self.status == PageStatus::Completed {
            return;
        }
        self.completion_percentage = estimate_completion(&self.source_content, &self.translated_content);
        self.status = if self.completion_percentage == 0 {
            PageStatus::Pending
        } else {
            PageStatus::InProgress
        };
    }

    pub fn mark_completed(&mut self) {
        self.status = PageStatus::Completed;
        self.completion_percentage = 100;
    }
}

/// Split both sides into pages and pair them by index; the shorter side is
/// padded with empty pages
pub fn paginate(document_id: &str, source: &str, translated: &str, page_chars: usize) -> Vec<Page> {
    let source_pages = segmenter::split(source, page_chars);
    let translated_pages = segmenter::split(translated, page_chars);
    let count = source_pages.len().max(translated_pages.len());

    let mut source_iter = source_pages.into_iter();
    let mut translated_iter = translated_pages.into_iter();
    (0..count)
        .map(|i| {
            Page::new(
                document_id,
                i + 1,
                source_iter.next().unwrap_or_default(),
                translated_iter.next().unwrap_or_default(),
            )
        })
        .collect()
}

/// Page lifecycle on top of a content store
#[derive(Clone)]
pub struct EditingWorkspace {
    store: Arc<dyn ContentStore>,
    page_chars: usize,
}

impl EditingWorkspace {
    pub fn new(store: Arc<dyn ContentStore>, page_chars: usize) -> Self {
        Self {
            store,
            page_chars: page_chars.max(1),
        }
    }

    /// Stored pages of a document, generated from its content when absent
    pub async fn load_or_create_pages(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<Vec<Page>, StorageError> {
        if let Some(json) = self.store.get(owner, document_id, ContentKind::Pages).await? {
            match serde_json::from_str::<Vec<Page>>(&json) {
                Ok(pages) if !pages.is_empty() => return Ok(pages),
                Ok(_) => debug!("No stored pages for {}, regenerating", document_id),
                Err(e) => warn!("Stored pages for {} are unreadable ({}), regenerating", document_id, e),
            }
        }

        let source = self.store.get(owner, document_id, ContentKind::Source).await?;
        let translated = self.store.get(owner, document_id, ContentKind::Translated).await?;
        if source.is_none() && translated.is_none() {
            return Err(StorageError::NotFound(format!("document '{}'", document_id)));
        }

        let pages = paginate(
            document_id,
            source.as_deref().unwrap_or_default(),
            translated.as_deref().unwrap_or_default(),
            self.page_chars,
        );
        self.save_pages(owner, document_id, &pages).await?;
        debug!("Created {} pages for document {}", pages.len(), document_id);
        Ok(pages)
    }

    pub async fn save_pages(
        &self,
        owner: &str,
        document_id: &str,
        pages: &[Page],
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(pages)?;
        self.store.put(owner, document_id, ContentKind::Pages, &json).await
    }

    /// Replace the translated text of one page
    pub async fn update_page(
        &self,
        owner: &str,
        document_id: &str,
        page_number: usize,
        translated: &str,
    ) -> Result<Page, StorageError> {
        self.modify_page(owner, document_id, page_number, |page| page.update_translation(translated))
            .await
    }

    /// Sign off one page
    pub async fn complete_page(
        &self,
        owner: &str,
        document_id: &str,
        page_number: usize,
    ) -> Result<Page, StorageError> {
        self.modify_page(owner, document_id, page_number, Page::mark_completed).await
    }

    async fn modify_page<F>(
        &self,
        owner: &str,
        document_id: &str,
        page_number: usize,
        change: F,
    ) -> Result<Page, StorageError>
    where
        F: FnOnce(&mut Page),
    {
        let mut pages = self.load_or_create_pages(owner, document_id).await?;
        let page = pages
            .iter_mut()
            .find(|p| p.page_number == page_number)
            .ok_or_else(|| {
                StorageError::NotFound(format!("page {} of document '{}'", page_number, document_id))
            })?;
        change(page);
        let updated = page.clone();
        self.save_pages(owner, document_id, &pages).await?;
        Ok(updated)
    }
}
