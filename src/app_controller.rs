use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::database::connection::DatabaseStats;
use crate::database::{CacheStats, DatabaseConnection, Repository};
use crate::file_utils::FileManager;
use crate::storage::{CachePersistence, ContentKind, ContentStore, GlossaryStore, MemoryStore};
use crate::translation::glossary::GlossaryEntry;
use crate::translation::pagination::{EditingWorkspace, Page};
use crate::translation::pipeline::{
    DocumentInput, DocumentOutcome, DocumentResult, Pipeline, ProcessOptions,
};
use crate::translation::stats::StatsSummary;

// @module: Application controller for document translation

/// Store backend selected by the `storage` configuration
#[derive(Clone)]
pub enum StoreBackend {
    Memory(MemoryStore),
    Sqlite(Repository),
}

impl StoreBackend {
    // @creates: Backend from storage settings
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.storage.in_memory {
            debug!("Using in-memory store");
            return Ok(Self::Memory(MemoryStore::new()));
        }

        let db = match &config.storage.database_path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };
        Ok(Self::Sqlite(Repository::new(db)))
    }

    pub fn content(&self) -> Arc<dyn ContentStore> {
        match self {
            Self::Memory(store) => Arc::new(store.clone()),
            Self::Sqlite(repo) => Arc::new(repo.clone()),
        }
    }

    pub fn cache(&self) -> Arc<dyn CachePersistence> {
        match self {
            Self::Memory(store) => Arc::new(store.clone()),
            Self::Sqlite(repo) => Arc::new(repo.clone()),
        }
    }

    pub fn glossaries(&self) -> Arc<dyn GlossaryStore> {
        match self {
            Self::Memory(store) => Arc::new(store.clone()),
            Self::Sqlite(repo) => Arc::new(repo.clone()),
        }
    }

    /// Cached translation count and, for SQLite, accumulated hits
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        match self {
            Self::Memory(store) => Ok(CacheStats {
                total_entries: store.cache_len() as i64,
                total_hits: 0,
            }),
            Self::Sqlite(repo) => repo.get_cache_stats().await,
        }
    }

    /// Remove every cached translation; returns how many were removed
    pub async fn clear_cache(&self) -> Result<i64> {
        match self {
            Self::Memory(store) => Ok(store.clear_cache() as i64),
            Self::Sqlite(repo) => repo.clear_cache().await,
        }
    }

    /// Row counts and file size of the SQLite database; `None` in memory
    pub async fn database_stats(&self) -> Result<Option<DatabaseStats>> {
        match self {
            Self::Memory(_) => Ok(None),
            Self::Sqlite(repo) => {
                let db = repo.connection().clone();
                let stats = tokio::task::spawn_blocking(move || db.stats())
                    .await
                    .context("Database stats task panicked")??;
                Ok(Some(stats))
            }
        }
    }

    /// Register a glossary, replacing one with the same id
    pub async fn save_glossary(
        &self,
        glossary_id: &str,
        owner: &str,
        entries: Vec<GlossaryEntry>,
    ) -> Result<()> {
        match self {
            Self::Memory(store) => {
                store.add_glossary(glossary_id, entries);
                Ok(())
            }
            Self::Sqlite(repo) => repo.save_glossary(glossary_id, glossary_id, owner, entries).await,
        }
    }
}

/// Options of one `translate` invocation
#[derive(Debug, Clone, Default)]
pub struct TranslateRequest {
    /// File or directory of documents
    pub input_path: PathBuf,
    /// Where outputs go; next to each input when absent
    pub output_dir: Option<PathBuf>,
    pub force_overwrite: bool,
    /// Stored glossary to apply
    pub glossary_id: Option<String>,
    /// JSON file of glossary entries, imported before translating
    pub glossary_file: Option<PathBuf>,
}

/// A document written by a run
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub input: PathBuf,
    pub output: PathBuf,
    pub document_id: String,
    pub failed_segments: usize,
}

/// Outcome of a `translate` run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub written: Vec<WrittenDocument>,
    pub skipped: usize,
    pub failed: Vec<PathBuf>,
    pub summary: StatsSummary,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Content, cache and glossary stores
    stores: StoreBackend,

    // @field: Translation pipeline
    pipeline: Pipeline,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let stores = StoreBackend::from_config(&config)?;
        Self::with_stores(config, stores)
    }

    /// Create a controller over an existing store backend
    pub fn with_stores(config: Config, stores: StoreBackend) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config, stores.cache(), stores.glossaries())
            .context("Configuration validation failed")?;

        Ok(Self {
            config,
            stores,
            pipeline,
        })
    }

    /// Replace the pipeline, keeping configuration and stores
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stores(&self) -> &StoreBackend {
        &self.stores
    }

    /// Translate every document under the input path
    pub async fn run(&self, request: TranslateRequest) -> Result<RunReport> {
        let start_time = std::time::Instant::now();
        let target_language = self.config.target_language.clone();

        let mut options = ProcessOptions::from_config(&self.config);
        if let Some(glossary_id) = self.import_glossary(&request).await? {
            options = options.with_glossary(glossary_id);
        }

        let mut skipped = 0;
        let mut pending = Vec::new();
        for input in FileManager::find_documents(&request.input_path)? {
            let output_dir = match &request.output_dir {
                Some(dir) => dir.clone(),
                None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
            };
            let output = FileManager::generate_output_path(&input, &output_dir, &target_language);

            if output.exists() && !request.force_overwrite {
                warn!(
                    "Skipping {}, translation already exists (use -f to force overwrite)",
                    input.display()
                );
                skipped += 1;
                continue;
            }
            pending.push((input, output));
        }

        let mut failed = Vec::new();
        let mut readable = Vec::with_capacity(pending.len());
        let mut documents = Vec::with_capacity(pending.len());
        for (input, output) in pending {
            match FileManager::read_to_string(&input) {
                Ok(text) => {
                    documents.push(DocumentInput::new(input.display().to_string(), text.clone()));
                    readable.push((input, output, text));
                }
                Err(e) => {
                    error!("Failed to read {}: {:#}", input.display(), e);
                    failed.push(input);
                }
            }
        }

        if documents.is_empty() {
            info!("Nothing to translate");
            return Ok(RunReport {
                written: Vec::new(),
                skipped,
                failed,
                summary: StatsSummary::default(),
            });
        }

        let progress = Self::progress_spinner(documents.len());
        let batch = self.pipeline.process_batch(documents, &target_language, &options).await;
        progress.finish_and_clear();
        let batch = batch?;

        let mut written = Vec::new();
        for (document, (input, output, source)) in batch.documents.iter().zip(readable) {
            match &document.outcome {
                DocumentOutcome::Completed(result) => {
                    if let Err(e) = self.save_result(&output, &source, result).await {
                        error!("Failed to save translation of {}: {:#}", input.display(), e);
                        failed.push(input);
                        continue;
                    }

                    if result.failed_segments() > 0 {
                        warn!(
                            "{}: {} segment(s) failed and were left out",
                            input.display(),
                            result.failed_segments()
                        );
                    }
                    info!("Success: {} (document {})", output.display(), result.document_id);

                    written.push(WrittenDocument {
                        input,
                        output,
                        document_id: result.document_id.clone(),
                        failed_segments: result.failed_segments(),
                    });
                }
                DocumentOutcome::Failed { error: reason, .. } => {
                    error!("Failed to translate {}: {}", input.display(), reason);
                    failed.push(input);
                }
            }
        }

        let summary = batch.summary.clone();
        info!(
            "Translated {} document(s) in {} ({} failed, {} skipped)",
            written.len(),
            Self::format_duration(start_time.elapsed()),
            failed.len(),
            skipped
        );
        info!(
            "Cache hits: {} ({:.1}%), review skipped: {} ({:.1}%), glossary hits: {} over {} term(s)",
            summary.cache_hits,
            summary.cache_ratio,
            summary.smart_review_savings,
            summary.smart_review_ratio,
            summary.glossary_hits,
            summary.unique_terms_used
        );

        Ok(RunReport {
            written,
            skipped,
            failed,
            summary,
        })
    }

    // Writes the output file and records source and translation for editing
    async fn save_result(&self, output: &Path, source: &str, result: &DocumentResult) -> Result<()> {
        FileManager::write_to_file(output, &result.combined_text)?;

        let owner = &self.config.owner;
        let content = self.stores.content();
        content
            .put(owner, &result.document_id, ContentKind::Source, source)
            .await?;
        content
            .put(owner, &result.document_id, ContentKind::Translated, &result.combined_text)
            .await?;
        Ok(())
    }

    /// Editing pages of a stored document, created on first access
    pub async fn pages(&self, document_id: &str) -> Result<Vec<Page>> {
        let workspace = EditingWorkspace::new(self.stores.content(), self.config.pipeline.page_chars);
        let pages = workspace
            .load_or_create_pages(&self.config.owner, document_id)
            .await?;
        Ok(pages)
    }

    // Imports the glossary file when given; returns the glossary id to apply
    async fn import_glossary(&self, request: &TranslateRequest) -> Result<Option<String>> {
        let Some(path) = &request.glossary_file else {
            return Ok(request.glossary_id.clone());
        };

        let json = FileManager::read_to_string(path)?;
        let entries: Vec<GlossaryEntry> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse glossary file: {:?}", path))?;

        let glossary_id = match &request.glossary_id {
            Some(id) => id.clone(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("Cannot derive a glossary id from {:?}", path))?,
        };

        info!("Imported glossary '{}' with {} entries", glossary_id, entries.len());
        self.stores
            .save_glossary(&glossary_id, &self.config.owner, entries)
            .await?;
        Ok(Some(glossary_id))
    }

    fn progress_spinner(documents: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress_bar.set_style(style);
        progress_bar.set_message(format!("Translating {} document(s)", documents));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
