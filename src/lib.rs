/*!
 * # booktranslate - Book translation pipeline
 *
 * A Rust library for translating long documents with an external machine
 * translation engine, optionally refined by an AI reviewer.
 *
 * ## Features
 *
 * - Paragraph-aware segmentation with bounded segment size
 * - Content-addressable translation cache
 * - Retry with exponential backoff on transient engine errors
 * - Smart review: only complex segments are sent to the reviewer
 * - Glossary substitution of domain terms
 * - Per-document and batch statistics
 * - Paginated editing workspace over stored content
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The processing core:
 *   - `translation::pipeline`: Document and batch orchestration
 *   - `translation::segmenter`: Segmentation
 *   - `translation::cache`: Fingerprints and cache index
 *   - `translation::review`: Review stage
 *   - `translation::glossary`: Glossary substitution
 *   - `translation::pagination`: Editing pages
 * - `providers`: Engine clients:
 *   - `providers::deepl`: DeepL translate API
 *   - `providers::openai`: OpenAI Assistants review
 *   - `providers::mock`: Scripted engines
 * - `storage`: Store interfaces and the in-memory store
 * - `database`: SQLite store
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Target language codes
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod storage;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ConfigurationError, PipelineError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_target_code};
pub use translation::{DocumentResult, Pipeline, ProcessOptions, StageEvent};
