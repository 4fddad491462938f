/*!
 * Database module for persistent storage.
 *
 * This module provides SQLite-based persistence for:
 * - Document content (source, translation, editing pages) per owner
 * - Translation cache keyed by fingerprint
 * - Glossaries
 */

pub mod connection;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::{CacheStats, Repository};
