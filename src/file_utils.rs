use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions accepted as translatable documents
pub const DOCUMENT_EXTENSIONS: [&str; 2] = ["txt", "md"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a translated document
    // @params: input_file, output_dir, target_language
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();

        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let extension = input_file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "txt".to_string());

        let output_filename = format!("{}.{}.{}", stem, target_language.to_lowercase(), extension);
        output_dir.as_ref().join(output_filename)
    }

    /// Whether a path looks like an output this tool already produced,
    /// i.e. `<stem>.<lang>.<ext>` with a known language segment
    pub fn is_translation_output<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .map(|lang| crate::language_utils::normalize_target_code(&lang.to_string_lossy()).is_ok())
            .unwrap_or(false)
    }

    /// Find files with one of the given extensions in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions.iter().any(|e| ext.eq_ignore_ascii_case(e.trim_start_matches('.'))) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Documents to translate under a file or directory path, skipping
    /// previously written translations
    pub fn find_documents<P: AsRef<Path>>(input: P) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();

        if Self::file_exists(input) {
            return Ok(vec![input.to_path_buf()]);
        }
        if !Self::dir_exists(input) {
            return Err(anyhow::anyhow!("Input path does not exist: {:?}", input));
        }

        let files = Self::find_files(input, &DOCUMENT_EXTENSIONS)?
            .into_iter()
            .filter(|path| !Self::is_translation_output(path))
            .collect();
        Ok(files)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
