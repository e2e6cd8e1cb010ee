//! Document loader: folder walk and per-format text extraction
//!
//! A file that fails to extract is logged and skipped; only an unreadable
//! root folder fails the whole load.

mod document;

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

pub use document::{is_highlight_derivative, Document, DocumentFormat, HIGHLIGHTED_SUFFIX};

/// Statistics from a load operation
#[derive(Debug, Default)]
pub struct LoadStats {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub duration_secs: f64,
}

/// Walks a folder and extracts every supported document
pub struct Loader {
    recursive: bool,
}

impl Loader {
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// Load all PDF and DOCX documents under `root`, in file-name order
    pub fn load_documents(&self, root: &Path) -> Result<(Vec<Document>, LoadStats)> {
        let start = Instant::now();
        let mut stats = LoadStats::default();
        let mut documents = Vec::new();

        let mut walker = WalkDir::new(root).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| format!("Failed to read {}", root.display()));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let entry_path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(format) = DocumentFormat::from_path(entry_path) else {
                continue;
            };
            if is_highlight_derivative(entry_path) {
                continue;
            }

            match extract_text(entry_path, format) {
                Ok(content) => {
                    documents.push(Document {
                        filename: entry.file_name().to_string_lossy().to_string(),
                        filepath: entry_path.to_path_buf(),
                        format,
                        content,
                    });
                    stats.files_loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("Error processing {}: {:#}", entry_path.display(), e);
                    stats.files_skipped += 1;
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        tracing::debug!(
            "Loaded {} documents ({} skipped) from {} in {:.2}s",
            stats.files_loaded,
            stats.files_skipped,
            root.display(),
            stats.duration_secs
        );

        Ok((documents, stats))
    }
}

/// Extract the full plain text of one document
pub fn extract_text(path: &Path, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Pdf => crate::pdf::extract_text(path),
        DocumentFormat::Docx => crate::docx::extract_text(path),
    }
}
