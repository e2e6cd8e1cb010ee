//! Highlight derivatives
//!
//! Each matching source gets a sibling copy named
//! `<stem>_<keyword>_highlighted.<ext>` with the keyword marked up. Copies
//! are written to a temporary file in the same directory and renamed into
//! place, so readers never see a half-written derivative. An existing copy
//! is reused while the cache reports it fresh.

mod docx;
mod pdf;

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::cache::{CacheStatus, HighlightCache};
use crate::config::SearchConfig;
use crate::loader::{DocumentFormat, HIGHLIGHTED_SUFFIX};

pub use self::docx::DocxHighlighter;
pub use self::pdf::PdfHighlighter;

/// Writes a marked-up copy of one document format
pub trait Highlighter: Send + Sync {
    fn format(&self) -> DocumentFormat;

    /// Write a highlighted copy of `source` into `out`; returns the number
    /// of marked spans
    fn render(&self, source: &Path, keyword: &str, out: &mut File) -> Result<usize>;
}

/// Outcome of one highlight request
#[derive(Debug, Clone)]
pub struct Highlighted {
    pub path: PathBuf,
    pub reused: bool,
    /// Spans marked; zero when the derivative was reused
    pub marks: usize,
}

/// Keyword as it may appear inside a file name
fn file_name_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Path of the derivative for `source` and `keyword`
pub fn highlighted_path(source: &Path, keyword: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut name = format!("{stem}_{}{HIGHLIGHTED_SUFFIX}", file_name_keyword(keyword));
    if let Some(ext) = source.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    source.with_file_name(name)
}

/// Dispatches to the per-format highlighters
pub struct HighlightEngine {
    highlighters: Vec<Box<dyn Highlighter>>,
    cache: HighlightCache,
}

impl HighlightEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            highlighters: vec![
                Box::new(PdfHighlighter::new(config.pdf_match_case)),
                Box::new(DocxHighlighter::new(&config.highlight_color)),
            ],
            cache: HighlightCache::new(config.force),
        }
    }

    fn highlighter_for(&self, format: DocumentFormat) -> Result<&dyn Highlighter> {
        self.highlighters
            .iter()
            .find(|h| h.format() == format)
            .map(|h| h.as_ref())
            .with_context(|| format!("No highlighter for {format} files"))
    }

    /// Produce or reuse the derivative of `source`
    pub fn highlight(
        &self,
        source: &Path,
        format: DocumentFormat,
        keyword: &str,
    ) -> Result<Highlighted> {
        let target = highlighted_path(source, keyword);

        match self.cache.check(source, &target) {
            CacheStatus::Fresh => {
                tracing::debug!("Reusing {}", target.display());
                return Ok(Highlighted {
                    path: target,
                    reused: true,
                    marks: 0,
                });
            }
            CacheStatus::Stale => tracing::debug!("Regenerating stale {}", target.display()),
            CacheStatus::Missing => {}
        }

        let highlighter = self.highlighter_for(format)?;
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

        let marks = highlighter.render(source, keyword, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        tracing::info!(
            "Highlighted {} match(es) of {:?} in {}",
            marks,
            keyword,
            source.display()
        );

        Ok(Highlighted {
            path: target,
            reused: false,
            marks,
        })
    }
}
