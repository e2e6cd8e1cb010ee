//! Search configuration
//!
//! Everything the search pipeline needs is resolved once, at startup, into a
//! `SearchConfig` and handed to `SearchService::new`. The base directory may
//! come from a flag, from a one-line path file (first non-empty line,
//! trimmed), or falls back to the current directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default highlight colour for DOCX runs (a `ST_HighlightColor` name)
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";

/// Case policy used when locating keyword rectangles inside PDF pages.
///
/// Counting is always case-insensitive; PDF location historically was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchCase {
    #[default]
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Directory that request folder names are resolved against
    pub base_dir: PathBuf,
    /// Walk folders recursively (true) or only their top level (false)
    pub recursive: bool,
    pub pdf_match_case: MatchCase,
    pub highlight_color: String,
    /// Regenerate highlight derivatives even when a fresh one exists
    pub force: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            recursive: true,
            pdf_match_case: MatchCase::Sensitive,
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            force: false,
        }
    }
}

impl SearchConfig {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }
}

/// Default location of the base path file (`<config dir>/docseekr/path.txt`)
pub fn default_base_dir_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docseekr").join("path.txt"))
}

/// Read the base directory from a path file: the first non-empty line, trimmed
pub fn read_base_dir_file(path: &Path) -> Result<PathBuf> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read base path file: {}", path.display()))?;

    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .with_context(|| format!("Base path file is empty: {}", path.display()))
}

/// Resolve the base directory.
///
/// Precedence: explicit directory, explicit path file, default path file if
/// it exists, current directory.
pub fn resolve_base_dir(explicit: Option<PathBuf>, path_file: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    if let Some(file) = path_file {
        return read_base_dir_file(file);
    }

    if let Some(file) = default_base_dir_file().filter(|f| f.is_file()) {
        tracing::debug!("Using base path file {:?}", file);
        return read_base_dir_file(&file);
    }

    std::env::current_dir().context("Could not determine current directory")
}
