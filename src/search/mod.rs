//! Search service
//!
//! One request runs validate -> load -> count -> rank -> highlight. The
//! service owns nothing mutable, so the HTTP frontend shares it behind an
//! `Arc` and runs each request on the blocking pool.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::config::SearchConfig;
use crate::counter::count_occurrences;
use crate::error::SearchError;
use crate::highlight::HighlightEngine;
use crate::loader::{DocumentFormat, Loader};
use crate::ranker::rank_by_count;

/// One ranked document in a search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub filename: String,
    pub filepath: PathBuf,
    /// Location inside the searched folder, `/`-separated
    pub relative_path: String,
    #[serde(skip)]
    pub format: DocumentFormat,
    pub count: usize,
    /// Derivative location inside the searched folder, `/`-separated
    pub highlighted_path: Option<String>,
    pub contexts: Vec<String>,
}

/// `path` relative to `root`, joined with `/` whatever the platform
pub fn relative_string(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Accept only plain relative names that stay below their parent
fn checked_relative(name: &str) -> Result<&Path, SearchError> {
    let path = Path::new(name);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if name.trim().is_empty() || !plain {
        return Err(SearchError::InvalidPath(name.to_string()));
    }
    Ok(path)
}

pub struct SearchService {
    config: SearchConfig,
    loader: Loader,
    engine: HighlightEngine,
}

impl SearchService {
    pub fn new(config: SearchConfig) -> Self {
        let loader = Loader::new(config.recursive);
        let engine = HighlightEngine::new(&config);
        Self {
            config,
            loader,
            engine,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Resolve a folder name against the base directory
    pub fn resolve_folder(&self, folder_name: &str) -> Result<PathBuf, SearchError> {
        let folder = self.config.base_dir.join(checked_relative(folder_name)?);
        if !folder.is_dir() {
            return Err(SearchError::FolderNotFound(folder));
        }
        Ok(folder)
    }

    /// Resolve a file inside a folder, requiring the given format
    pub fn resolve_file(
        &self,
        folder_name: &str,
        file: &str,
        format: DocumentFormat,
    ) -> Result<PathBuf, SearchError> {
        let folder = self.resolve_folder(folder_name)?;
        let path = folder.join(checked_relative(file)?);

        if !path.is_file() || DocumentFormat::from_path(&path) != Some(format) {
            return Err(SearchError::FileNotFound(path));
        }
        Ok(path)
    }

    /// Rank the documents of `folder_name` by occurrences of `keyword`.
    ///
    /// With `highlight`, every returned document gets a derivative; the first
    /// highlight failure fails the whole request.
    pub fn search(
        &self,
        folder_name: &str,
        keyword: &str,
        limit: Option<usize>,
        highlight: bool,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if keyword.trim().is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        let folder = self.resolve_folder(folder_name)?;

        let (documents, stats) = self
            .loader
            .load_documents(&folder)
            .map_err(SearchError::Load)?;
        tracing::info!(
            "Loaded {} document(s) from {} in {:.2}s ({} skipped)",
            stats.files_loaded,
            folder.display(),
            stats.duration_secs,
            stats.files_skipped
        );

        let ranked = rank_by_count(count_occurrences(&documents, keyword), limit);
        tracing::info!("{} document(s) match {:?}", ranked.len(), keyword);

        ranked
            .into_iter()
            .map(|m| {
                let document = m.document;
                let highlighted_path = if highlight {
                    let highlighted = self
                        .engine
                        .highlight(&document.filepath, document.format, keyword)
                        .map_err(|source| SearchError::Highlight {
                            path: document.filepath.clone(),
                            source,
                        })?;
                    if highlighted.reused {
                        tracing::debug!("Up to date: {}", highlighted.path.display());
                    } else if highlighted.marks < m.count {
                        tracing::debug!(
                            "Marked {} span(s) for {} counted match(es) in {}",
                            highlighted.marks,
                            m.count,
                            document.filename
                        );
                    }
                    Some(relative_string(&highlighted.path, &folder))
                } else {
                    None
                };

                Ok(SearchHit {
                    filename: document.filename.clone(),
                    filepath: document.filepath.clone(),
                    relative_path: relative_string(&document.filepath, &folder),
                    format: document.format,
                    count: m.count,
                    highlighted_path,
                    contexts: m.contexts,
                })
            })
            .collect()
    }
}
