//! Error taxonomy for search requests
//!
//! Internal plumbing uses `anyhow`; this enum is what crosses the boundary
//! into the HTTP frontend and the CLI, so every variant maps to a status.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("keyword must not be empty")]
    EmptyKeyword,

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("Folder not found")]
    FolderNotFound(PathBuf),

    #[error("File not found")]
    FileNotFound(PathBuf),

    #[error("failed to load documents: {0:#}")]
    Load(#[source] anyhow::Error),

    #[error("failed to highlight {}: {source:#}", path.display())]
    Highlight {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("search task failed: {0}")]
    Task(String),
}
