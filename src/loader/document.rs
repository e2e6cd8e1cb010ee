//! Document records produced by the loader
//!
//! Fields:
//! - filename: base name, as shown to users
//! - filepath: location on disk
//! - format: PDF or DOCX, decided by extension
//! - content: full extracted text

use std::path::{Path, PathBuf};

/// Suffix that marks a file as a generated highlight derivative
pub const HIGHLIGHTED_SUFFIX: &str = "_highlighted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One extracted source file
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub filepath: PathBuf,
    pub format: DocumentFormat,
    pub content: String,
}

/// True when the file name marks a previously generated highlight derivative
pub fn is_highlight_derivative(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with(HIGHLIGHTED_SUFFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/report.PDF")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.docx")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.doc")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_derivative_detection() {
        assert!(is_highlight_derivative(Path::new(
            "report_rust_highlighted.pdf"
        )));
        assert!(is_highlight_derivative(Path::new(
            "dir/notes_x_highlighted.docx"
        )));
        assert!(!is_highlight_derivative(Path::new("highlighted_report.pdf")));
        assert!(!is_highlight_derivative(Path::new("report.pdf")));
    }
}
