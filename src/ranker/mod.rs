//! Ranking by raw occurrence count
//!
//! Documents are ordered by descending count. The sort is stable, so files
//! with equal counts keep the order the loader produced them in.

use crate::counter::DocumentMatches;

/// Order matches by count, highest first, keeping ties in input order
pub fn rank_by_count<'a>(
    mut matches: Vec<DocumentMatches<'a>>,
    limit: Option<usize>,
) -> Vec<DocumentMatches<'a>> {
    matches.sort_by(|a, b| b.count.cmp(&a.count));
    if let Some(limit) = limit {
        matches.truncate(limit);
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Document, DocumentFormat};
    use std::path::PathBuf;

    fn make_document(name: &str) -> Document {
        Document {
            filename: name.to_string(),
            filepath: PathBuf::from(name),
            format: DocumentFormat::Pdf,
            content: String::new(),
        }
    }

    fn make_match(document: &Document, count: usize) -> DocumentMatches<'_> {
        DocumentMatches {
            document,
            count,
            contexts: vec![String::new(); count],
        }
    }

    fn names(ranked: &[DocumentMatches<'_>]) -> Vec<String> {
        ranked.iter().map(|m| m.document.filename.clone()).collect()
    }

    #[test]
    fn test_rank_by_count() {
        let docs = [make_document("a.pdf"), make_document("b.pdf"), make_document("c.pdf")];
        let matches = vec![
            make_match(&docs[0], 3),
            make_match(&docs[1], 5),
            make_match(&docs[2], 1),
        ];

        let ranked = rank_by_count(matches, None);
        assert_eq!(names(&ranked), vec!["b.pdf", "a.pdf", "c.pdf"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let docs = [make_document("x.pdf"), make_document("y.docx"), make_document("z.pdf")];
        let matches = vec![
            make_match(&docs[0], 2),
            make_match(&docs[1], 7),
            make_match(&docs[2], 2),
        ];

        let ranked = rank_by_count(matches, None);
        assert_eq!(names(&ranked), vec!["y.docx", "x.pdf", "z.pdf"]);
    }

    #[test]
    fn test_limit_applies_after_sorting() {
        let docs = [make_document("a.pdf"), make_document("b.pdf")];
        let matches = vec![make_match(&docs[0], 1), make_match(&docs[1], 4)];

        let ranked = rank_by_count(matches, Some(1));
        assert_eq!(names(&ranked), vec!["b.pdf"]);
    }
}
