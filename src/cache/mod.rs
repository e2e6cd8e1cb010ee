//! Freshness check for highlight derivatives
//!
//! A derivative is reused only while it is at least as new as its source.
//! Editing the source after highlighting makes the derivative stale.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Result of checking a derivative against its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    Stale,
    Fresh,
}

/// Modification time of a regular file
fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .and_then(|m| m.modified().ok())
}

/// Decides whether an existing derivative can be served as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightCache {
    /// Treat every derivative as stale
    force: bool,
}

impl HighlightCache {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Check `derived` against the `source` it was generated from
    pub fn check(&self, source: &Path, derived: &Path) -> CacheStatus {
        let Some(derived_mtime) = modified(derived) else {
            return CacheStatus::Missing;
        };
        if self.force {
            return CacheStatus::Stale;
        }

        match modified(source) {
            Some(source_mtime) if source_mtime > derived_mtime => CacheStatus::Stale,
            Some(_) => CacheStatus::Fresh,
            // Source gone or unreadable: nothing to compare against
            None => CacheStatus::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_missing_derivative() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        fs::write(&source, b"x").unwrap();

        let status = HighlightCache::default().check(&source, &dir.path().join("b.pdf"));
        assert_eq!(status, CacheStatus::Missing);
    }

    #[test]
    fn test_fresh_then_stale_after_source_edit() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        let derived = dir.path().join("a_k_highlighted.pdf");
        fs::write(&source, b"x").unwrap();
        fs::write(&derived, b"y").unwrap();

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&source, base);
        set_mtime(&derived, base + Duration::from_secs(10));

        let cache = HighlightCache::default();
        assert_eq!(cache.check(&source, &derived), CacheStatus::Fresh);

        set_mtime(&source, base + Duration::from_secs(20));
        assert_eq!(cache.check(&source, &derived), CacheStatus::Stale);
    }

    #[test]
    fn test_force_marks_existing_stale() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        let derived = dir.path().join("a_k_highlighted.pdf");
        fs::write(&source, b"x").unwrap();
        fs::write(&derived, b"y").unwrap();

        assert_eq!(
            HighlightCache::new(true).check(&source, &derived),
            CacheStatus::Stale
        );
    }
}
