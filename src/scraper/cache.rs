use crate::scraper::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// On-disk cache of scraper responses.
///
/// Layout: `<cache_root>/scrapers/<scraper id>/<file>`, one file per URL entry
/// carrying a `cache="file"` attribute.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(cache_root: &Path, scraper_id: &str) -> Self {
        let root = cache_root.join("scrapers");
        let dir = root.join(scraper_id);
        Self { root, dir }
    }

    /// Directory holding this scraper's cached responses
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a cache file name; names that try to leave the directory are refused
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        let is_plain = path.components().count() == 1
            && path.file_name().is_some_and(|f| f == path.as_os_str());
        is_plain.then(|| self.dir.join(path))
    }

    /// Cached body for `name`, if present
    pub async fn load(&self, name: &str) -> Option<String> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => {
                debug!("Cache hit: {}", path.display());
                Some(body)
            }
            Err(_) => None,
        }
    }

    /// Store a fetched body under `name`
    pub async fn store(&self, name: &str, body: &str) -> Result<()> {
        let Some(path) = self.path_for(name) else {
            warn!("Refusing to cache response under '{}'", name);
            return Ok(());
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    /// Delete cached responses older than `persistence`.
    ///
    /// Creates the cache directories when they do not exist yet. Files that
    /// vanish while scanning are skipped. Returns the number of files removed.
    pub fn clear_expired(&self, persistence: Duration) -> Result<usize> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
            return Ok(0);
        }

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                continue;
            };

            // Expiry past the representable range never comes
            if modified.checked_add(persistence).is_none_or(|expiry| expiry > now) {
                continue;
            }

            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Evicted cached response {}", entry.path().display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to evict {}: {}", entry.path().display(), e),
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(86_400);

    fn stamp(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_clear_expired_only_removes_old_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(temp_dir.path(), "metadata.test");
        fs::create_dir_all(cache.dir()).unwrap();

        let old = cache.dir().join("old.xml");
        let fresh = cache.dir().join("fresh.xml");
        fs::write(&old, "<old/>").unwrap();
        fs::write(&fresh, "<fresh/>").unwrap();
        stamp(&old, DAY * 10);
        stamp(&fresh, DAY);

        let removed = cache.clear_expired(DAY * 7).unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn test_clear_expired_keeps_files_with_huge_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(temp_dir.path(), "metadata.test");
        fs::create_dir_all(cache.dir()).unwrap();

        let old = cache.dir().join("old.xml");
        fs::write(&old, "<old/>").unwrap();
        stamp(&old, DAY * 10);

        assert_eq!(cache.clear_expired(Duration::MAX).unwrap(), 0);
        assert!(old.exists());
    }

    #[test]
    fn test_clear_expired_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(temp_dir.path(), "metadata.new");

        assert_eq!(cache.clear_expired(DAY).unwrap(), 0);
        assert!(cache.dir().is_dir());
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(temp_dir.path(), "metadata.test");

        cache.store("search.xml", "<results/>").await.unwrap();
        assert_eq!(cache.load("search.xml").await.as_deref(), Some("<results/>"));
        assert!(cache.load("missing.xml").await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(temp_dir.path(), "metadata.test");

        cache.store("../evil.xml", "x").await.unwrap();
        assert!(!temp_dir.path().join("scrapers").join("evil.xml").exists());
        assert!(cache.load("../evil.xml").await.is_none());
    }
}
