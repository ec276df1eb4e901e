//! Content-hash cache used to tell whether a tool actually rewrote a file.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::debug;

pub const DEFAULT_HASH_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    hash: String,
    expires_at: Instant,
}

/// SHA-256 file hashes, cached with a TTL and evicted lazily on read.
pub struct ChangeDetector {
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
    ttl: Duration,
}

impl ChangeDetector {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Hex SHA-256 of the file, from cache when fresh.
    /// A missing file hashes to the empty string.
    pub fn compute_hash(&self, path: &Path) -> Result<String> {
        {
            let cache = self.cache.read();
            if let Some(entry) = cache.get(path) {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.hash.clone());
                }
            }
        }
        self.refresh(path)
    }

    /// Re-read the file, bypassing and then updating the cache
    pub fn refresh(&self, path: &Path) -> Result<String> {
        let hash = hash_file(path)?;
        let mut cache = self.cache.write();
        if hash.is_empty() {
            cache.remove(path);
        } else {
            cache.insert(
                path.to_path_buf(),
                CacheEntry {
                    hash: hash.clone(),
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
        Ok(hash)
    }

    /// Whether the file's current content differs from `previous`
    pub fn has_changed(&self, path: &Path, previous: &str) -> Result<bool> {
        let current = self.refresh(path)?;
        if current.len() != previous.len() {
            return Ok(true);
        }
        Ok(current.bytes().zip(previous.bytes()).any(|(a, b)| a != b))
    }

    pub fn invalidate(&self, path: &Path) {
        self.cache.write().remove(path);
    }

    /// Drop expired entries; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|_, entry| entry.expires_at > now);
        let evicted = before - cache.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired hash cache entries");
        }
        evicted
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_TTL)
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?} for hashing", path)),
    };
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_matches_sha256_and_is_stable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let detector = ChangeDetector::default();

        let first = detector.compute_hash(file.path()).unwrap();
        let second = detector.compute_hash(file.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_eq!(
            first,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_missing_file_hashes_empty() {
        let dir = tempfile::tempdir().unwrap();
        let detector = ChangeDetector::default();
        let hash = detector.compute_hash(&dir.path().join("nope.txt")).unwrap();
        assert!(hash.is_empty());
        assert!(detector.is_empty());
    }

    #[test]
    fn test_has_changed_sees_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "x=1").unwrap();
        let detector = ChangeDetector::default();

        let before = detector.compute_hash(&path).unwrap();
        assert!(!detector.has_changed(&path, &before).unwrap());

        std::fs::write(&path, "x = 1\n").unwrap();
        assert!(detector.has_changed(&path, &before).unwrap());
        // Cache now holds the new hash
        assert_ne!(detector.compute_hash(&path).unwrap(), before);
    }

    #[test]
    fn test_deleted_file_counts_as_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.rs");
        std::fs::write(&path, "fn main() {}").unwrap();
        let detector = ChangeDetector::default();
        let before = detector.compute_hash(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(detector.has_changed(&path, &before).unwrap());
    }

    #[test]
    fn test_expired_entries_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();

        let detector = ChangeDetector::new(Duration::ZERO);
        detector.compute_hash(&path).unwrap();
        assert_eq!(detector.len(), 1);
        assert_eq!(detector.evict_expired(), 1);
        assert!(detector.is_empty());
    }

    #[test]
    fn test_expired_entry_rehashed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();
        let detector = ChangeDetector::new(Duration::ZERO);
        let first = detector.compute_hash(&path).unwrap();
        std::fs::write(&path, "b").unwrap();
        assert_ne!(detector.compute_hash(&path).unwrap(), first);
    }

    #[test]
    fn test_clear_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "1").unwrap();
        std::fs::write(&b, "2").unwrap();
        let detector = ChangeDetector::default();
        detector.compute_hash(&a).unwrap();
        detector.compute_hash(&b).unwrap();
        detector.invalidate(&a);
        assert_eq!(detector.len(), 1);
        detector.clear();
        assert!(detector.is_empty());
    }

    #[test]
    fn test_concurrent_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.txt");
        std::fs::write(&path, "shared").unwrap();
        let detector = std::sync::Arc::new(ChangeDetector::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let detector = detector.clone();
                let path = path.clone();
                std::thread::spawn(move || detector.compute_hash(&path).unwrap())
            })
            .collect();
        let hashes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }
}
