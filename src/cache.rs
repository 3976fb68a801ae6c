//! Export cache.
//!
//! Content-hash cache used by the CLI to skip rewriting documents whose
//! inputs have not changed between runs. One JSON entry per route under
//! `.lumen/cache`; a corrupt entry is invalidated rather than trusted.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub html: String,
}

pub struct ExportCache {
    cache_dir: PathBuf,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::with_dir(PathBuf::from(".lumen/cache"))
    }

    pub fn with_dir(cache_dir: PathBuf) -> Self {
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).ok();
        }
        Self { cache_dir }
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Stable fingerprint over every input that can change a document.
    pub fn fingerprint(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, route: &str) -> PathBuf {
        let safe_name = route.trim_matches('/').replace(['/', '\\', ':'], "_");
        let safe_name = if safe_name.is_empty() {
            "index".to_string()
        } else {
            safe_name
        };
        self.cache_dir.join(format!("{safe_name}.json"))
    }

    pub fn get(&self, route: &str, fingerprint: &str) -> Option<String> {
        let entry_path = self.entry_path(route);
        if !entry_path.exists() {
            return None;
        }

        let data = fs::read_to_string(&entry_path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(err) => {
                eprintln!("[lumen-export] cache entry unreadable for {route}: {err}");
                fs::remove_file(entry_path).ok();
                return None;
            }
        };

        if entry.hash == fingerprint {
            Some(entry.html)
        } else {
            None
        }
    }

    pub fn set(&self, route: &str, fingerprint: &str, html: &str) {
        let entry = CacheEntry {
            hash: fingerprint.to_string(),
            html: html.to_string(),
        };
        if let Ok(data) = serde_json::to_string(&entry) {
            fs::write(self.entry_path(route), data).ok();
        }
    }
}

impl Default for ExportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = ExportCache::fingerprint(&["one", "two"]);
        let b = ExportCache::fingerprint(&["two", "one"]);
        assert_ne!(a, b);
        assert_eq!(a, ExportCache::fingerprint(&["one", "two"]));
    }

    #[test]
    fn test_fingerprint_length_prefix_disambiguates() {
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(
            ExportCache::fingerprint(&["ab", "c"]),
            ExportCache::fingerprint(&["a", "bc"])
        );
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(
            ExportCache::compute_hash("abc"),
            ExportCache::compute_hash("abc")
        );
        assert_ne!(
            ExportCache::compute_hash("abc"),
            ExportCache::compute_hash("abd")
        );
    }
}
