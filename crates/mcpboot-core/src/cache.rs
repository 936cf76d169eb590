//! Content-addressed cache for generated tool tables
//!
//! One JSON file per (prompt, content) pair. A hit makes the expensive
//! startup (fetch + two LLM phases) a one-time cost; a corrupt file is
//! deleted and treated as a miss.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::{CacheEntry, FetchedContent};

/// Separator between document bodies in the content-fingerprint input.
const CONTENT_SEPARATOR: &str = "\n---\n";

/// 16-hex-character prefix of a SHA-256 over `input`.
pub fn fingerprint(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Fingerprint of a document set, independent of fetch completion order:
/// bodies are concatenated sorted by URL ascending.
pub fn content_fingerprint(contents: &[FetchedContent]) -> String {
    let mut sorted: Vec<&FetchedContent> = contents.iter().collect();
    sorted.sort_by(|a, b| a.url.cmp(&b.url));
    let joined = sorted
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTENT_SEPARATOR);
    fingerprint(&joined)
}

/// On-disk cache of generation results.
pub struct ToolCache {
    dir: PathBuf,
    enabled: bool,
}

impl ToolCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// A cache that never hits and never writes (`--no-cache`).
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, prompt_fp: &str, content_fp: &str) -> PathBuf {
        self.dir.join(format!("{prompt_fp}-{content_fp}.json"))
    }

    /// Look up an entry. Unparsable or incomplete files are deleted and
    /// reported as a miss.
    pub fn get(&self, prompt_fp: &str, content_fp: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        let path = self.entry_path(prompt_fp, content_fp);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                debug!(path = %path.display(), "cache hit");
                Some(entry)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, deleting");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Persist an entry, overwriting any previous one for the same pair.
    /// The cache directory is created on first write.
    pub fn set(&self, entry: &CacheEntry) -> CoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(&entry.prompt_fingerprint, &entry.content_fingerprint);
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| CoreError::Cache(e.to_string()))?;
        fs::write(&path, json)?;
        debug!(path = %path.display(), tools = entry.compiled_tools.len(), "cache entry written");
        Ok(())
    }
}
