use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

const CACHE_TABLE_VERSION: u32 = 1;

/// One row of the build cache: the last known state of a file for one build target.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// xxh3-64 of the absolute file path.
    pub file_id: u64,
    /// Renderer target the row belongs to.
    pub build_target: String,
    /// SHA-256 of the file contents, lowercase hex.
    pub content_hash: String,
    /// File size in bytes when hashed.
    pub file_size: i64,
    /// Modification time (seconds since the unix epoch) when hashed.
    pub file_time: i64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheTableFile {
    version: u32,
    entries: Vec<CacheEntry>,
}

/// In-memory image of the persistent cache table, keyed by `(buildTarget, fileId)`.
#[derive(Debug, Default)]
pub(crate) struct CacheTable {
    rows: HashMap<(String, u64), CacheEntry>,
}

impl CacheTable {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read cache table '{}'", path.display()))?;
        let file: CacheTableFile = serde_json::from_str(&text)
            .with_context(|| format!("parse cache table '{}'", path.display()))?;
        if file.version != CACHE_TABLE_VERSION {
            anyhow::bail!(
                "cache table '{}' has version {}, expected {CACHE_TABLE_VERSION}",
                path.display(),
                file.version
            );
        }
        let mut out = Self::default();
        for entry in file.entries {
            out.upsert(entry);
        }
        Ok(out)
    }

    /// Persist the table. Rows are written sorted so the file is stable across runs, and the
    /// write goes through a temporary file so an interrupted save never truncates the table.
    pub(crate) fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create cache dir '{}'", parent.display()))?;
        }
        let mut entries: Vec<CacheEntry> = self.rows.values().cloned().collect();
        entries.sort_by(|a, b| {
            (a.build_target.as_str(), a.file_id).cmp(&(b.build_target.as_str(), b.file_id))
        });
        let text = serde_json::to_string_pretty(&CacheTableFile {
            version: CACHE_TABLE_VERSION,
            entries,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .with_context(|| format!("write cache table '{}'", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("replace cache table '{}'", path.display()))?;
        Ok(())
    }

    pub(crate) fn get(&self, build_target: &str, file_id: u64) -> Option<&CacheEntry> {
        self.rows.get(&(build_target.to_string(), file_id))
    }

    pub(crate) fn upsert(&mut self, entry: CacheEntry) {
        self.rows
            .insert((entry.build_target.clone(), entry.file_id), entry);
    }

    pub(crate) fn remove(&mut self, build_target: &str, file_id: u64) -> bool {
        self.rows
            .remove(&(build_target.to_string(), file_id))
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
