use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::UNIX_EPOCH;

use crate::cache::hasher::hash_file;
use crate::cache::store::{CacheEntry, CacheTable};
use crate::foundation::hash::file_id;

/// Result of hashing one tracked file against its stored row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileState {
    /// The file does not exist.
    Missing,
    /// The stored digest equals the current digest.
    Unchanged,
    /// No row existed, the digest differs, or the file could not be hashed.
    Changed,
}

/// Build target key under which the dependencies of `destination_file` are stored.
fn dependency_scope(build_target: &str, destination_file: &Path) -> String {
    let abs = std::path::absolute(destination_file).unwrap_or_else(|_| destination_file.to_path_buf());
    format!("{build_target}>{:016x}", file_id(&abs))
}

#[derive(Debug, Default)]
struct CacheState {
    table: CacheTable,
    dirty: bool,
    /// Rows looked at since the last [`BuildCache::begin_asset`].
    touched: Vec<(String, u64)>,
}

/// Incremental build cache deciding whether a compile step may be skipped.
///
/// The handle is passed explicitly to every compiler. One mutex guards the table, so the
/// handle can be shared but only one caller mutates it at a time. Every failure of the
/// persistence layer degrades to "changed": a spurious recompile is preferred over a
/// silently skipped one.
#[derive(Debug)]
pub struct BuildCache {
    table_path: Option<PathBuf>,
    state: Mutex<CacheState>,
}

impl BuildCache {
    /// Open (or lazily create) the cache table for `project_name` under `cache_dir`.
    ///
    /// A missing table starts empty; an unreadable one is logged and also starts empty.
    pub fn open(cache_dir: &Path, project_name: &str) -> Self {
        let table_path = cache_dir.join(format!("{project_name}.cache.json"));
        let table = if table_path.exists() {
            match CacheTable::load(&table_path) {
                Ok(t) => {
                    tracing::debug!(rows = t.len(), path = %table_path.display(), "loaded build cache");
                    t
                }
                Err(e) => {
                    tracing::warn!("build cache unreadable, assuming every file changed: {e:#}");
                    CacheTable::default()
                }
            }
        } else {
            CacheTable::default()
        };
        Self {
            table_path: Some(table_path),
            state: Mutex::new(CacheState {
                table,
                ..CacheState::default()
            }),
        }
    }

    /// A cache that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            table_path: None,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hash `path` and compare it with the row stored for `build_target`, upserting the row.
    pub fn check_file(&self, build_target: &str, path: &Path) -> FileState {
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let metadata = match std::fs::metadata(&abs) {
            Ok(m) if m.is_file() => m,
            _ => return FileState::Missing,
        };
        let id = file_id(&abs);

        let content_hash = match hash_file(&abs) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(path = %abs.display(), "cannot hash file, assuming changed: {e}");
                return FileState::Changed;
            }
        };
        let file_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);
        let file_size = metadata.len() as i64;

        let mut state = self.lock();
        state.touched.push((build_target.to_string(), id));
        let previous = state.table.get(build_target, id);
        let unchanged = previous.is_some_and(|e| e.content_hash == content_hash);
        let same_row = previous.is_some_and(|e| {
            e.content_hash == content_hash && e.file_size == file_size && e.file_time == file_time
        });
        if !same_row {
            state.table.upsert(CacheEntry {
                file_id: id,
                build_target: build_target.to_string(),
                content_hash,
                file_size,
                file_time,
            });
            state.dirty = true;
        }

        if unchanged {
            FileState::Unchanged
        } else {
            FileState::Changed
        }
    }

    /// Decide whether `source_file` must be (re)compiled into `destination_file`.
    ///
    /// - missing source: `false`, there is nothing to compile
    /// - source or asset manifest changed: `true`
    /// - both unchanged but destination missing: `true`
    pub fn needs_to_be_compiled(
        &self,
        build_target: &str,
        asset_manifest_file: &Path,
        source_file: &Path,
        destination_file: &Path,
    ) -> bool {
        self.needs_to_be_compiled_with_dependencies(
            build_target,
            asset_manifest_file,
            &[source_file],
            destination_file,
        )
    }

    /// [`BuildCache::needs_to_be_compiled`] over a primary source plus the files it depends on.
    ///
    /// The first entry of `source_files` is the primary source; the remaining ones are
    /// dependencies. Every file is checked so all rows are refreshed in one pass.
    ///
    /// Dependency rows are scoped to `destination_file`: a dependency shared by several
    /// assets is tracked once per asset, so one asset refreshing its row does not hide the
    /// change from the others.
    pub fn needs_to_be_compiled_with_dependencies(
        &self,
        build_target: &str,
        asset_manifest_file: &Path,
        source_files: &[&Path],
        destination_file: &Path,
    ) -> bool {
        let Some((primary, dependencies)) = source_files.split_first() else {
            return false;
        };
        let primary_state = self.check_file(build_target, primary);
        if primary_state == FileState::Missing {
            return false;
        }

        let mut changed = primary_state == FileState::Changed;
        if !dependencies.is_empty() {
            let scope = dependency_scope(build_target, destination_file);
            for dependency in dependencies {
                changed |= self.check_file(&scope, dependency) != FileState::Unchanged;
            }
        }
        changed |= self.check_file(build_target, asset_manifest_file) != FileState::Unchanged;

        changed || !destination_file.exists()
    }

    /// Start tracking the rows touched by the next asset compile.
    pub fn begin_asset(&self) {
        self.lock().touched.clear();
    }

    /// Forget every row looked at since [`BuildCache::begin_asset`], forcing those files
    /// to be seen as changed next time. Called when a compile fails midway.
    pub fn invalidate_touched(&self) {
        let mut state = self.lock();
        let touched = std::mem::take(&mut state.touched);
        for (target, id) in touched {
            if state.table.remove(&target, id) {
                state.dirty = true;
            }
        }
    }

    /// Stored row for `path`, if any.
    pub fn entry(&self, build_target: &str, path: &Path) -> Option<CacheEntry> {
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.lock().table.get(build_target, file_id(&abs)).cloned()
    }

    /// Persist pending changes. Failures are logged and otherwise ignored.
    pub fn save(&self) {
        let Some(path) = self.table_path.as_deref() else {
            return;
        };
        let mut state = self.lock();
        if !state.dirty {
            return;
        }
        match state.table.save(path) {
            Ok(()) => state.dirty = false,
            Err(e) => tracing::warn!("failed to persist build cache: {e:#}"),
        }
    }
}

impl Drop for BuildCache {
    fn drop(&mut self) {
        self.save();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/manager.rs"]
mod tests;
