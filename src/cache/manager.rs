//! The incremental cache manager: per-module indexes behind one lock.
//!
//! Readers (queries performing cross-file steps) and the writer (the
//! updater reacting to file changes) synchronize on a single RwLock; a
//! file's contributions are replaced under one write-lock acquisition, so a
//! reader observes either the pre- or post-update state for that file,
//! never a mix.

use super::entry::CacheEntry;
use super::module_cache::ModuleCache;
use super::scanner::{scan, ScanRecord};
use crate::base::FileId;
use parking_lot::{RwLock, RwLockReadGuard};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Files larger than this are excluded from the index rather than scanned.
pub const MAX_SCAN_BYTES: usize = 1 << 20;

/// The file extension the index recognizes.
pub const SOY_EXTENSION: &str = "soy";

/// A project-module scope. Each module gets its own index hierarchy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub const DEFAULT: ModuleId = ModuleId(0);
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// Read access to file text and names, provided by the host workspace.
pub trait SourceAccess {
    fn file_text(&self, file: FileId) -> Option<Arc<str>>;
    fn file_name(&self, file: FileId) -> Option<SmolStr>;
}

/// Bulk file enumeration, provided by the host workspace. Used only by
/// [`SoyCacheManager::reindex`], never by single-file updates.
pub trait FileEnumeration {
    fn files_with_extension(&self, ext: &str) -> Vec<FileId>;
}

#[derive(Default)]
struct ManagerInner {
    modules: FxHashMap<ModuleId, ModuleCache>,
    file_modules: FxHashMap<FileId, ModuleId>,
}

/// The top-level incremental symbol index.
///
/// Module caches are created lazily on their first entry and live for the
/// module's lifetime. The global revision counter increases monotonically
/// with every mutation and can be polled by diagnostic tooling.
#[derive(Default)]
pub struct SoyCacheManager {
    inner: RwLock<ManagerInner>,
    revision: AtomicU64,
}

enum ScanOutcome {
    /// Not scanned (cancelled); leave the file's contributions stale.
    Skipped,
    /// Wrong extension or oversized; contributions are cleared.
    Unscannable,
    Scanned(ScanRecord),
}

impl SoyCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Module assignment
    // ========================================================================

    /// Assign `file` to a module. Unassigned files belong to
    /// [`ModuleId::DEFAULT`].
    pub fn assign_module(&self, file: FileId, module: ModuleId) {
        self.inner.write().file_modules.insert(file, module);
    }

    pub fn module_of(&self, file: FileId) -> ModuleId {
        self.inner
            .read()
            .file_modules
            .get(&file)
            .copied()
            .unwrap_or(ModuleId::DEFAULT)
    }

    // ========================================================================
    // Incremental updates
    // ========================================================================

    /// Rescan one file and replace its index contributions atomically.
    ///
    /// Files with the wrong extension or beyond the size policy are
    /// silently excluded: the index is a best-effort accelerator, and
    /// resolution degrades to "unresolved" for anything it does not cover.
    pub fn update_cache(&self, file: FileId, source: &dyn SourceAccess) {
        let outcome = self.scan_file(file, source);
        let record = match outcome {
            ScanOutcome::Skipped => return,
            ScanOutcome::Unscannable => None,
            ScanOutcome::Scanned(record) => Some(record),
        };
        self.apply(file, record);
    }

    /// Remove all contributions of a deleted file.
    pub fn remove_from_cache(&self, file: FileId) {
        let module = self.module_of(file);
        {
            let mut inner = self.inner.write();
            if let Some(cache) = inner.modules.get_mut(&module) {
                cache.remove_file(file);
            }
            inner.file_modules.remove(&file);
        }
        self.revision.fetch_add(1, Ordering::Release);
    }

    /// Rebuild the index for every file the host enumerates.
    ///
    /// Scanning runs in parallel; application is sequential, one file per
    /// write-lock acquisition, with the cancellation signal checked between
    /// files. Abandoning mid-way leaves unreached files stale without
    /// breaking any invariant. Returns the number of files applied.
    pub fn reindex(
        &self,
        source: &(impl SourceAccess + FileEnumeration + Sync),
        cancel: &CancellationToken,
    ) -> usize {
        let files = source.files_with_extension(SOY_EXTENSION);
        debug!(files = files.len(), "bulk reindex started");
        let outcomes: Vec<(FileId, ScanOutcome)> = files
            .par_iter()
            .map(|&file| {
                if cancel.is_cancelled() {
                    (file, ScanOutcome::Skipped)
                } else {
                    (file, self.scan_file(file, source))
                }
            })
            .collect();

        let mut applied = 0;
        for (file, outcome) in outcomes {
            if cancel.is_cancelled() {
                debug!(applied, "bulk reindex cancelled");
                return applied;
            }
            match outcome {
                ScanOutcome::Skipped => continue,
                ScanOutcome::Unscannable => self.apply(file, None),
                ScanOutcome::Scanned(record) => self.apply(file, Some(record)),
            }
            applied += 1;
        }
        debug!(applied, "bulk reindex finished");
        applied
    }

    fn scan_file(&self, file: FileId, source: &dyn SourceAccess) -> ScanOutcome {
        let extension_ok = source
            .file_name(file)
            .and_then(|name| name.rsplit('.').next().map(SmolStr::from))
            .is_some_and(|ext| ext == SOY_EXTENSION);
        if !extension_ok {
            return ScanOutcome::Unscannable;
        }
        match source.file_text(file) {
            Some(text) if text.len() <= MAX_SCAN_BYTES => ScanOutcome::Scanned(scan(&text)),
            Some(_) => {
                trace!(file = %file, "file exceeds scan size policy, excluded");
                ScanOutcome::Unscannable
            }
            None => ScanOutcome::Unscannable,
        }
    }

    fn apply(&self, file: FileId, record: Option<ScanRecord>) {
        let module = self.module_of(file);
        {
            let mut inner = self.inner.write();
            let cache = inner.modules.entry(module).or_default();
            match record {
                Some(record) => {
                    let entries = entries_from_scan(&record, file);
                    cache.replace_file(file, entries, &record.aliases);
                }
                None => cache.replace_file(file, Vec::new(), &[]),
            }
        }
        self.revision.fetch_add(1, Ordering::Release);
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// A live, allocation-light read view. Holds the read lock for its
    /// lifetime; mutations performed after release are visible to the next
    /// view.
    pub fn read(&self) -> CacheReadGuard<'_> {
        CacheReadGuard {
            inner: self.inner.read(),
        }
    }

    /// A deep, independent snapshot of one module's index, for diagnostic
    /// tooling that diffs two points in time.
    pub fn snapshot(&self, module: ModuleId) -> Option<ModuleCache> {
        self.inner.read().modules.get(&module).cloned()
    }

    /// Monotonic mutation counter across all modules.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

/// Read view over the cache manager.
pub struct CacheReadGuard<'a> {
    inner: RwLockReadGuard<'a, ManagerInner>,
}

impl CacheReadGuard<'_> {
    pub fn module(&self, module: ModuleId) -> Option<&ModuleCache> {
        self.inner.modules.get(&module)
    }

    pub fn module_of(&self, file: FileId) -> ModuleId {
        self.inner
            .file_modules
            .get(&file)
            .copied()
            .unwrap_or(ModuleId::DEFAULT)
    }
}

fn entries_from_scan(record: &ScanRecord, file: FileId) -> Vec<CacheEntry> {
    let mut entries = Vec::with_capacity(record.templates.len() + record.deltemplates.len());
    for name in &record.templates {
        entries.push(CacheEntry::template(
            record.namespace.clone(),
            name.clone(),
            file,
        ));
    }
    for name in &record.deltemplates {
        entries.push(CacheEntry::deltemplate(
            record.delpackage.clone(),
            name.clone(),
            file,
        ));
    }
    entries
}
