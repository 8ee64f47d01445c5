//! Diagnostic change monitor for the symbol index.
//!
//! A best-effort, read-only observer: it retains a snapshot, polls the
//! manager's revision counter, and reports the entry-level diff since the
//! last poll at debug level. It never blocks index writers or query readers
//! and makes no linearizability promise against concurrent updates.

use super::entry::CacheEntry;
use super::manager::{ModuleId, SoyCacheManager};
use super::module_cache::ModuleCache;
use tracing::debug;

/// Entries added and removed between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDiff {
    pub added: Vec<CacheEntry>,
    pub removed: Vec<CacheEntry>,
}

impl CacheDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Polls one module's index for changes.
pub struct CacheMonitor {
    module: ModuleId,
    last_revision: u64,
    snapshot: ModuleCache,
}

impl CacheMonitor {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            last_revision: 0,
            snapshot: ModuleCache::new(),
        }
    }

    /// Check the revision counter; when it moved, compute the diff against
    /// the retained snapshot and retain the current state. Returns None when
    /// nothing changed since the last poll.
    pub fn poll(&mut self, caches: &SoyCacheManager) -> Option<CacheDiff> {
        let revision = caches.revision();
        if revision == self.last_revision {
            return None;
        }
        self.last_revision = revision;
        let current = caches.snapshot(self.module).unwrap_or_default();
        let diff = diff_entries(&self.snapshot, &current);
        if !diff.is_empty() {
            debug!(
                module = ?self.module,
                revision,
                added = diff.added.len(),
                removed = diff.removed.len(),
                "index changed: +{:?} -{:?}",
                diff.added,
                diff.removed
            );
        }
        self.snapshot = current;
        Some(diff)
    }
}

fn diff_entries(before: &ModuleCache, after: &ModuleCache) -> CacheDiff {
    let old = before.all_entries();
    let new = after.all_entries();
    CacheDiff {
        added: new.iter().filter(|e| !old.contains(e)).cloned().collect(),
        removed: old.iter().filter(|e| !new.contains(e)).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::cache::manager::{SourceAccess, SoyCacheManager};
    use smol_str::SmolStr;
    use std::sync::Arc;

    struct OneFile(&'static str);

    impl SourceAccess for OneFile {
        fn file_text(&self, _file: FileId) -> Option<Arc<str>> {
            Some(Arc::from(self.0))
        }

        fn file_name(&self, _file: FileId) -> Option<SmolStr> {
            Some(SmolStr::from("a.soy"))
        }
    }

    #[test]
    fn test_poll_reports_changes_once() {
        let manager = SoyCacheManager::new();
        let mut monitor = CacheMonitor::new(ModuleId::DEFAULT);
        assert!(monitor.poll(&manager).is_none(), "nothing happened yet");

        manager.update_cache(
            FileId::new(1),
            &OneFile("{namespace ns}\n{template .foo}x{/template}\n"),
        );
        let diff = monitor.poll(&manager).unwrap();
        assert_eq!(diff.added.len(), 1);
        assert!(diff.removed.is_empty());

        // revision unchanged → no report
        assert!(monitor.poll(&manager).is_none());
    }

    #[test]
    fn test_poll_reports_removals() {
        let manager = SoyCacheManager::new();
        let mut monitor = CacheMonitor::new(ModuleId::DEFAULT);
        manager.update_cache(
            FileId::new(1),
            &OneFile("{namespace ns}\n{template .foo}x{/template}\n"),
        );
        monitor.poll(&manager);

        manager.remove_from_cache(FileId::new(1));
        let diff = monitor.poll(&manager).unwrap();
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed.len(), 1);
    }
}
