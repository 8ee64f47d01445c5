//! Index of `{alias ...}` declarations: which files alias which namespace.
//!
//! Used to expand aliased call targets and to find alias-based usages of a
//! namespace. Removal is O(1) per file through a back-reference side table
//! owned by the index itself, never by the file.

use crate::base::FileId;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smol_str::SmolStr;

type FileSet = IndexSet<FileId, FxBuildHasher>;

#[derive(Debug, Clone, Default)]
pub struct AliasCache {
    /// namespace → files that alias it
    by_namespace: FxHashMap<SmolStr, FileSet>,
    /// file → namespaces it aliases (the back-reference for O(1) removal)
    by_file: FxHashMap<FileId, Vec<SmolStr>>,
}

impl AliasCache {
    /// Replace the aliases contributed by `file` with `namespaces`.
    pub fn replace_file(&mut self, file: FileId, namespaces: &[SmolStr]) {
        self.remove_file(file);
        if namespaces.is_empty() {
            return;
        }
        for namespace in namespaces {
            self.by_namespace
                .entry(namespace.clone())
                .or_default()
                .insert(file);
        }
        self.by_file.insert(file, namespaces.to_vec());
    }

    /// Drop everything contributed by `file`, pruning empty namespace keys.
    pub fn remove_file(&mut self, file: FileId) {
        let Some(namespaces) = self.by_file.remove(&file) else {
            return;
        };
        for namespace in namespaces {
            if let Some(files) = self.by_namespace.get_mut(&namespace) {
                files.shift_remove(&file);
                if files.is_empty() {
                    self.by_namespace.remove(&namespace);
                }
            }
        }
    }

    /// Files containing an alias of `namespace`, in contribution order.
    pub fn files_aliasing(&self, namespace: &str) -> Vec<FileId> {
        self.by_namespace
            .get(namespace)
            .map(|files| files.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Namespaces aliased by `file`.
    pub fn namespaces_aliased_by(&self, file: FileId) -> &[SmolStr] {
        self.by_file.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_namespace.is_empty() && self.by_file.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_lookup() {
        let mut cache = AliasCache::default();
        cache.replace_file(FileId::new(1), &["a.b".into(), "c.d".into()]);
        cache.replace_file(FileId::new(2), &["a.b".into()]);

        assert_eq!(cache.files_aliasing("a.b"), vec![FileId::new(1), FileId::new(2)]);
        assert_eq!(cache.files_aliasing("c.d"), vec![FileId::new(1)]);
        assert_eq!(cache.files_aliasing("x.y"), Vec::<FileId>::new());
    }

    #[test]
    fn test_replace_drops_stale_aliases() {
        let mut cache = AliasCache::default();
        cache.replace_file(FileId::new(1), &["a.b".into()]);
        cache.replace_file(FileId::new(1), &["c.d".into()]);

        assert!(cache.files_aliasing("a.b").is_empty());
        assert_eq!(cache.files_aliasing("c.d"), vec![FileId::new(1)]);
    }

    #[test]
    fn test_remove_prunes_empty_keys() {
        let mut cache = AliasCache::default();
        cache.replace_file(FileId::new(1), &["a.b".into()]);
        cache.remove_file(FileId::new(1));
        assert!(cache.is_empty());
    }
}
