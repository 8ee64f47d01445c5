//! The per-module symbol index.
//!
//! Two hierarchical maps (namespaces and delegate packages), each scope key
//! → template short name → entry set, with a parallel flat index over short
//! names alone. Every level tracks the files that contributed to it so a
//! file's contributions can be removed exactly, and empty levels are pruned
//! bottom-up.
//!
//! All mutation goes through [`ModuleCache::replace_file`]: a file's entries
//! are replaced as a unit, so readers never observe a mix of old and new
//! entries for the same file.

use super::alias_cache::AliasCache;
use super::entry::{CacheEntry, EntrySet};
use crate::base::FileId;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smol_str::SmolStr;
use tracing::trace;

type FileSet = IndexSet<FileId, FxBuildHasher>;

/// One scope level: the names declared under a single namespace or delegate
/// package, plus the files contributing to it.
#[derive(Debug, Clone, Default)]
struct ScopeLevel {
    names: FxHashMap<SmolStr, EntrySet>,
    files: FileSet,
}

impl ScopeLevel {
    fn insert(&mut self, entry: CacheEntry) {
        self.names.entry(entry.name.clone()).or_default().insert(entry.clone());
        self.files.insert(entry.file);
    }

    /// Remove one entry; prunes the name leaf when it empties. The
    /// contributing-file mark is cleared only when no entry from that file
    /// remains anywhere in this level.
    fn remove(&mut self, entry: &CacheEntry) {
        if let Some(set) = self.names.get_mut(&entry.name) {
            set.shift_remove(entry);
            if set.is_empty() {
                self.names.remove(&entry.name);
            }
        }
        let still_contributes = self
            .names
            .values()
            .any(|set| set.iter().any(|e| e.file == entry.file));
        if !still_contributes {
            self.files.shift_remove(&entry.file);
        }
    }

    fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The full index for one project module. Created lazily on the first entry
/// and alive for the module's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    /// namespace → short name → entries (None = no namespace declared)
    namespaces: FxHashMap<Option<SmolStr>, ScopeLevel>,
    /// delegate package → deltemplate name → entries (None = default package)
    delegates: FxHashMap<Option<SmolStr>, ScopeLevel>,
    /// short name → entries, ignoring scope
    flat: FxHashMap<SmolStr, EntrySet>,
    /// alias declarations
    aliases: AliasCache,
    /// file → entries it contributed (the O(1) removal back-reference)
    file_entries: FxHashMap<FileId, Vec<CacheEntry>>,
    /// bumped on every mutation; retained snapshots compare against it
    revision: u64,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Atomically replace everything `file` contributes to this index.
    ///
    /// `entries` and `aliases` are the result of a fresh declaration scan;
    /// passing empties removes the file's contributions entirely (the shape
    /// used for deleted or no-longer-scannable files).
    pub fn replace_file(&mut self, file: FileId, entries: Vec<CacheEntry>, aliases: &[SmolStr]) {
        self.remove_file_entries(file);
        self.aliases.replace_file(file, aliases);
        if !entries.is_empty() {
            for entry in &entries {
                let map = if entry.delegate {
                    &mut self.delegates
                } else {
                    &mut self.namespaces
                };
                map.entry(entry.scope.clone()).or_default().insert(entry.clone());
                self.flat.entry(entry.name.clone()).or_default().insert(entry.clone());
            }
            self.file_entries.insert(file, entries);
        }
        self.revision += 1;
        trace!(file = %file, revision = self.revision, "index updated");
    }

    /// Remove all contributions of `file` and prune empty levels.
    pub fn remove_file(&mut self, file: FileId) {
        self.remove_file_entries(file);
        self.aliases.remove_file(file);
        self.revision += 1;
        trace!(file = %file, revision = self.revision, "file removed from index");
    }

    fn remove_file_entries(&mut self, file: FileId) {
        let Some(entries) = self.file_entries.remove(&file) else {
            return;
        };
        for entry in &entries {
            let map = if entry.delegate {
                &mut self.delegates
            } else {
                &mut self.namespaces
            };
            if let Some(level) = map.get_mut(&entry.scope) {
                level.remove(entry);
                if level.is_empty() {
                    map.remove(&entry.scope);
                }
            }
            if let Some(set) = self.flat.get_mut(&entry.name) {
                set.shift_remove(entry);
                if set.is_empty() {
                    self.flat.remove(&entry.name);
                }
            }
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// All entries declaring `name` under the scope key, from both the
    /// namespace and the delegate-package hierarchy. Duplicate declarations
    /// surface as a multi-element result.
    pub fn lookup(&self, scope: Option<&str>, name: &str) -> Vec<CacheEntry> {
        let key: Option<SmolStr> = scope.map(SmolStr::from);
        let mut out = Vec::new();
        for map in [&self.namespaces, &self.delegates] {
            if let Some(set) = map.get(&key).and_then(|level| level.names.get(name)) {
                out.extend(set.iter().cloned());
            }
        }
        out
    }

    /// Scope-agnostic lookup by short name.
    pub fn lookup_flat(&self, name: &str) -> Vec<CacheEntry> {
        self.flat
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Files that declare templates under `namespace`, in contribution order.
    pub fn files_declaring_namespace(&self, namespace: &str) -> Vec<FileId> {
        self.namespaces
            .get(&Some(SmolStr::from(namespace)))
            .map(|level| level.files.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Files that declare a deltemplate named `name`, in any package.
    pub fn files_declaring_delegate(&self, name: &str) -> Vec<FileId> {
        let mut files = FileSet::default();
        if let Some(set) = self.flat.get(name) {
            files.extend(set.iter().filter(|e| e.delegate).map(|e| e.file));
        }
        files.into_iter().collect()
    }

    /// Files declaring a template or deltemplate named `name`, any scope.
    pub fn files_with_name(&self, name: &str) -> Vec<FileId> {
        let mut files = FileSet::default();
        if let Some(set) = self.flat.get(name) {
            files.extend(set.iter().map(|e| e.file));
        }
        files.into_iter().collect()
    }

    /// Files containing an `{alias namespace}` declaration.
    pub fn files_aliasing(&self, namespace: &str) -> Vec<FileId> {
        self.aliases.files_aliasing(namespace)
    }

    /// Namespaces aliased by `file`.
    pub fn namespaces_aliased_by(&self, file: FileId) -> &[SmolStr] {
        self.aliases.namespaces_aliased_by(file)
    }

    /// Every entry currently in the index, sorted for stable comparison.
    pub fn all_entries(&self) -> Vec<CacheEntry> {
        let mut out: Vec<CacheEntry> = self
            .file_entries
            .values()
            .flat_map(|entries| entries.iter().cloned())
            .collect();
        out.sort();
        out
    }

    /// Mutation counter; increases monotonically within this cache.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.file_entries.is_empty() && self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(s: &str) -> Option<SmolStr> {
        Some(SmolStr::from(s))
    }

    fn entry(scope: &str, name: &str, file: u32) -> CacheEntry {
        CacheEntry::template(ns(scope), name, FileId::new(file))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1), entry("ns1", "bar", 1)], &[]);

        assert_eq!(cache.lookup(Some("ns1"), "foo"), vec![entry("ns1", "foo", 1)]);
        assert!(cache.lookup(Some("ns2"), "foo").is_empty());
        assert!(cache.lookup(Some("ns1"), "baz").is_empty());
        assert_eq!(cache.lookup_flat("bar"), vec![entry("ns1", "bar", 1)]);
        assert_eq!(cache.files_declaring_namespace("ns1"), vec![FileId::new(1)]);
    }

    #[test]
    fn test_duplicate_declarations_union() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &[]);
        cache.replace_file(FileId::new(2), vec![entry("ns1", "foo", 2)], &[]);

        assert_eq!(cache.lookup(Some("ns1"), "foo").len(), 2);
        assert_eq!(
            cache.files_declaring_namespace("ns1"),
            vec![FileId::new(1), FileId::new(2)]
        );
    }

    #[test]
    fn test_remove_restores_prior_state() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &[]);
        let before = cache.lookup(Some("ns1"), "foo");

        cache.replace_file(FileId::new(2), vec![entry("ns1", "foo", 2)], &[]);
        cache.remove_file(FileId::new(2));

        assert_eq!(cache.lookup(Some("ns1"), "foo"), before);
        assert_eq!(cache.files_declaring_namespace("ns1"), vec![FileId::new(1)]);
    }

    #[test]
    fn test_bottom_up_pruning() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &[]);
        cache.remove_file(FileId::new(1));

        assert!(cache.is_empty());
        assert!(cache.lookup(Some("ns1"), "foo").is_empty());
        assert!(cache.lookup_flat("foo").is_empty());
        assert!(cache.files_declaring_namespace("ns1").is_empty());
    }

    #[test]
    fn test_update_replaces_atomically() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &[]);
        cache.replace_file(FileId::new(1), vec![entry("ns2", "foo", 1)], &[]);

        // no stale entry from the earlier scan survives
        assert!(cache.lookup(Some("ns1"), "foo").is_empty());
        assert_eq!(cache.lookup(Some("ns2"), "foo"), vec![entry("ns2", "foo", 1)]);
        assert!(cache.files_declaring_namespace("ns1").is_empty());
        assert_eq!(cache.lookup_flat("foo").len(), 1);
    }

    #[test]
    fn test_idempotent_rescan() {
        let mut cache = ModuleCache::new();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &["a.b".into()]);
        let first = cache.all_entries();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &["a.b".into()]);

        assert_eq!(cache.all_entries(), first);
        assert_eq!(cache.lookup(Some("ns1"), "foo").len(), 1);
        assert_eq!(cache.files_aliasing("a.b"), vec![FileId::new(1)]);
    }

    #[test]
    fn test_flat_and_hierarchical_stay_consistent() {
        let mut cache = ModuleCache::new();
        cache.replace_file(
            FileId::new(1),
            vec![entry("ns1", "foo", 1), CacheEntry::deltemplate(ns("pkg"), "sys.foo", FileId::new(1))],
            &[],
        );
        cache.replace_file(FileId::new(2), vec![entry("ns2", "foo", 2)], &[]);

        // every scoped entry is visible in the flat index and vice versa
        for scoped in [cache.lookup(Some("ns1"), "foo"), cache.lookup(Some("ns2"), "foo")] {
            for entry in scoped {
                assert!(cache.lookup_flat(&entry.name).contains(&entry));
            }
        }
        for entry in cache.lookup_flat("foo") {
            assert!(cache.lookup(entry.scope.as_deref(), "foo").contains(&entry));
        }

        cache.remove_file(FileId::new(1));
        for entry in cache.lookup_flat("foo") {
            assert!(cache.lookup(entry.scope.as_deref(), "foo").contains(&entry));
        }
        assert!(cache.lookup_flat("sys.foo").is_empty());
    }

    #[test]
    fn test_delegate_lookup() {
        let mut cache = ModuleCache::new();
        cache.replace_file(
            FileId::new(1),
            vec![CacheEntry::deltemplate(ns("pkg"), "sys.widget", FileId::new(1))],
            &[],
        );
        cache.replace_file(
            FileId::new(2),
            vec![CacheEntry::deltemplate(None, "sys.widget", FileId::new(2))],
            &[],
        );

        assert_eq!(cache.lookup(Some("pkg"), "sys.widget").len(), 1);
        // default-package deltemplates live under the sentinel scope
        assert_eq!(cache.lookup(None, "sys.widget").len(), 1);
        assert_eq!(
            cache.files_declaring_delegate("sys.widget"),
            vec![FileId::new(1), FileId::new(2)]
        );
    }

    #[test]
    fn test_revision_increases() {
        let mut cache = ModuleCache::new();
        let r0 = cache.revision();
        cache.replace_file(FileId::new(1), vec![entry("ns1", "foo", 1)], &[]);
        let r1 = cache.revision();
        cache.remove_file(FileId::new(1));
        let r2 = cache.revision();
        assert!(r0 < r1 && r1 < r2);
    }
}
