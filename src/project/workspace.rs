//! In-memory workspace: the stand-in for the host's file, module, and
//! document services.
//!
//! Owns file text and lazily parsed trees, assigns files to modules, and
//! feeds every add/update/remove straight into the index updater so the
//! symbol index never waits for a reparse. Implements the collaborator
//! seams the rest of the crate consumes: [`FileResolver`] for the query
//! engine's cross-file step, [`SourceAccess`] and [`FileEnumeration`] for
//! the updater.

use crate::base::{FileId, LineCol, LineIndex, TextSize};
use crate::cache::{FileEnumeration, ModuleId, SourceAccess, SoyCacheManager};
use crate::parser::{parse, GreenNode, SyntaxError, SyntaxNode};
use crate::query::{FileResolver, QueryContext};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct FileState {
    name: SmolStr,
    text: Arc<str>,
    version: u32,
    /// Parsed on first access, invalidated on every text change.
    parsed: Option<(GreenNode, Arc<[SyntaxError]>)>,
}

#[derive(Default)]
struct WorkspaceInner {
    files: FxHashMap<FileId, FileState>,
    by_name: FxHashMap<SmolStr, FileId>,
    next_id: u32,
}

/// A set of Soy files with a shared symbol index.
#[derive(Default)]
pub struct Workspace {
    inner: RwLock<WorkspaceInner>,
    caches: SoyCacheManager,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// The symbol index maintained for this workspace.
    pub fn caches(&self) -> &SoyCacheManager {
        &self.caches
    }

    // ========================================================================
    // File management
    // ========================================================================

    /// Add a file in the default module. Adding a name that already exists
    /// updates that file instead.
    pub fn add_file(&self, name: &str, text: &str) -> FileId {
        self.add_file_in_module(name, text, ModuleId::DEFAULT)
    }

    pub fn add_file_in_module(&self, name: &str, text: &str, module: ModuleId) -> FileId {
        if let Some(existing) = self.file_id(name) {
            self.update_file(existing, text);
            return existing;
        }
        let file = {
            let mut inner = self.inner.write();
            let file = FileId::new(inner.next_id);
            inner.next_id += 1;
            inner.files.insert(
                file,
                FileState {
                    name: SmolStr::from(name),
                    text: Arc::from(text),
                    version: 0,
                    parsed: None,
                },
            );
            inner.by_name.insert(SmolStr::from(name), file);
            file
        };
        debug!(%file, name, ?module, "file added");
        self.caches.assign_module(file, module);
        self.caches.update_cache(file, self);
        file
    }

    /// Replace a file's text (document sync). Invalidates the parse and
    /// rescans the file for the index. Returns false for unknown files.
    pub fn update_file(&self, file: FileId, text: &str) -> bool {
        {
            let mut inner = self.inner.write();
            let Some(state) = inner.files.get_mut(&file) else {
                return false;
            };
            state.text = Arc::from(text);
            state.version += 1;
            state.parsed = None;
        }
        debug!(%file, "file updated");
        self.caches.update_cache(file, self);
        true
    }

    /// Remove a file and its index contributions. Returns false for unknown
    /// files.
    pub fn remove_file(&self, file: FileId) -> bool {
        let existed = {
            let mut inner = self.inner.write();
            match inner.files.remove(&file) {
                Some(state) => {
                    inner.by_name.remove(&state.name);
                    true
                }
                None => false,
            }
        };
        if existed {
            debug!(%file, "file removed");
            self.caches.remove_from_cache(file);
        }
        existed
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn file_id(&self, name: &str) -> Option<FileId> {
        self.inner.read().by_name.get(name).copied()
    }

    pub fn file_count(&self) -> usize {
        self.inner.read().files.len()
    }

    pub fn text(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().files.get(&file).map(|s| Arc::clone(&s.text))
    }

    pub fn version(&self, file: FileId) -> Option<u32> {
        self.inner.read().files.get(&file).map(|s| s.version)
    }

    /// The file's current syntax tree, parsing on first access. Parse
    /// errors do not make a file unresolvable; the recovered tree is
    /// returned and the errors are available through [`Workspace::errors`].
    pub fn tree(&self, file: FileId) -> Option<SyntaxNode> {
        self.ensure_parsed(file)
            .map(|(green, _)| SyntaxNode::new_root(green))
    }

    pub fn errors(&self, file: FileId) -> Option<Arc<[SyntaxError]>> {
        self.ensure_parsed(file).map(|(_, errors)| errors)
    }

    /// Convert a byte offset in `file` to a line/column position.
    pub fn line_col(&self, file: FileId, offset: TextSize) -> Option<LineCol> {
        let text = self.text(file)?;
        Some(LineIndex::new(&text).line_col(offset))
    }

    fn ensure_parsed(&self, file: FileId) -> Option<(GreenNode, Arc<[SyntaxError]>)> {
        {
            let inner = self.inner.read();
            let state = inner.files.get(&file)?;
            if let Some((green, errors)) = &state.parsed {
                return Some((green.clone(), Arc::clone(errors)));
            }
        }
        let mut inner = self.inner.write();
        let state = inner.files.get_mut(&file)?;
        if state.parsed.is_none() {
            let parse = parse(&state.text);
            state.parsed = Some((parse.green, parse.errors.into()));
        }
        state
            .parsed
            .as_ref()
            .map(|(green, errors)| (green.clone(), Arc::clone(errors)))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// An evaluation context for queries that start in `origin`.
    pub fn query_context(&self, origin: FileId) -> QueryContext<'_> {
        QueryContext::new(self, &self.caches, origin)
    }
}

impl FileResolver for Workspace {
    fn resolve_file(&self, file: FileId) -> Option<SyntaxNode> {
        self.tree(file)
    }
}

impl SourceAccess for Workspace {
    fn file_text(&self, file: FileId) -> Option<Arc<str>> {
        self.text(file)
    }

    fn file_name(&self, file: FileId) -> Option<SmolStr> {
        self.inner.read().files.get(&file).map(|s| s.name.clone())
    }
}

impl FileEnumeration for Workspace {
    fn files_with_extension(&self, ext: &str) -> Vec<FileId> {
        let inner = self.inner.read();
        let mut files: Vec<FileId> = inner
            .files
            .iter()
            .filter(|(_, state)| state.name.rsplit('.').next() == Some(ext))
            .map(|(&file, _)| file)
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SyntaxKind;

    const FILE_A: &str = "{namespace ns1}\n{template .foo}x{/template}\n";

    #[test]
    fn test_add_and_lookup() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", FILE_A);
        assert_eq!(workspace.file_id("a.soy"), Some(file));
        assert_eq!(workspace.version(file), Some(0));
        assert_eq!(workspace.text(file).as_deref(), Some(FILE_A));

        let guard = workspace.caches().read();
        let cache = guard.module(ModuleId::DEFAULT).unwrap();
        assert_eq!(cache.lookup(Some("ns1"), "foo").len(), 1);
    }

    #[test]
    fn test_tree_is_cached_and_stable() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", FILE_A);
        let a = workspace.tree(file).unwrap();
        let b = workspace.tree(file).unwrap();
        // same green tree → identical nodes
        assert_eq!(a, b);
        assert_eq!(a.kind(), SyntaxKind::SOY_FILE);
    }

    #[test]
    fn test_update_invalidates_parse_and_index() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", FILE_A);
        let old_tree = workspace.tree(file).unwrap();

        assert!(workspace.update_file(file, "{namespace ns2}\n{template .bar}y{/template}\n"));
        assert_eq!(workspace.version(file), Some(1));
        let new_tree = workspace.tree(file).unwrap();
        assert_ne!(old_tree, new_tree);

        let guard = workspace.caches().read();
        let cache = guard.module(ModuleId::DEFAULT).unwrap();
        assert!(cache.lookup(Some("ns1"), "foo").is_empty());
        assert_eq!(cache.lookup(Some("ns2"), "bar").len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", FILE_A);
        assert!(workspace.remove_file(file));
        assert!(!workspace.remove_file(file));
        assert_eq!(workspace.file_id("a.soy"), None);
        assert!(workspace.tree(file).is_none());

        let guard = workspace.caches().read();
        let cache = guard.module(ModuleId::DEFAULT).unwrap();
        assert!(cache.lookup(Some("ns1"), "foo").is_empty());
    }

    #[test]
    fn test_add_existing_name_updates() {
        let workspace = Workspace::new();
        let first = workspace.add_file("a.soy", FILE_A);
        let second = workspace.add_file("a.soy", "{namespace ns9}\n");
        assert_eq!(first, second);
        assert_eq!(workspace.version(first), Some(1));
        assert_eq!(workspace.file_count(), 1);
    }

    #[test]
    fn test_errors_are_kept_but_tree_resolves() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", "{namespace ns1}\n{template .foo}\nno end");
        assert!(!workspace.errors(file).unwrap().is_empty());
        assert!(workspace.tree(file).is_some());
    }

    #[test]
    fn test_line_col() {
        let workspace = Workspace::new();
        let file = workspace.add_file("a.soy", FILE_A);
        assert_eq!(
            workspace.line_col(file, TextSize::new(16)),
            Some(LineCol::new(1, 0))
        );
    }

    #[test]
    fn test_files_with_extension() {
        let workspace = Workspace::new();
        let a = workspace.add_file("a.soy", FILE_A);
        workspace.add_file("notes.txt", "not soy");
        let b = workspace.add_file("b.soy", "{namespace ns2}\n");
        assert_eq!(workspace.files_with_extension("soy"), vec![a, b]);
    }
}
