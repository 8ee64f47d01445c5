//! The traversal step that continues a query in other files.
//!
//! The step's only bridge between files is the symbol index: it asks the
//! origin module's cache which files could define the reference, resolves
//! each through the host's [`FileResolver`], and hands the returned roots
//! back to the path for the remaining steps. Every candidate is kept (an
//! ambiguous reference surfaces as a multi-element set) and a file that no
//! longer resolves simply contributes nothing.

use super::context::QueryContext;
use super::node_set::NodeSet;
use crate::base::FileId;
use smol_str::SmolStr;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone)]
enum CrossFileKind {
    /// Files declaring templates under a namespace.
    Namespace(SmolStr),
    /// Files declaring a deltemplate by full name, in any package.
    Delegate(SmolStr),
    /// Files declaring any template with a short name (flat-index lookup).
    FlatName(SmolStr),
    /// Files containing an `{alias ...}` of a namespace.
    Aliasing(SmolStr),
}

/// A compiled cross-file hop, created for a specific lookup key.
#[derive(Debug, Clone)]
pub struct CrossFileStep {
    kind: CrossFileKind,
}

impl CrossFileStep {
    pub fn files_declaring_namespace(namespace: &str) -> Self {
        Self {
            kind: CrossFileKind::Namespace(SmolStr::from(namespace)),
        }
    }

    pub fn files_declaring_delegate(name: &str) -> Self {
        Self {
            kind: CrossFileKind::Delegate(SmolStr::from(name)),
        }
    }

    pub fn files_with_template(name: &str) -> Self {
        Self {
            kind: CrossFileKind::FlatName(SmolStr::from(name)),
        }
    }

    pub fn files_aliasing(namespace: &str) -> Self {
        Self {
            kind: CrossFileKind::Aliasing(SmolStr::from(namespace)),
        }
    }

    pub(crate) fn resolve(&self, current: &NodeSet, ctx: &QueryContext<'_>) -> NodeSet {
        if current.is_empty() {
            return NodeSet::new();
        }
        let files: Vec<FileId> = {
            let guard = ctx.caches.read();
            let module = guard.module_of(ctx.origin);
            match guard.module(module) {
                None => Vec::new(),
                Some(cache) => match &self.kind {
                    CrossFileKind::Namespace(ns) => cache.files_declaring_namespace(ns),
                    CrossFileKind::Delegate(name) => cache.files_declaring_delegate(name),
                    CrossFileKind::FlatName(name) => cache.files_with_name(name),
                    CrossFileKind::Aliasing(ns) => cache.files_aliasing(ns),
                },
            }
        };
        let mut out = NodeSet::new();
        for file in &files {
            if let Some(root) = ctx.resolver.resolve_file(*file) {
                out.insert(root);
            }
        }
        trace!(candidates = files.len(), resolved = out.len(), "{self}");
        out
    }
}

impl fmt::Display for CrossFileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CrossFileKind::Namespace(ns) => write!(f, "files(namespace={ns})"),
            CrossFileKind::Delegate(name) => write!(f, "files(deltemplate={name})"),
            CrossFileKind::FlatName(name) => write!(f, "files(template={name})"),
            CrossFileKind::Aliasing(ns) => write!(f, "files(alias={ns})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{SourceAccess, SoyCacheManager};
    use crate::parser::{parse, SyntaxNode};
    use crate::query::context::FileResolver;
    use rustc_hash::FxHashMap;
    use smol_str::SmolStr;
    use std::sync::Arc;

    struct TextSource(FxHashMap<FileId, &'static str>);

    impl SourceAccess for TextSource {
        fn file_text(&self, file: FileId) -> Option<Arc<str>> {
            self.0.get(&file).map(|text| Arc::from(*text))
        }

        fn file_name(&self, file: FileId) -> Option<SmolStr> {
            self.0.get(&file).map(|_| SmolStr::from("x.soy"))
        }
    }

    /// Resolves only the files it was given trees for; everything else is
    /// "gone".
    struct PartialResolver(FxHashMap<FileId, SyntaxNode>);

    impl FileResolver for PartialResolver {
        fn resolve_file(&self, file: FileId) -> Option<SyntaxNode> {
            self.0.get(&file).cloned()
        }
    }

    const FILE: &str = "{namespace ns1}\n{template .foo}x{/template}\n";

    fn indexed_manager(files: &[(u32, &'static str)]) -> SoyCacheManager {
        let source = TextSource(files.iter().map(|&(id, text)| (FileId::new(id), text)).collect());
        let manager = SoyCacheManager::new();
        for &(id, _) in files {
            manager.update_cache(FileId::new(id), &source);
        }
        manager
    }

    #[test]
    fn test_unresolvable_file_contributes_nothing() {
        let manager = indexed_manager(&[(1, FILE)]);
        // index knows about file 1, but the resolver cannot produce it
        let resolver = PartialResolver(FxHashMap::default());
        let ctx = QueryContext::new(&resolver, &manager, FileId::new(1));

        let step = CrossFileStep::files_declaring_namespace("ns1");
        let start = NodeSet::singleton(parse(FILE).syntax());
        assert!(step.resolve(&start, &ctx).is_empty());
    }

    #[test]
    fn test_all_candidate_files_are_unioned() {
        let other = "{namespace ns1}\n{template .bar}y{/template}\n";
        let manager = indexed_manager(&[(1, FILE), (2, other)]);
        let mut trees = FxHashMap::default();
        trees.insert(FileId::new(1), parse(FILE).syntax());
        trees.insert(FileId::new(2), parse(other).syntax());
        let resolver = PartialResolver(trees);
        let ctx = QueryContext::new(&resolver, &manager, FileId::new(1));

        let step = CrossFileStep::files_declaring_namespace("ns1");
        let start = NodeSet::singleton(parse(FILE).syntax());
        assert_eq!(step.resolve(&start, &ctx).len(), 2);
    }

    #[test]
    fn test_empty_input_crosses_nowhere() {
        let manager = indexed_manager(&[(1, FILE)]);
        let mut trees = FxHashMap::default();
        trees.insert(FileId::new(1), parse(FILE).syntax());
        let resolver = PartialResolver(trees);
        let ctx = QueryContext::new(&resolver, &manager, FileId::new(1));

        let step = CrossFileStep::files_declaring_namespace("ns1");
        assert!(step.resolve(&NodeSet::new(), &ctx).is_empty());
    }
}
