//! Resolution of namespace references to their declaration name nodes,
//! and of alias-based namespace usages.

use crate::base::names;
use crate::parser::SyntaxKind;
use crate::query::predicate::{kind_is, name_eq};
use crate::query::{CrossFileStep, Path};

/// Path to the NAMESPACE_NAME declaration node(s) of `namespace`, across
/// files. Duplicate declarations surface as a multi-element set.
pub fn namespace_declaration(namespace: &str) -> Path {
    let namespace = namespace.trim();
    if !names::is_valid_namespace(namespace) {
        return Path::none();
    }
    Path::new()
        .debug_name("namespace-declaration")
        .cross_file(CrossFileStep::files_declaring_namespace(namespace))
        .on_children(kind_is(SyntaxKind::NAMESPACE_DECL))
        .on_children_of_children(kind_is(SyntaxKind::NAMESPACE_NAME))
        .filter(name_eq(namespace))
}

/// Path to every `{alias namespace ...}` site referencing `namespace`,
/// the alias-index consumer used by find-usages on a namespace.
pub fn namespace_alias_sites(namespace: &str) -> Path {
    let namespace = namespace.trim();
    if !names::is_valid_namespace(namespace) {
        return Path::none();
    }
    Path::new()
        .debug_name("namespace-alias-sites")
        .cross_file(CrossFileStep::files_aliasing(namespace))
        .on_children(kind_is(SyntaxKind::ALIAS_DECL))
        .on_children_of_children(kind_is(SyntaxKind::ALIAS_NAME))
        .filter(name_eq(namespace))
}
