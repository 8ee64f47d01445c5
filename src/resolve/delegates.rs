//! Resolution of deltemplate references, with and without a delegate
//! package constraint.

use crate::base::names;
use crate::parser::ast::{AstNode, DelcallTag};
use crate::parser::SyntaxKind;
use crate::query::predicate::{kind_is, name_eq};
use crate::query::{CrossFileStep, Join, NodeSet, Path, QueryContext};

/// Path to the DELTEMPLATE_NAME definition node(s) of `name`, in any
/// delegate package of the origin's module. Implementations in several
/// packages come back as a multi-element set for the caller's policy.
pub fn deltemplate_definition(name: &str) -> Path {
    let name = name.trim();
    if !names::is_valid_namespace(name) {
        return Path::none();
    }
    Path::new()
        .debug_name("deltemplate-definition")
        .cross_file(CrossFileStep::files_declaring_delegate(name))
        .on_descendants(1, 3, kind_is(SyntaxKind::DELTEMPLATE_TAG))
        .on_children_of_children(kind_is(SyntaxKind::DELTEMPLATE_NAME))
        .filter(name_eq(name))
}

/// Path to the definition of `name` within delegate package `package`
/// only.
///
/// The candidate file roots are captured before detouring into the
/// package declaration; the join then keeps exactly the captured roots
/// whose file declared the wanted package, and the walk to the deltemplate
/// continues from those.
pub fn deltemplate_in_package(package: &str, name: &str) -> Path {
    let (package, name) = (package.trim(), name.trim());
    if !names::is_valid_identifier(package) || !names::is_valid_namespace(name) {
        return Path::none();
    }
    let same_file = Join::new(
        "roots-with-package",
        |current: NodeSet, popped: NodeSet, _ctx: &QueryContext<'_>| {
            let matched_roots: NodeSet = current
                .iter()
                .filter_map(|node| node.ancestors().last())
                .collect();
            popped.filter(|root| matched_roots.contains(root))
        },
    );
    Path::new()
        .debug_name("deltemplate-in-package")
        .cross_file(CrossFileStep::files_declaring_delegate(name))
        .push()
        .on_children(kind_is(SyntaxKind::DELPACKAGE_DECL))
        .on_children_of_children(kind_is(SyntaxKind::DELPACKAGE_NAME))
        .filter(name_eq(package))
        .pop_and_join(same_file)
        .on_descendants(1, 3, kind_is(SyntaxKind::DELTEMPLATE_TAG))
        .on_children_of_children(kind_is(SyntaxKind::DELTEMPLATE_NAME))
        .filter(name_eq(name))
}

/// Resolve a `{delcall ...}` to the matching deltemplate definitions.
pub fn resolve_delcall_target(delcall: &DelcallTag, ctx: &QueryContext<'_>) -> NodeSet {
    let Some(target) = delcall.target_text() else {
        return NodeSet::new();
    };
    deltemplate_definition(&target).navigate(delcall.syntax(), ctx)
}
