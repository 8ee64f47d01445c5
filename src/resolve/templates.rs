//! Resolution of template calls to their definition name nodes.

use crate::base::names;
use crate::parser::ast::{self, AstNode, CallTag, SourceFile};
use crate::parser::{SyntaxKind, SyntaxNode};
use crate::query::predicate::{kind_in, kind_is, template_name_eq, test_fn};
use crate::query::{CrossFileStep, NodeSet, Path, QueryContext};
use smol_str::SmolStr;

/// Path to the TEMPLATE_NAME definition node(s) of a fully qualified
/// template, across files. A malformed name yields the empty path.
pub fn template_definition(qualified: &str) -> Path {
    let qualified = qualified.trim();
    if !names::is_valid_template_name(qualified) {
        return Path::none();
    }
    let Some((namespace, _)) = qualified.rsplit_once('.') else {
        return Path::none();
    };
    Path::new()
        .debug_name("template-definition")
        .cross_file(CrossFileStep::files_declaring_namespace(namespace))
        .on_descendants(1, 3, kind_is(SyntaxKind::TEMPLATE_TAG))
        .on_children_of_children(kind_is(SyntaxKind::TEMPLATE_NAME))
        .filter(template_name_eq(qualified))
}

/// Path to every template or deltemplate declaration with the given short
/// name, in any scope of the origin's module: the "jump to any template
/// named X" lookup over the flat index.
pub fn any_template_named(name: &str) -> Path {
    let name = name.trim();
    if name.is_empty() || !names::is_valid_namespace(name) {
        return Path::none();
    }
    let want = SmolStr::from(name);
    Path::new()
        .debug_name("any-template-named")
        .cross_file(CrossFileStep::files_with_template(name))
        .on_descendants(
            1,
            3,
            kind_in(&[SyntaxKind::TEMPLATE_TAG, SyntaxKind::DELTEMPLATE_TAG]),
        )
        .on_children_of_children(kind_in(&[
            SyntaxKind::TEMPLATE_NAME,
            SyntaxKind::DELTEMPLATE_NAME,
        ]))
        .filter(test_fn("short-name", move |node| {
            short_declared_name(node).as_deref() == Some(want.as_str())
        }))
}

/// How a declaration node appears in the flat index: templates by short
/// name, deltemplates by full name.
fn short_declared_name(node: &SyntaxNode) -> Option<SmolStr> {
    let text = ast::named_text(node)?;
    match node.kind() {
        SyntaxKind::TEMPLATE_NAME => Some(SmolStr::from(text.trim_start_matches('.'))),
        SyntaxKind::DELTEMPLATE_NAME => Some(text),
        _ => None,
    }
}

/// Resolve a call's target template to its definition name node(s).
///
/// Handles the three reference shapes: relative to the enclosing namespace
/// (`.foo`), through an alias (`os.foo` with `{alias other.space as os}`),
/// and absolute (`other.space.foo`). An aliased reading is preferred; the
/// absolute reading is the fallback. Multiple matching definitions come
/// back as a multi-element set.
pub fn resolve_call_target(call: &CallTag, ctx: &QueryContext<'_>) -> NodeSet {
    let Some(target) = call.target_text() else {
        return NodeSet::new();
    };
    call_target_path(call.syntax(), &target).navigate(call.syntax(), ctx)
}

/// The path [`resolve_call_target`] runs, exposed for composition.
pub fn call_target_path(site: &SyntaxNode, target: &str) -> Path {
    if let Some(local) = target.strip_prefix('.') {
        if !names::is_valid_local_template_name(target) {
            return Path::none();
        }
        let Some(namespace) = ast::enclosing_namespace(site) else {
            return Path::none();
        };
        return template_definition(&format!("{namespace}.{local}"))
            .debug_name("call-target");
    }
    let mut path = Path::none();
    if let Some(expanded) = expand_alias(site, target) {
        path = template_definition(&expanded);
    }
    path.or(template_definition(target)).debug_name("call-target")
}

/// Rewrite `alias.rest` to the aliased namespace, using the alias
/// declarations of the file containing `site`.
fn expand_alias(site: &SyntaxNode, target: &str) -> Option<SmolStr> {
    let (first, rest) = target.split_once('.')?;
    let root = site.ancestors().last()?;
    let file = SourceFile::cast(root)?;
    for alias in file.aliases() {
        if alias.effective_alias().as_deref() == Some(first) {
            let namespace = alias.namespace()?;
            return Some(SmolStr::from(format!("{namespace}.{rest}")));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_names_yield_empty_path() {
        for bad in ["", " ", "foo", ".foo", "ns.", ".ns.foo", "a..b"] {
            let path = template_definition(bad);
            // an empty path navigates to nothing; cheap structural check:
            // it must not panic and must be displayable
            let _ = format!("{path:?}");
        }
    }
}
