//! Resolution of template parameters: call-site `{param}` tags against the
//! target template's declared `@param`s, and `$ref` uses against the
//! enclosing template's declarations.

use super::templates::resolve_call_target;
use crate::parser::ast::{self, AstNode, CallTag, Named as _, ParamTag, TemplateDef, VarRef};
use crate::parser::SyntaxKind;
use crate::query::predicate::{kind_in, kind_is, name_eq};
use crate::query::{Join, NodeSet, Path, QueryContext};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Path from a template (or deltemplate) definition to its declared
/// DOC_PARAM_NAME nodes.
pub fn declared_params() -> Path {
    Path::new()
        .debug_name("declared-params")
        .on_children(kind_is(SyntaxKind::DOC_COMMENT))
        .on_children(kind_is(SyntaxKind::DOC_PARAM))
        .on_children(kind_is(SyntaxKind::DOC_PARAM_NAME))
}

/// Path from a CALL_TAG to the subset of its `{param}` tags that the
/// call's target template actually declares.
///
/// The call is captured before stepping down to its params; the join then
/// resolves each captured call's target (a cross-file hop through the
/// index) and keeps the params whose name appears among the target's
/// declared parameters.
pub fn call_params_declared_by_target() -> Path {
    let declared_by_target = Join::new(
        "declared-by-target",
        |current: NodeSet, popped: NodeSet, ctx: &QueryContext<'_>| {
            let mut declared: FxHashSet<SmolStr> = FxHashSet::default();
            for node in popped.iter() {
                let Some(call) = CallTag::cast(node.clone()) else {
                    continue;
                };
                for name_node in resolve_call_target(&call, ctx).iter() {
                    if let Some(def) = ast::enclosing_template(name_node) {
                        declared.extend(def.declared_param_names());
                    }
                }
            }
            current.filter(|param| {
                ParamTag::cast(param.clone())
                    .and_then(|p| p.name())
                    .is_some_and(|name| declared.contains(&name))
            })
        },
    );
    Path::new()
        .debug_name("call-params-declared-by-target")
        .push()
        .on_children(kind_is(SyntaxKind::PARAM_TAG))
        .pop_and_join(declared_by_target)
}

/// Resolve a `$ref` use to the `@param` declaration of the enclosing
/// template, if the template declares it.
pub fn resolve_var_ref(var: &VarRef, ctx: &QueryContext<'_>) -> NodeSet {
    let Some(name) = var.name() else {
        return NodeSet::new();
    };
    Path::new()
        .debug_name("param-for-ref")
        .on_first_ancestor(kind_in(&[
            SyntaxKind::TEMPLATE_DEF,
            SyntaxKind::DELTEMPLATE_DEF,
        ]))
        .append(declared_params())
        .filter(name_eq(&name))
        .navigate(var.syntax(), ctx)
}

/// Every `$ref` in a template body that uses `param_name`: the local leg
/// of find-usages for a parameter declaration.
pub fn param_usages(template: &TemplateDef, param_name: &str, ctx: &QueryContext<'_>) -> NodeSet {
    Path::new()
        .debug_name("param-usages")
        .on_all_descendants(kind_is(SyntaxKind::VAR_REF))
        .filter(name_eq(param_name))
        .navigate(template.syntax(), ctx)
}

/// Convenience projection for consumers: the declared parameter names of
/// whatever definition nodes a resolution produced.
pub fn declared_names_of(definitions: &NodeSet) -> Vec<SmolStr> {
    let mut names = Vec::new();
    for node in definitions.iter() {
        if let Some(def) = ast::enclosing_template(node) {
            for name in def.declared_param_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        } else if let Some(def) = node.ancestors().find_map(ast::DeltemplateDef::cast) {
            for name in def.declared_param_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}
