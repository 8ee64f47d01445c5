//! End-to-end resolution scenarios: calls, aliases, delegates, and
//! parameters resolved across files through the workspace index.

use soy_analysis::parser::ast::{AstNode, CallTag, DelcallTag, SourceFile, VarRef};
use soy_analysis::parser::{SyntaxKind, SyntaxNode};
use soy_analysis::project::Workspace;
use soy_analysis::resolve;

const FILE_A: &str = "\
{namespace ns1}

/** Greets a user. @param name @param? title */
{template .foo}
  Hello {$name}!
{/template}
";

const FILE_B: &str = "\
{namespace ns2}

{template .caller}
  {call ns1.foo}
    {param name: 'x' /}
  {/call}
{/template}
";

fn first_call(tree: &SyntaxNode) -> CallTag {
    tree.descendants().find_map(CallTag::cast).expect("no call in tree")
}

#[test]
fn call_resolves_to_definition_in_other_file() {
    let workspace = Workspace::new();
    let a = workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file("b.soy", FILE_B);

    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let result = resolve::resolve_call_target(&first_call(&tree_b), &ctx);

    let node = result.single().expect("exactly one definition");
    assert_eq!(node.kind(), SyntaxKind::TEMPLATE_NAME);
    assert_eq!(node.text().to_string(), ".foo");
    assert_eq!(node.ancestors().last(), workspace.tree(a));
}

#[test]
fn deleting_the_defining_file_unresolves_the_call() {
    let workspace = Workspace::new();
    let a = workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file("b.soy", FILE_B);

    assert!(workspace.remove_file(a));

    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let result = resolve::resolve_call_target(&first_call(&tree_b), &ctx);
    assert!(result.is_empty(), "unresolved is an empty set, not an error");
}

#[test]
fn duplicate_definitions_surface_as_ambiguity() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    workspace.add_file("dup.soy", "{namespace ns1}\n{template .foo}dup{/template}\n");
    let b = workspace.add_file("b.soy", FILE_B);

    let guard = workspace.caches().read();
    let module = guard.module_of(b);
    let entries = guard.module(module).unwrap().lookup(Some("ns1"), "foo");
    assert_eq!(entries.len(), 2, "index reports both declarations");
    drop(guard);

    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let result = resolve::resolve_call_target(&first_call(&tree_b), &ctx);
    assert_eq!(result.len(), 2, "resolution must not silently pick one");
}

#[test]
fn relative_call_resolves_within_the_namespace() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    let c = workspace.add_file(
        "c.soy",
        "{namespace ns1}\n{template .other}{call .foo /}{/template}\n",
    );

    let tree_c = workspace.tree(c).unwrap();
    let ctx = workspace.query_context(c);
    let result = resolve::resolve_call_target(&first_call(&tree_c), &ctx);
    assert_eq!(result.len(), 1);
    assert_eq!(result.single().unwrap().text().to_string(), ".foo");
}

#[test]
fn aliased_call_resolves_through_the_alias() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file(
        "aliased.soy",
        "{namespace ns3}\n{alias ns1 as n}\n{template .caller}{call n.foo /}{/template}\n",
    );

    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let result = resolve::resolve_call_target(&first_call(&tree_b), &ctx);
    assert_eq!(result.len(), 1);
    assert_eq!(result.single().unwrap().text().to_string(), ".foo");
}

#[test]
fn namespace_reference_resolves_to_declaration() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file("b.soy", FILE_B);

    let ctx = workspace.query_context(b);
    let start = workspace.tree(b).unwrap();
    let result = resolve::namespace_declaration("ns1").navigate(&start, &ctx);
    assert_eq!(result.len(), 1);
    assert_eq!(result.single().unwrap().kind(), SyntaxKind::NAMESPACE_NAME);
    assert_eq!(result.single().unwrap().text().to_string(), "ns1");
}

#[test]
fn alias_sites_are_found_through_the_alias_index() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file(
        "aliased.soy",
        "{namespace ns3}\n{alias ns1 as n}\n{template .caller}{call n.foo /}{/template}\n",
    );

    let ctx = workspace.query_context(b);
    let start = workspace.tree(b).unwrap();
    let sites = resolve::namespace_alias_sites("ns1").navigate(&start, &ctx);
    assert_eq!(sites.len(), 1);
    assert_eq!(sites.single().unwrap().kind(), SyntaxKind::ALIAS_NAME);

    let guard = workspace.caches().read();
    let cache = guard.module(guard.module_of(b)).unwrap();
    assert_eq!(cache.files_aliasing("ns1"), vec![b]);
    let aliased: Vec<&str> = cache
        .namespaces_aliased_by(b)
        .iter()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(aliased, vec!["ns1"]);
}

#[test]
fn delcall_resolves_across_packages() {
    let workspace = Workspace::new();
    workspace.add_file(
        "impl_a.soy",
        "{delpackage alpha}\n{namespace da}\n{deltemplate sys.widget}A{/deltemplate}\n",
    );
    workspace.add_file(
        "impl_b.soy",
        "{delpackage beta}\n{namespace db}\n{deltemplate sys.widget}B{/deltemplate}\n",
    );
    let caller = workspace.add_file(
        "caller.soy",
        "{namespace nc}\n{template .go}{delcall sys.widget /}{/template}\n",
    );

    let tree = workspace.tree(caller).unwrap();
    let delcall = tree.descendants().find_map(DelcallTag::cast).unwrap();
    let ctx = workspace.query_context(caller);

    let all = resolve::resolve_delcall_target(&delcall, &ctx);
    assert_eq!(all.len(), 2, "both package implementations are candidates");

    let only_beta = resolve::deltemplate_in_package("beta", "sys.widget").navigate(&tree, &ctx);
    assert_eq!(only_beta.len(), 1);
    assert_eq!(only_beta.single().unwrap().text().to_string(), "sys.widget");
}

#[test]
fn call_params_join_against_target_declarations() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    let b = workspace.add_file(
        "b.soy",
        "{namespace ns2}\n{template .caller}\n{call ns1.foo}\n{param name: 1 /}\n{param bogus: 2 /}\n{/call}\n{/template}\n",
    );

    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let call = first_call(&tree_b);

    let declared = resolve::call_params_declared_by_target().navigate(call.syntax(), &ctx);
    assert_eq!(declared.len(), 1, "only params the target declares survive the join");
    let name = soy_analysis::parser::ast::named_text(declared.single().unwrap());
    assert_eq!(name.as_deref(), Some("name"));
}

#[test]
fn var_ref_resolves_to_doc_param() {
    let workspace = Workspace::new();
    let a = workspace.add_file("a.soy", FILE_A);

    let tree = workspace.tree(a).unwrap();
    let var = tree.descendants().find_map(VarRef::cast).unwrap();
    let ctx = workspace.query_context(a);

    let decl = resolve::resolve_var_ref(&var, &ctx);
    assert_eq!(decl.len(), 1);
    assert_eq!(decl.single().unwrap().kind(), SyntaxKind::DOC_PARAM_NAME);
    assert_eq!(decl.single().unwrap().text().to_string(), "name");
}

#[test]
fn flat_lookup_jumps_to_any_template_named() {
    let workspace = Workspace::new();
    workspace.add_file("a.soy", FILE_A);
    workspace.add_file("other.soy", "{namespace zz}\n{template .foo}z{/template}\n");
    let b = workspace.add_file("b.soy", FILE_B);

    let ctx = workspace.query_context(b);
    let start = workspace.tree(b).unwrap();
    let result = resolve::any_template_named("foo").navigate(&start, &ctx);
    assert_eq!(result.len(), 2, "short-name lookup unions all scopes");
}

#[test]
fn param_usages_in_template_body() {
    let workspace = Workspace::new();
    let a = workspace.add_file("a.soy", FILE_A);

    let tree = workspace.tree(a).unwrap();
    let file = SourceFile::cast(tree).unwrap();
    let template = file.templates().next().unwrap();
    let ctx = workspace.query_context(a);

    let uses = resolve::param_usages(&template, "name", &ctx);
    assert_eq!(uses.len(), 1);
    assert_eq!(uses.single().unwrap().text().to_string(), "$name");

    assert!(resolve::param_usages(&template, "title", &ctx).is_empty());
}

#[test]
fn modules_do_not_leak_into_each_other() {
    use soy_analysis::cache::ModuleId;

    let workspace = Workspace::new();
    workspace.add_file_in_module("a.soy", FILE_A, ModuleId(1));
    let b = workspace.add_file_in_module("b.soy", FILE_B, ModuleId(2));

    // the caller's module has no definition of ns1.foo
    let tree_b = workspace.tree(b).unwrap();
    let ctx = workspace.query_context(b);
    let result = resolve::resolve_call_target(&first_call(&tree_b), &ctx);
    assert!(result.is_empty());
}
