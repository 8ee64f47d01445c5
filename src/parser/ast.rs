//! Typed AST wrappers over the untyped rowan CST.
//!
//! Each wrapper is a thin view over a [`SyntaxNode`] of one kind, exposing
//! the projections the rest of the crate needs (names, attributes, doc
//! params). The grammar's original class-per-production hierarchy is
//! expressed here as kind tags plus capability projections: anything with a
//! name implements [`Named`], and the free functions at the bottom provide
//! the same projections over raw nodes for use inside query predicates.

use super::syntax_kind::SyntaxKind;
use super::SyntaxNode;
use smol_str::SmolStr;

/// Trait for AST nodes that wrap a SyntaxNode.
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

/// Capability: this node has a simple name.
pub trait Named: AstNode {
    fn name(&self) -> Option<SmolStr>;
}

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn child_of_kind(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    node.children().find(|n| n.kind() == kind)
}

fn node_text(node: &SyntaxNode) -> SmolStr {
    SmolStr::from(node.text().to_string())
}

// ============================================================================
// Root
// ============================================================================

ast_node!(SourceFile, SOY_FILE);

impl SourceFile {
    pub fn namespace(&self) -> Option<NamespaceDecl> {
        child_of_kind(&self.0, SyntaxKind::NAMESPACE_DECL).and_then(NamespaceDecl::cast)
    }

    pub fn namespace_name(&self) -> Option<SmolStr> {
        self.namespace().and_then(|decl| decl.name())
    }

    pub fn delpackage(&self) -> Option<DelpackageDecl> {
        child_of_kind(&self.0, SyntaxKind::DELPACKAGE_DECL).and_then(DelpackageDecl::cast)
    }

    pub fn delpackage_name(&self) -> Option<SmolStr> {
        self.delpackage().and_then(|decl| decl.name())
    }

    pub fn aliases(&self) -> impl Iterator<Item = AliasDecl> + '_ {
        self.0.children().filter_map(AliasDecl::cast)
    }

    pub fn templates(&self) -> impl Iterator<Item = TemplateDef> + '_ {
        self.0.children().filter_map(TemplateDef::cast)
    }

    pub fn deltemplates(&self) -> impl Iterator<Item = DeltemplateDef> + '_ {
        self.0.children().filter_map(DeltemplateDef::cast)
    }
}

// ============================================================================
// File-level declarations
// ============================================================================

ast_node!(NamespaceDecl, NAMESPACE_DECL);

impl Named for NamespaceDecl {
    fn name(&self) -> Option<SmolStr> {
        self.0
            .descendants()
            .find(|n| n.kind() == SyntaxKind::NAMESPACE_NAME)
            .map(|n| node_text(&n))
    }
}

ast_node!(DelpackageDecl, DELPACKAGE_DECL);

impl Named for DelpackageDecl {
    fn name(&self) -> Option<SmolStr> {
        self.0
            .descendants()
            .find(|n| n.kind() == SyntaxKind::DELPACKAGE_NAME)
            .map(|n| node_text(&n))
    }
}

ast_node!(AliasDecl, ALIAS_DECL);

impl AliasDecl {
    /// The aliased namespace, e.g. `long.other.space`.
    pub fn namespace(&self) -> Option<SmolStr> {
        self.0
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ALIAS_NAME)
            .map(|n| node_text(&n))
    }

    /// The identifier the namespace is usable under: the explicit `as` name
    /// when present, otherwise the last segment of the aliased namespace.
    pub fn effective_alias(&self) -> Option<SmolStr> {
        if let Some(ident) = self
            .0
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ALIAS_IDENT)
        {
            return Some(node_text(&ident));
        }
        let namespace = self.namespace()?;
        let last = namespace.rsplit('.').next()?;
        Some(SmolStr::from(last))
    }
}

// ============================================================================
// Templates
// ============================================================================

ast_node!(TemplateDef, TEMPLATE_DEF);

impl TemplateDef {
    pub fn doc(&self) -> Option<DocComment> {
        child_of_kind(&self.0, SyntaxKind::DOC_COMMENT).and_then(DocComment::cast)
    }

    pub fn name_node(&self) -> Option<SyntaxNode> {
        let tag = child_of_kind(&self.0, SyntaxKind::TEMPLATE_TAG)?;
        let body = child_of_kind(&tag, SyntaxKind::TAG_BODY)?;
        child_of_kind(&body, SyntaxKind::TEMPLATE_NAME)
    }

    /// The name exactly as written, e.g. `.foo`.
    pub fn name_text(&self) -> Option<SmolStr> {
        self.name_node().map(|n| node_text(&n))
    }

    /// Fully qualified name: the enclosing file's namespace joined with the
    /// local name. Absolute names are returned as written.
    pub fn qualified_name(&self) -> Option<SmolStr> {
        qualified_template_name(&self.name_node()?)
    }

    pub fn declared_param_names(&self) -> Vec<SmolStr> {
        self.doc()
            .map(|doc| doc.params().filter_map(|p| p.name()).collect())
            .unwrap_or_default()
    }
}

impl Named for TemplateDef {
    /// The short name without the leading dot, e.g. `foo`.
    fn name(&self) -> Option<SmolStr> {
        let text = self.name_text()?;
        Some(SmolStr::from(text.trim_start_matches('.')))
    }
}

ast_node!(DeltemplateDef, DELTEMPLATE_DEF);

impl DeltemplateDef {
    pub fn doc(&self) -> Option<DocComment> {
        child_of_kind(&self.0, SyntaxKind::DOC_COMMENT).and_then(DocComment::cast)
    }

    pub fn name_node(&self) -> Option<SyntaxNode> {
        let tag = child_of_kind(&self.0, SyntaxKind::DELTEMPLATE_TAG)?;
        let body = child_of_kind(&tag, SyntaxKind::TAG_BODY)?;
        child_of_kind(&body, SyntaxKind::DELTEMPLATE_NAME)
    }

    pub fn declared_param_names(&self) -> Vec<SmolStr> {
        self.doc()
            .map(|doc| doc.params().filter_map(|p| p.name()).collect())
            .unwrap_or_default()
    }
}

impl Named for DeltemplateDef {
    /// Deltemplate names are absolute, e.g. `a.b.foo`.
    fn name(&self) -> Option<SmolStr> {
        self.name_node().map(|n| node_text(&n))
    }
}

// ============================================================================
// Body commands
// ============================================================================

ast_node!(CallTag, CALL_TAG);

impl CallTag {
    pub fn target_node(&self) -> Option<SyntaxNode> {
        let body = child_of_kind(&self.0, SyntaxKind::TAG_BODY)?;
        child_of_kind(&body, SyntaxKind::CALL_NAME)
    }

    /// The call target as written: `.foo`, `ns.foo`, or `alias.foo`.
    pub fn target_text(&self) -> Option<SmolStr> {
        self.target_node().map(|n| node_text(&n))
    }

    pub fn params(&self) -> impl Iterator<Item = ParamTag> + '_ {
        self.0.children().filter_map(ParamTag::cast)
    }

    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        attributes(&self.0).find(|a| a.name().as_deref() == Some(name))
    }
}

ast_node!(DelcallTag, DELCALL_TAG);

impl DelcallTag {
    pub fn target_node(&self) -> Option<SyntaxNode> {
        let body = child_of_kind(&self.0, SyntaxKind::TAG_BODY)?;
        child_of_kind(&body, SyntaxKind::DELCALL_NAME)
    }

    pub fn target_text(&self) -> Option<SmolStr> {
        self.target_node().map(|n| node_text(&n))
    }

    pub fn params(&self) -> impl Iterator<Item = ParamTag> + '_ {
        self.0.children().filter_map(ParamTag::cast)
    }
}

ast_node!(ParamTag, PARAM_TAG);

impl Named for ParamTag {
    fn name(&self) -> Option<SmolStr> {
        let body = child_of_kind(&self.0, SyntaxKind::TAG_BODY)?;
        child_of_kind(&body, SyntaxKind::PARAM_NAME).map(|n| node_text(&n))
    }
}

ast_node!(Attribute, ATTRIBUTE);

impl Attribute {
    pub fn value(&self) -> Option<SmolStr> {
        let value = child_of_kind(&self.0, SyntaxKind::ATTRIBUTE_VALUE)?;
        let text = node_text(&value);
        let trimmed = text
            .trim_start_matches(['"', '\''])
            .trim_end_matches(['"', '\'']);
        Some(SmolStr::from(trimmed))
    }
}

impl Named for Attribute {
    fn name(&self) -> Option<SmolStr> {
        child_of_kind(&self.0, SyntaxKind::ATTRIBUTE_NAME).map(|n| node_text(&n))
    }
}

ast_node!(VarRef, VAR_REF);

impl Named for VarRef {
    /// The referenced variable without the `$` sigil.
    fn name(&self) -> Option<SmolStr> {
        let text = node_text(&self.0);
        text.strip_prefix('$').map(SmolStr::from)
    }
}

// ============================================================================
// Documentation
// ============================================================================

ast_node!(DocComment, DOC_COMMENT);

impl DocComment {
    pub fn params(&self) -> impl Iterator<Item = DocParam> + '_ {
        self.0.children().filter_map(DocParam::cast)
    }
}

ast_node!(DocParam, DOC_PARAM);

impl DocParam {
    /// True for `@param?` (optional parameter).
    pub fn is_optional(&self) -> bool {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| t.kind() == SyntaxKind::DOC_PARAM_KW && t.text().ends_with('?'))
    }
}

impl Named for DocParam {
    fn name(&self) -> Option<SmolStr> {
        child_of_kind(&self.0, SyntaxKind::DOC_PARAM_NAME).map(|n| node_text(&n))
    }
}

// ============================================================================
// Projections over raw nodes (used by query predicates)
// ============================================================================

/// Attributes of a tag node or of its TAG_BODY.
pub fn attributes(node: &SyntaxNode) -> impl Iterator<Item = Attribute> + 'static {
    let body = if node.kind() == SyntaxKind::TAG_BODY {
        Some(node.clone())
    } else {
        child_of_kind(node, SyntaxKind::TAG_BODY)
    };
    body.into_iter()
        .flat_map(|b| b.children().filter_map(Attribute::cast).collect::<Vec<_>>())
}

/// The simple name of a node, for any node kind that carries one.
///
/// Name nodes yield their own text; tags and defs yield the text of their
/// name node; attributes yield the attribute name.
pub fn named_text(node: &SyntaxNode) -> Option<SmolStr> {
    match node.kind() {
        kind if kind.is_name() => Some(node_text(node)),
        SyntaxKind::VAR_REF => VarRef::cast(node.clone()).and_then(|v| v.name()),
        SyntaxKind::NAMESPACE_DECL => NamespaceDecl::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::DELPACKAGE_DECL => DelpackageDecl::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::TEMPLATE_DEF => TemplateDef::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::DELTEMPLATE_DEF => DeltemplateDef::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::PARAM_TAG => ParamTag::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::DOC_PARAM => DocParam::cast(node.clone()).and_then(|n| n.name()),
        SyntaxKind::ATTRIBUTE => Attribute::cast(node.clone()).and_then(|n| n.name()),
        _ => None,
    }
}

/// The namespace declared by the file containing `node`.
pub fn enclosing_namespace(node: &SyntaxNode) -> Option<SmolStr> {
    let root = node.ancestors().last()?;
    SourceFile::cast(root)?.namespace_name()
}

/// The template definition enclosing `node`, if any.
pub fn enclosing_template(node: &SyntaxNode) -> Option<TemplateDef> {
    node.ancestors().find_map(TemplateDef::cast)
}

/// Fully qualified name for a TEMPLATE_NAME or DELTEMPLATE_NAME node.
///
/// A local name like `.foo` is qualified against the enclosing file's
/// namespace; an absolute name is returned as written. Returns None for a
/// local name in a file with no namespace declaration.
pub fn qualified_template_name(name_node: &SyntaxNode) -> Option<SmolStr> {
    let text = node_text(name_node);
    if let Some(local) = text.strip_prefix('.') {
        let namespace = enclosing_namespace(name_node)?;
        Some(SmolStr::from(format!("{namespace}.{local}")))
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn file(input: &str) -> SourceFile {
        SourceFile::cast(parse(input).syntax()).unwrap()
    }

    const EXAMPLE: &str = "\
{namespace ns.example}
{alias long.other.space as os}
{alias plain.words}

/** Greets a user. @param name @param? title */
{template .greet}
  Hello {$name}!
  {call .farewell data=\"all\"}
    {param name: $name /}
  {/call}
{/template}
";

    #[test]
    fn test_source_file_projections() {
        let file = file(EXAMPLE);
        assert_eq!(file.namespace_name().as_deref(), Some("ns.example"));
        assert!(file.delpackage().is_none());

        let aliases: Vec<_> = file.aliases().collect();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[0].namespace().as_deref(), Some("long.other.space"));
        assert_eq!(aliases[0].effective_alias().as_deref(), Some("os"));
        assert_eq!(aliases[1].effective_alias().as_deref(), Some("words"));
    }

    #[test]
    fn test_template_names() {
        let file = file(EXAMPLE);
        let template = file.templates().next().unwrap();
        assert_eq!(template.name_text().as_deref(), Some(".greet"));
        assert_eq!(template.name().as_deref(), Some("greet"));
        assert_eq!(template.qualified_name().as_deref(), Some("ns.example.greet"));
    }

    #[test]
    fn test_doc_params() {
        let file = file(EXAMPLE);
        let template = file.templates().next().unwrap();
        let params: Vec<_> = template.doc().unwrap().params().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name().as_deref(), Some("name"));
        assert!(!params[0].is_optional());
        assert_eq!(params[1].name().as_deref(), Some("title"));
        assert!(params[1].is_optional());
        assert_eq!(template.declared_param_names(), vec!["name", "title"]);
    }

    #[test]
    fn test_call_projections() {
        let file = file(EXAMPLE);
        let template = file.templates().next().unwrap();
        let call = template
            .syntax()
            .descendants()
            .find_map(CallTag::cast)
            .unwrap();
        assert_eq!(call.target_text().as_deref(), Some(".farewell"));
        let params: Vec<_> = call.params().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name().as_deref(), Some("name"));
        let attr = call.attribute("data").unwrap();
        assert_eq!(attr.value().as_deref(), Some("all"));
    }

    #[test]
    fn test_named_text_projection() {
        let file = file(EXAMPLE);
        let name_node = file.templates().next().unwrap().name_node().unwrap();
        assert_eq!(named_text(&name_node).as_deref(), Some(".greet"));
        assert_eq!(
            qualified_template_name(&name_node).as_deref(),
            Some("ns.example.greet")
        );
    }

    #[test]
    fn test_qualified_name_without_namespace() {
        let file = file("{template .orphan}x{/template}\n");
        let template = file.templates().next().unwrap();
        assert_eq!(template.qualified_name(), None);
    }

    #[test]
    fn test_deltemplate_names() {
        let file = file("{delpackage pkg}\n{namespace ns}\n/** @param x */\n{deltemplate sys.widget}y{/deltemplate}\n");
        assert_eq!(file.delpackage_name().as_deref(), Some("pkg"));
        let del = file.deltemplates().next().unwrap();
        assert_eq!(del.name().as_deref(), Some("sys.widget"));
        assert_eq!(del.declared_param_names(), vec!["x"]);
    }
}
