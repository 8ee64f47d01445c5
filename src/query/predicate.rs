//! Node predicates: the boolean tests a path applies between hops.
//!
//! A predicate is a pure function over a single node, with no side effects
//! and no dependency on traversal history. Every predicate renders itself
//! for the navigation trace output.

use crate::parser::{ast, SyntaxKind, SyntaxNode};
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

/// A pure boolean test over one syntax node.
pub trait Predicate: fmt::Display + Send + Sync {
    fn test(&self, node: &SyntaxNode) -> bool;
}

impl<P: Predicate + ?Sized> Predicate for Arc<P> {
    fn test(&self, node: &SyntaxNode) -> bool {
        (**self).test(node)
    }
}

/// Matches every node.
#[derive(Debug, Clone, Copy)]
pub struct AnyNode;

impl Predicate for AnyNode {
    fn test(&self, _node: &SyntaxNode) -> bool {
        true
    }
}

impl fmt::Display for AnyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*")
    }
}

/// Matches no node.
#[derive(Debug, Clone, Copy)]
pub struct NoNode;

impl Predicate for NoNode {
    fn test(&self, _node: &SyntaxNode) -> bool {
        false
    }
}

impl fmt::Display for NoNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nil")
    }
}

/// Matches nodes whose kind is in a fixed set of type tags. The "any-of"
/// composite over grammar productions.
#[derive(Debug, Clone)]
pub struct KindPredicate {
    kinds: Box<[SyntaxKind]>,
}

impl Predicate for KindPredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        self.kinds.contains(&node.kind())
    }
}

impl fmt::Display for KindPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in &self.kinds {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            write!(f, "{kind:?}")?;
        }
        Ok(())
    }
}

/// Matches nodes whose full text equals a literal.
#[derive(Debug, Clone)]
pub struct TextPredicate {
    text: SmolStr,
}

impl Predicate for TextPredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        node.text() == self.text.as_str()
    }
}

impl fmt::Display for TextPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.text)
    }
}

/// Matches named elements by their simple name, using the [`ast::named_text`]
/// projection. Nodes without a name never match.
#[derive(Debug, Clone)]
pub struct NamePredicate {
    name: SmolStr,
}

impl Predicate for NamePredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        ast::named_text(node).is_some_and(|name| name == self.name)
    }
}

impl fmt::Display for NamePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name={}", self.name)
    }
}

/// Matches TEMPLATE_NAME / DELTEMPLATE_NAME nodes by fully qualified name.
///
/// A local `.foo` declaration is qualified against its file's namespace
/// before comparison, so the predicate stays correct even when the index
/// pointed at a file whose namespace has since changed.
#[derive(Debug, Clone)]
pub struct TemplateNamePredicate {
    qualified: SmolStr,
}

impl Predicate for TemplateNamePredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        if !matches!(
            node.kind(),
            SyntaxKind::TEMPLATE_NAME | SyntaxKind::DELTEMPLATE_NAME
        ) {
            return false;
        }
        ast::qualified_template_name(node).is_some_and(|name| name == self.qualified)
    }
}

impl fmt::Display for TemplateNamePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template={}", self.qualified)
    }
}

/// Matches tags carrying an attribute, optionally with a fixed value.
/// Applied to an ATTRIBUTE node it tests the node itself; applied to a tag
/// node it tests the tag's attributes.
#[derive(Debug, Clone)]
pub struct AttributePredicate {
    name: SmolStr,
    value: Option<SmolStr>,
}

impl Predicate for AttributePredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        let matches_attr = |attr: &ast::Attribute| {
            use ast::Named as _;
            attr.name().as_deref() == Some(self.name.as_str())
                && match &self.value {
                    Some(value) => attr.value().as_deref() == Some(value.as_str()),
                    None => true,
                }
        };
        if node.kind() == SyntaxKind::ATTRIBUTE {
            use ast::AstNode as _;
            return ast::Attribute::cast(node.clone()).is_some_and(|a| matches_attr(&a));
        }
        ast::attributes(node).any(|a| matches_attr(&a))
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}={}]", self.name, value),
            None => write!(f, "[{}]", self.name),
        }
    }
}

/// A named predicate over an arbitrary test function.
#[derive(Clone)]
pub struct FnPredicate {
    name: &'static str,
    f: Arc<dyn Fn(&SyntaxNode) -> bool + Send + Sync>,
}

impl Predicate for FnPredicate {
    fn test(&self, node: &SyntaxNode) -> bool {
        (self.f)(node)
    }
}

impl fmt::Display for FnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Inverts another predicate.
#[derive(Debug, Clone)]
pub struct NotPredicate<P>(P);

impl<P: Predicate> Predicate for NotPredicate<P> {
    fn test(&self, node: &SyntaxNode) -> bool {
        !self.0.test(node)
    }
}

impl<P: Predicate> fmt::Display for NotPredicate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not({})", self.0)
    }
}

// ============================================================================
// Constructors
// ============================================================================

pub fn any() -> AnyNode {
    AnyNode
}

pub fn none() -> NoNode {
    NoNode
}

pub fn kind_is(kind: SyntaxKind) -> KindPredicate {
    KindPredicate {
        kinds: Box::new([kind]),
    }
}

pub fn kind_in(kinds: &[SyntaxKind]) -> KindPredicate {
    KindPredicate {
        kinds: kinds.into(),
    }
}

pub fn text_eq(text: &str) -> TextPredicate {
    TextPredicate {
        text: SmolStr::from(text),
    }
}

pub fn name_eq(name: &str) -> NamePredicate {
    NamePredicate {
        name: SmolStr::from(name),
    }
}

pub fn template_name_eq(qualified: &str) -> TemplateNamePredicate {
    TemplateNamePredicate {
        qualified: SmolStr::from(qualified),
    }
}

pub fn has_attribute(name: &str) -> AttributePredicate {
    AttributePredicate {
        name: SmolStr::from(name),
        value: None,
    }
}

pub fn has_attribute_value(name: &str, value: &str) -> AttributePredicate {
    AttributePredicate {
        name: SmolStr::from(name),
        value: Some(SmolStr::from(value)),
    }
}

pub fn not<P: Predicate>(predicate: P) -> NotPredicate<P> {
    NotPredicate(predicate)
}

pub fn test_fn(
    name: &'static str,
    f: impl Fn(&SyntaxNode) -> bool + Send + Sync + 'static,
) -> FnPredicate {
    FnPredicate {
        name,
        f: Arc::new(f),
    }
}
