//! Primitive structural hops over the syntax tree.
//!
//! Each traversal maps one node to the nodes reachable by a fixed relation
//! (children, ancestors, siblings, descendants), optionally filtered by a
//! predicate. Traversals never mutate the tree, and traversing from nothing
//! produces nothing.

use super::node_set::NodeSet;
use super::predicate::Predicate;
use crate::parser::SyntaxNode;
use rowan::Direction;
use std::fmt;
use std::sync::Arc;

/// One structural hop. Implementations emit, in document order, every node
/// reachable from `node` that passes their filter.
pub trait Traversal: fmt::Display + Send + Sync {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet);
}

type Filter = Option<Arc<dyn Predicate>>;

fn admits(filter: &Filter, node: &SyntaxNode) -> bool {
    match filter {
        Some(predicate) => predicate.test(node),
        None => true,
    }
}

fn fmt_filter(f: &mut fmt::Formatter<'_>, filter: &Filter) -> fmt::Result {
    if let Some(predicate) = filter {
        write!(f, "[{predicate}]")?;
    }
    Ok(())
}

/// Direct children.
pub struct Children {
    pub(crate) filter: Filter,
}

impl Traversal for Children {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        out.extend(node.children().filter(|n| admits(&self.filter, n)));
    }
}

impl fmt::Display for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/children")?;
        fmt_filter(f, &self.filter)
    }
}

/// Children of children, as a single two-hop step.
pub struct ChildrenOfChildren {
    pub(crate) filter: Filter,
}

impl Traversal for ChildrenOfChildren {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        for child in node.children() {
            out.extend(child.children().filter(|n| admits(&self.filter, n)));
        }
    }
}

impl fmt::Display for ChildrenOfChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/children/children")?;
        fmt_filter(f, &self.filter)
    }
}

/// The direct parent, if any.
pub struct Parent;

impl Traversal for Parent {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        out.extend(node.parent());
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/parent")
    }
}

/// Walk ancestors outward, stopping at the first match. A node with no
/// matching ancestor contributes nothing.
pub struct FirstAncestor {
    pub(crate) filter: Filter,
}

impl Traversal for FirstAncestor {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        out.extend(
            node.ancestors()
                .skip(1)
                .find(|n| admits(&self.filter, n)),
        );
    }
}

impl fmt::Display for FirstAncestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/ancestor")?;
        fmt_filter(f, &self.filter)
    }
}

/// The immediately following sibling node, filtered.
pub struct NextSibling {
    pub(crate) filter: Filter,
}

impl Traversal for NextSibling {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        out.extend(node.next_sibling().filter(|n| admits(&self.filter, n)));
    }
}

impl fmt::Display for NextSibling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/next")?;
        fmt_filter(f, &self.filter)
    }
}

/// The whole run of following siblings, nearest first.
pub struct NextSiblings {
    pub(crate) include_self: bool,
    pub(crate) filter: Filter,
}

impl Traversal for NextSiblings {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        let skip = usize::from(!self.include_self);
        out.extend(
            node.siblings(Direction::Next)
                .skip(skip)
                .filter(|n| admits(&self.filter, n)),
        );
    }
}

impl fmt::Display for NextSiblings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/next*")?;
        fmt_filter(f, &self.filter)
    }
}

/// The whole run of preceding siblings, nearest first.
pub struct PreviousSiblings {
    pub(crate) include_self: bool,
    pub(crate) filter: Filter,
}

impl Traversal for PreviousSiblings {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        let skip = usize::from(!self.include_self);
        out.extend(
            node.siblings(Direction::Prev)
                .skip(skip)
                .filter(|n| admits(&self.filter, n)),
        );
    }
}

impl fmt::Display for PreviousSiblings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/prev*")?;
        fmt_filter(f, &self.filter)
    }
}

/// Unbounded depth-first walk of the subtree, excluding the node itself.
pub struct AllDescendants {
    pub(crate) filter: Filter,
}

impl Traversal for AllDescendants {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        out.extend(
            node.descendants()
                .skip(1)
                .filter(|n| admits(&self.filter, n)),
        );
    }
}

impl fmt::Display for AllDescendants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/descendants")?;
        fmt_filter(f, &self.filter)
    }
}

/// Depth-bounded descendants: every node whose depth below the input node
/// lies in the inclusive range `min..=max` (children are depth 1).
pub struct Descendants {
    pub(crate) min_depth: u32,
    pub(crate) max_depth: u32,
    pub(crate) filter: Filter,
}

impl Traversal for Descendants {
    fn traverse_node(&self, node: &SyntaxNode, out: &mut NodeSet) {
        self.walk(node, 1, out);
    }
}

impl Descendants {
    fn walk(&self, node: &SyntaxNode, depth: u32, out: &mut NodeSet) {
        for child in node.children() {
            if depth >= self.min_depth && depth <= self.max_depth && admits(&self.filter, &child) {
                out.insert(child.clone());
            }
            if depth < self.max_depth {
                self.walk(&child, depth + 1, out);
            }
        }
    }
}

impl fmt::Display for Descendants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/descendants({}..={})", self.min_depth, self.max_depth)?;
        fmt_filter(f, &self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, SyntaxKind};
    use crate::query::predicate::kind_is;

    const FILE: &str = "\
{namespace ns}
{template .a}
  {call .b}
    {param x: 1 /}
  {/call}
{/template}
{template .b}y{/template}
";

    fn root() -> SyntaxNode {
        parse(FILE).syntax()
    }

    fn apply(traversal: &dyn Traversal, node: &SyntaxNode) -> NodeSet {
        let mut out = NodeSet::new();
        traversal.traverse_node(node, &mut out);
        out
    }

    #[test]
    fn test_children() {
        let step = Children { filter: Some(Arc::new(kind_is(SyntaxKind::TEMPLATE_DEF))) };
        let out = apply(&step, &root());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_children_of_children() {
        // SOY_FILE -> TEMPLATE_DEF -> TEMPLATE_TAG in exactly two hops
        let step = ChildrenOfChildren { filter: Some(Arc::new(kind_is(SyntaxKind::TEMPLATE_TAG))) };
        let out = apply(&step, &root());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_parent_and_first_ancestor() {
        let root = root();
        let param = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::PARAM_TAG)
            .unwrap();

        let parent = apply(&Parent, &param);
        assert_eq!(parent.single().unwrap().kind(), SyntaxKind::CALL_TAG);

        let ancestor = FirstAncestor { filter: Some(Arc::new(kind_is(SyntaxKind::TEMPLATE_DEF))) };
        let out = apply(&ancestor, &param);
        assert_eq!(out.single().unwrap().kind(), SyntaxKind::TEMPLATE_DEF);

        // no matching ancestor contributes nothing
        let missing = FirstAncestor { filter: Some(Arc::new(kind_is(SyntaxKind::DELTEMPLATE_DEF))) };
        assert!(apply(&missing, &param).is_empty());
    }

    #[test]
    fn test_sibling_steps() {
        let root = root();
        let first_def = root
            .children()
            .find(|n| n.kind() == SyntaxKind::TEMPLATE_DEF)
            .unwrap();

        let next = NextSibling { filter: None };
        assert_eq!(apply(&next, &first_def).single().unwrap().kind(), SyntaxKind::TEMPLATE_DEF);

        let run = NextSiblings { include_self: true, filter: Some(Arc::new(kind_is(SyntaxKind::TEMPLATE_DEF))) };
        assert_eq!(apply(&run, &first_def).len(), 2);

        let second_def = apply(&next, &first_def).single().unwrap().clone();
        let prev = PreviousSiblings { include_self: false, filter: None };
        let out = apply(&prev, &second_def);
        // nearest-first: the first template def, then the namespace decl
        let kinds = out.map_to(|n| n.kind());
        assert_eq!(kinds, vec![SyntaxKind::TEMPLATE_DEF, SyntaxKind::NAMESPACE_DECL]);
    }

    #[test]
    fn test_all_descendants() {
        let step = AllDescendants { filter: Some(Arc::new(kind_is(SyntaxKind::PARAM_TAG))) };
        assert_eq!(apply(&step, &root()).len(), 1);
        // excludes the starting node itself
        let self_kind = AllDescendants { filter: Some(Arc::new(kind_is(SyntaxKind::SOY_FILE))) };
        assert!(apply(&self_kind, &root()).is_empty());
    }

    #[test]
    fn test_bounded_descendants() {
        // PARAM_TAG sits at depth 3 below the file: TEMPLATE_DEF / CALL_TAG / PARAM_TAG
        let hit = Descendants { min_depth: 2, max_depth: 3, filter: Some(Arc::new(kind_is(SyntaxKind::PARAM_TAG))) };
        assert_eq!(apply(&hit, &root()).len(), 1);
        let miss = Descendants { min_depth: 1, max_depth: 2, filter: Some(Arc::new(kind_is(SyntaxKind::PARAM_TAG))) };
        assert!(apply(&miss, &root()).is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty() {
        let step = Children { filter: None };
        let mut out = NodeSet::new();
        for node in NodeSet::new().iter() {
            step.traverse_node(node, &mut out);
        }
        assert!(out.is_empty());
    }
}
