//! The node collection type produced and consumed by every query step.

use crate::parser::SyntaxNode;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// An insertion-ordered, duplicate-suppressing collection of syntax nodes.
///
/// The empty set and the one-element set are ordinary values: steps applied
/// to an empty set yield an empty set, and callers that expect "exactly one"
/// result use [`NodeSet::single`] to fail predictably otherwise.
///
/// Two nodes are duplicates iff they are the identical node instance (same
/// green tree, same offset), so a set can safely mix nodes from several
/// files.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: IndexSet<SyntaxNode, FxBuildHasher>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(node: SyntaxNode) -> Self {
        let mut set = Self::new();
        set.insert(node);
        set
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, keeping the first insertion's position on duplicates.
    /// Returns true if the node was not already present.
    pub fn insert(&mut self, node: SyntaxNode) -> bool {
        self.nodes.insert(node)
    }

    pub fn contains(&self, node: &SyntaxNode) -> bool {
        self.nodes.contains(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyntaxNode> + '_ {
        self.nodes.iter()
    }

    pub fn first(&self) -> Option<&SyntaxNode> {
        self.nodes.first()
    }

    /// The sole element, or None when the set is empty or ambiguous.
    pub fn single(&self) -> Option<&SyntaxNode> {
        if self.nodes.len() == 1 {
            self.nodes.first()
        } else {
            None
        }
    }

    /// Keep only the nodes matching `keep`, preserving order.
    pub fn filter(&self, keep: impl Fn(&SyntaxNode) -> bool) -> NodeSet {
        self.nodes.iter().filter(|n| keep(n)).cloned().collect()
    }

    /// Project every node to a value, in set order.
    pub fn map_to<T>(&self, f: impl Fn(&SyntaxNode) -> T) -> Vec<T> {
        self.nodes.iter().map(f).collect()
    }

    pub fn to_vec(&self) -> Vec<SyntaxNode> {
        self.nodes.iter().cloned().collect()
    }
}

impl Extend<SyntaxNode> for NodeSet {
    fn extend<I: IntoIterator<Item = SyntaxNode>>(&mut self, iter: I) {
        for node in iter {
            self.insert(node);
        }
    }
}

impl FromIterator<SyntaxNode> for NodeSet {
    fn from_iter<I: IntoIterator<Item = SyntaxNode>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for NodeSet {
    type Item = SyntaxNode;
    type IntoIter = indexmap::set::IntoIter<SyntaxNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a SyntaxNode;
    type IntoIter = indexmap::set::Iter<'a, SyntaxNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
