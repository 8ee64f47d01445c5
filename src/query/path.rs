//! Compiled tree queries.
//!
//! A [`Path`] is an immutable, named sequence of steps (traversals,
//! filters, stack operators, cross-file hops) built once and reused. Paths
//! compose by concatenation ([`Path::append`]), short-circuiting
//! alternation ([`Path::or`]), per-node forking ([`Path::fork`]), and as a
//! node-level filter ([`Path::keep_if`]: keep the nodes from which a
//! sub-path produces a non-empty result).
//!
//! Navigation is synchronous and read-only; two paths may run concurrently
//! over the same tree. Each run opens a `tracing` span carrying the path's
//! debug name, so step-by-step traces can be filtered per path.

use super::context::{QueryContext, QueryError};
use super::cross_file::CrossFileStep;
use super::node_set::NodeSet;
use super::predicate::{NoNode, Predicate};
use super::traverse::{
    AllDescendants, Children, ChildrenOfChildren, Descendants, FirstAncestor, NextSibling,
    NextSiblings, Parent, PreviousSiblings, Traversal,
};
use crate::parser::SyntaxNode;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use tracing::{error, trace, trace_span};

/// Combines the current node-set with a previously captured one.
///
/// The join receives `(current, popped, ctx)` and returns the new current
/// set; the context is available so a join can itself resolve references.
#[derive(Clone)]
pub struct Join {
    name: &'static str,
    #[allow(clippy::type_complexity)]
    f: Arc<dyn Fn(NodeSet, NodeSet, &QueryContext<'_>) -> NodeSet + Send + Sync>,
}

impl Join {
    pub fn new(
        name: &'static str,
        f: impl Fn(NodeSet, NodeSet, &QueryContext<'_>) -> NodeSet + Send + Sync + 'static,
    ) -> Self {
        Self { name, f: Arc::new(f) }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone)]
enum Step {
    Traverse(Arc<dyn Traversal>),
    Filter(Arc<dyn Predicate>),
    Push,
    Swap,
    PopJoin(Join),
    CrossFile(CrossFileStep),
    Fork(Path),
    KeepIf(Path),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Traverse(t) => write!(f, "{t}"),
            Step::Filter(p) => write!(f, "[{p}]"),
            Step::Push => write!(f, "push"),
            Step::Swap => write!(f, "swap"),
            Step::PopJoin(join) => write!(f, "pop+join({join})"),
            Step::CrossFile(cross) => write!(f, "{cross}"),
            Step::Fork(path) => write!(f, "fork({})", path.display_name()),
            Step::KeepIf(path) => write!(f, "if({})", path.display_name()),
        }
    }
}

#[derive(Clone)]
enum PathKind {
    Steps(Vec<Step>),
    Chain(Vec<Path>),
    FirstNonEmpty(Vec<Path>),
}

/// A compiled, reusable tree query.
#[derive(Clone)]
pub struct Path {
    name: Option<SmolStr>,
    kind: PathKind,
}

impl Path {
    /// The identity path: navigation returns the starting set.
    pub fn new() -> Self {
        Self {
            name: None,
            kind: PathKind::Steps(Vec::new()),
        }
    }

    /// A path that never matches anything.
    pub fn none() -> Self {
        Self::new().filter(NoNode)
    }

    /// Name this path for trace output. The name is not inherited by paths
    /// built from this one.
    pub fn debug_name(mut self, name: &str) -> Self {
        self.name = Some(SmolStr::from(name));
        self
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }

    fn step(self, step: Step) -> Self {
        let Path { name, kind } = self;
        let kind = match kind {
            PathKind::Steps(mut steps) => {
                steps.push(step);
                PathKind::Steps(steps)
            }
            other => PathKind::Chain(vec![
                Path { name: None, kind: other },
                Path {
                    name: None,
                    kind: PathKind::Steps(vec![step]),
                },
            ]),
        };
        Path { name, kind }
    }

    fn filter_of(predicate: impl Predicate + 'static) -> Option<Arc<dyn Predicate>> {
        Some(Arc::new(predicate))
    }

    // ========================================================================
    // Traversal steps
    // ========================================================================

    pub fn on_children(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(Children {
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_children_of_children(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(ChildrenOfChildren {
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_parent(self) -> Self {
        self.step(Step::Traverse(Arc::new(Parent)))
    }

    pub fn on_first_ancestor(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(FirstAncestor {
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_next_sibling(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(NextSibling {
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_next_siblings(self, include_self: bool, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(NextSiblings {
            include_self,
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_previous_siblings(
        self,
        include_self: bool,
        predicate: impl Predicate + 'static,
    ) -> Self {
        self.step(Step::Traverse(Arc::new(PreviousSiblings {
            include_self,
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_all_descendants(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Traverse(Arc::new(AllDescendants {
            filter: Self::filter_of(predicate),
        })))
    }

    pub fn on_descendants(
        self,
        min_depth: u32,
        max_depth: u32,
        predicate: impl Predicate + 'static,
    ) -> Self {
        self.step(Step::Traverse(Arc::new(Descendants {
            min_depth,
            max_depth,
            filter: Self::filter_of(predicate),
        })))
    }

    // ========================================================================
    // Filters, stack operators, cross-file
    // ========================================================================

    /// Keep only nodes matching the predicate, without moving.
    pub fn filter(self, predicate: impl Predicate + 'static) -> Self {
        self.step(Step::Filter(Arc::new(predicate)))
    }

    /// Capture the current node-set on the stack; navigation continues from
    /// the same set.
    pub fn push(self) -> Self {
        self.step(Step::Push)
    }

    /// Exchange the top of the stack with the current set.
    pub fn swap(self) -> Self {
        self.step(Step::Swap)
    }

    /// Pop the most recent capture and combine it with the current set.
    pub fn pop_and_join(self, join: Join) -> Self {
        self.step(Step::PopJoin(join))
    }

    /// Continue navigation in the files the symbol index names.
    pub fn cross_file(self, step: CrossFileStep) -> Self {
        self.step(Step::CrossFile(step))
    }

    /// Re-root `path` at every node of the current set and take the union
    /// of the results, one discrete forked navigation per node.
    pub fn fork(self, path: Path) -> Self {
        self.step(Step::Fork(path))
    }

    /// Keep the nodes from which `path` produces a non-empty result: the
    /// path used as a node-level predicate.
    pub fn keep_if(self, path: Path) -> Self {
        self.step(Step::KeepIf(path))
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Follow this path, then continue with `next`.
    pub fn append(self, next: Path) -> Self {
        let name = self.name.clone();
        match self.kind {
            PathKind::Chain(mut paths) => {
                paths.push(next);
                Path {
                    name,
                    kind: PathKind::Chain(paths),
                }
            }
            kind => Path {
                name,
                kind: PathKind::Chain(vec![Path { name: None, kind }, next]),
            },
        }
    }

    /// Try this path; if it matches nothing, evaluate `alternative` from
    /// the same starting set. First non-empty result wins.
    pub fn or(self, alternative: Path) -> Self {
        let name = self.name.clone();
        match self.kind {
            PathKind::FirstNonEmpty(mut paths) => {
                paths.push(alternative);
                Path {
                    name,
                    kind: PathKind::FirstNonEmpty(paths),
                }
            }
            kind => Path {
                name,
                kind: PathKind::FirstNonEmpty(vec![Path { name: None, kind }, alternative]),
            },
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Run the query from one starting node.
    ///
    /// Authoring errors (stack misuse) are logged and yield an empty set;
    /// cancellation also yields an empty set. Callers that must tell a
    /// cancelled run apart from a genuinely empty result use
    /// [`Path::try_navigate`].
    pub fn navigate(&self, start: &SyntaxNode, ctx: &QueryContext<'_>) -> NodeSet {
        self.navigate_set(NodeSet::singleton(start.clone()), ctx)
    }

    /// Run the query from a whole starting set.
    pub fn navigate_set(&self, start: NodeSet, ctx: &QueryContext<'_>) -> NodeSet {
        match self.try_navigate_set(start, ctx) {
            Ok(result) => result,
            Err(QueryError::Cancelled) => {
                trace!(path = self.display_name(), "navigation cancelled");
                NodeSet::new()
            }
            Err(err) => {
                error!(path = self.display_name(), "navigation aborted: {err}");
                NodeSet::new()
            }
        }
    }

    /// Like [`Path::navigate`], but surfaces cancellation and authoring
    /// errors instead of flattening them to an empty set.
    pub fn try_navigate(
        &self,
        start: &SyntaxNode,
        ctx: &QueryContext<'_>,
    ) -> Result<NodeSet, QueryError> {
        self.try_navigate_set(NodeSet::singleton(start.clone()), ctx)
    }

    pub fn try_navigate_set(
        &self,
        start: NodeSet,
        ctx: &QueryContext<'_>,
    ) -> Result<NodeSet, QueryError> {
        let span = trace_span!("navigate", path = self.display_name());
        let _guard = span.enter();
        trace!(start = start.len(), "begin path");
        let result = self.eval(start, ctx);
        match &result {
            Ok(set) => trace!(results = set.len(), "end path"),
            Err(err) => trace!("end path: {err}"),
        }
        result
    }

    fn eval(&self, start: NodeSet, ctx: &QueryContext<'_>) -> Result<NodeSet, QueryError> {
        match &self.kind {
            PathKind::Steps(steps) => self.eval_steps(steps, start, ctx),
            PathKind::Chain(paths) => {
                let mut current = start;
                for path in paths {
                    current = path.eval(current, ctx)?;
                }
                Ok(current)
            }
            PathKind::FirstNonEmpty(paths) => {
                for path in paths {
                    let result = path.eval(start.clone(), ctx)?;
                    if !result.is_empty() {
                        return Ok(result);
                    }
                }
                Ok(NodeSet::new())
            }
        }
    }

    fn eval_steps(
        &self,
        steps: &[Step],
        mut current: NodeSet,
        ctx: &QueryContext<'_>,
    ) -> Result<NodeSet, QueryError> {
        let mut stack: Vec<NodeSet> = Vec::new();
        for step in steps {
            ctx.check_cancelled()?;
            match step {
                Step::Traverse(traversal) => {
                    let mut out = NodeSet::new();
                    for node in &current {
                        ctx.check_cancelled()?;
                        traversal.traverse_node(node, &mut out);
                    }
                    current = out;
                }
                Step::Filter(predicate) => {
                    let mut out = NodeSet::new();
                    for node in &current {
                        ctx.check_cancelled()?;
                        if predicate.test(node) {
                            out.insert(node.clone());
                        }
                    }
                    current = out;
                }
                Step::Push => stack.push(current.clone()),
                Step::Swap => {
                    let top = stack.last_mut().ok_or_else(|| QueryError::StackUnderflow {
                        path: SmolStr::from(self.display_name()),
                    })?;
                    std::mem::swap(top, &mut current);
                }
                Step::PopJoin(join) => {
                    let popped = stack.pop().ok_or_else(|| QueryError::StackUnderflow {
                        path: SmolStr::from(self.display_name()),
                    })?;
                    current = (join.f)(current, popped, ctx);
                }
                Step::CrossFile(cross) => {
                    current = cross.resolve(&current, ctx);
                }
                Step::Fork(path) => {
                    let mut out = NodeSet::new();
                    for node in &current {
                        ctx.check_cancelled()?;
                        out.extend(path.eval(NodeSet::singleton(node.clone()), ctx)?);
                    }
                    current = out;
                }
                Step::KeepIf(path) => {
                    let mut out = NodeSet::new();
                    for node in &current {
                        ctx.check_cancelled()?;
                        if !path.eval(NodeSet::singleton(node.clone()), ctx)?.is_empty() {
                            out.insert(node.clone());
                        }
                    }
                    current = out;
                }
            }
            trace!("  {step} -> {} nodes", current.len());
            if current.is_empty() && stack.is_empty() {
                trace!("  abort: nothing to continue from");
                return Ok(NodeSet::new());
            }
        }
        Ok(current)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path(`{}`)", self.display_name())
    }
}
