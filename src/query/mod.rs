//! The declarative tree-query engine.
//!
//! Queries are [`Path`] values: reusable, composable, traceable sequences
//! of structural hops ([`traverse`]), predicate filters ([`predicate`]),
//! stack operators for correlating node-sets captured at different points
//! ([`Path::push`] / [`Path::pop_and_join`]), and the cross-file step that
//! jumps between files through the symbol index ([`CrossFileStep`]).
//!
//! All steps are read-only over the tree; "no match" is an empty
//! [`NodeSet`], and only authoring bugs and cancellation surface as
//! [`QueryError`].

mod context;
mod cross_file;
mod node_set;
pub mod predicate;
mod path;
mod traverse;

pub use context::{FileResolver, QueryContext, QueryError};
pub use cross_file::CrossFileStep;
pub use node_set::NodeSet;
pub use path::{Join, Path};
pub use predicate::Predicate;
pub use traverse::Traversal;
