//! Project management: the workspace and the collaborator seams it
//! implements for the query engine and the index updater.

mod workspace;

pub use workspace::Workspace;
