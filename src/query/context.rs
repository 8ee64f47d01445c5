//! Evaluation context threaded through every navigation.
//!
//! The context replaces ambient global state: the file resolver seam, the
//! symbol index, the navigation origin, and the cooperative cancellation
//! signal are all passed in explicitly by the caller.

use crate::base::FileId;
use crate::cache::SoyCacheManager;
use crate::parser::SyntaxNode;
use smol_str::SmolStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Resolves a file reference to its current parsed tree.
///
/// The seam to the host's file/document services: implementations may parse
/// on demand. A file that is gone or unparsable resolves to None, which a
/// query treats as "contributes nothing", never as an error.
pub trait FileResolver {
    fn resolve_file(&self, file: FileId) -> Option<SyntaxNode>;
}

/// Errors a navigation can surface.
///
/// Ordinary "not found" is an empty node-set, not an error. These variants
/// cover the two genuinely exceptional conditions: cooperative abort, and
/// authoring bugs in a statically defined path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The cancellation signal fired; the partial result was discarded and
    /// must not be cached as authoritative.
    #[error("navigation cancelled")]
    Cancelled,

    /// A pop-family operator ran with nothing on the capture stack. This is
    /// a bug in the path definition, not a property of the input tree.
    #[error("pop on an empty capture stack in path `{path}`")]
    StackUnderflow { path: SmolStr },
}

/// Everything a path evaluation needs besides its starting nodes.
pub struct QueryContext<'a> {
    pub resolver: &'a dyn FileResolver,
    pub caches: &'a SoyCacheManager,
    /// The file the navigation started in; cross-file steps resolve against
    /// this file's module.
    pub origin: FileId,
    cancel: Option<CancellationToken>,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        resolver: &'a dyn FileResolver,
        caches: &'a SoyCacheManager,
        origin: FileId,
    ) -> Self {
        Self {
            resolver,
            caches,
            origin,
            cancel: None,
        }
    }

    /// Attach a cooperative cancellation signal. Evaluation checks it once
    /// per visited node.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), QueryError> {
        if self.is_cancelled() {
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }
}
