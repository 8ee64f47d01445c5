//! Rowan-based lossless parser for Soy source files.
//!
//! - **logos** for fast lexing (raw-text and tag-interior modes)
//! - **rowan** for the CST (lossless, cheap to share)
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxNode (rowan) → CST with parent pointers
//!     ↓
//! AST layer → Typed wrappers over SyntaxNode
//! ```
//!
//! The CST is what the query engine walks: node type tags, text, and
//! positions are stable for the lifetime of the tree.

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
pub mod keywords;
mod lexer;
mod syntax_kind;

pub use lexer::{tokenize, Lexer, Token};
pub use parser::{parse, Parse, SyntaxError};
pub use syntax_kind::{
    SoyLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxNodeChildren, SyntaxToken,
};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
