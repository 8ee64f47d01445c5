//! Syntax kinds for the rowan-based Soy CST.
//!
//! This enum defines the closed vocabulary of token and node kinds in the
//! syntax tree, one variant per grammar production. Query predicates match
//! against these tags; the vocabulary is versioned with the crate.

/// All syntax kinds (tokens and nodes) in a Soy source file.
///
/// Tokens are leaves (raw text, identifiers, punctuation inside tags).
/// Nodes are composite (declarations, tags, name nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // =========================================================================
    // TOKENS
    // =========================================================================
    /// Literal template output text between tags
    RAW_TEXT,
    /// Prose inside a doc comment, around `@param` declarations
    DOC_TEXT,
    /// `@param` or `@param?` inside a doc comment
    DOC_PARAM_KW,
    IDENT,        // template, foo
    DOLLAR_IDENT, // $foo
    NUMBER,       // 42, 3.14
    STRING,       // "value" or 'value'
    L_BRACE,      // {
    R_BRACE,      // }
    SLASH,        // /
    DOT,          // .
    EQ,           // =
    COLON,        // :
    COMMA,        // ,
    PIPE,         // |
    L_PAREN,      // (
    R_PAREN,      // )
    L_BRACKET,    // [
    R_BRACKET,    // ]
    /// Any other single-character operator inside a tag
    OP,

    // =========================================================================
    // NODES - file structure
    // =========================================================================
    SOY_FILE,
    NAMESPACE_DECL,
    NAMESPACE_NAME,
    DELPACKAGE_DECL,
    DELPACKAGE_NAME,
    ALIAS_DECL,
    ALIAS_NAME,
    ALIAS_IDENT,

    // =========================================================================
    // NODES - templates
    // =========================================================================
    TEMPLATE_DEF,
    TEMPLATE_TAG,
    TEMPLATE_NAME,
    DELTEMPLATE_DEF,
    DELTEMPLATE_TAG,
    DELTEMPLATE_NAME,

    // =========================================================================
    // NODES - tag internals and body commands
    // =========================================================================
    /// Interior of any tag, between the braces
    TAG_BODY,
    /// A closing tag such as `{/template}`
    END_TAG,
    ATTRIBUTE,
    ATTRIBUTE_NAME,
    ATTRIBUTE_VALUE,
    CALL_TAG,
    CALL_NAME,
    DELCALL_TAG,
    DELCALL_NAME,
    PARAM_TAG,
    PARAM_NAME,
    PRINT_TAG,
    LET_TAG,
    LET_NAME,
    /// A command with a body and matching end tag: if, switch, foreach, ...
    BLOCK_TAG,
    /// A self-contained command without a body: sp, nil, else, case, ...
    GENERIC_TAG,
    EXPRESSION,
    VAR_REF,

    // =========================================================================
    // NODES - documentation
    // =========================================================================
    DOC_COMMENT,
    DOC_PARAM,
    DOC_PARAM_NAME,

    // =========================================================================
    // Special
    // =========================================================================
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or a comment).
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT
        )
    }

    /// Check if this kind is a name node (the declaration/reference nodes
    /// that resolution paths terminate on).
    pub fn is_name(self) -> bool {
        matches!(
            self,
            Self::NAMESPACE_NAME
                | Self::DELPACKAGE_NAME
                | Self::ALIAS_NAME
                | Self::ALIAS_IDENT
                | Self::TEMPLATE_NAME
                | Self::DELTEMPLATE_NAME
                | Self::CALL_NAME
                | Self::DELCALL_NAME
                | Self::PARAM_NAME
                | Self::LET_NAME
                | Self::DOC_PARAM_NAME
                | Self::ATTRIBUTE_NAME
        )
    }

    /// Check if this kind is one of the tag nodes produced for `{...}`
    /// commands.
    pub fn is_tag(self) -> bool {
        matches!(
            self,
            Self::NAMESPACE_DECL
                | Self::DELPACKAGE_DECL
                | Self::ALIAS_DECL
                | Self::TEMPLATE_TAG
                | Self::DELTEMPLATE_TAG
                | Self::END_TAG
                | Self::CALL_TAG
                | Self::DELCALL_TAG
                | Self::PARAM_TAG
                | Self::PRINT_TAG
                | Self::LET_TAG
                | Self::BLOCK_TAG
                | Self::GENERIC_TAG
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SoyLanguage {}

impl rowan::Language for SoyLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<SoyLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<SoyLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<SoyLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<SoyLanguage>;
