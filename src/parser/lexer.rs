//! Logos-based lexer for Soy source text.
//!
//! Soy has two lexical worlds: raw template text between tags, and the
//! interior of `{...}` tags. Each world gets its own logos token enum and
//! the [`Lexer`] wrapper switches between them with `morph()` on the brace
//! tokens.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::TextSize;

/// A token with its kind, text, and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn range(&self) -> text_size::TextRange {
        text_size::TextRange::at(self.offset, TextSize::of(self.text))
    }
}

/// Tokens outside of tags: raw output text, comments, and the `{` that
/// enters tag mode.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
    #[regex(r"/\*\*([^*]|\*+[^*/])*\*+/", priority = 6)]
    DocComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", priority = 5)]
    BlockComment,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("{")]
    LBrace,

    #[regex(r"[^{/]+")]
    #[token("/")]
    Text,
}

/// Tokens inside a `{...}` tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum TagToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("}")]
    RBrace,

    #[token("{")]
    LBrace,

    #[token("/")]
    Slash,

    #[token(".")]
    Dot,

    #[token("=")]
    Eq,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    DollarIdent,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[+\-*%<>!?&@~^#;]")]
    Op,
}

impl From<RawToken> for SyntaxKind {
    fn from(token: RawToken) -> Self {
        match token {
            // Doc comments stay one token here; the parser splits them into
            // DOC_TEXT / DOC_PARAM_KW pieces when it builds the DOC_COMMENT
            // node.
            RawToken::DocComment => SyntaxKind::DOC_TEXT,
            RawToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            RawToken::LineComment => SyntaxKind::LINE_COMMENT,
            RawToken::LBrace => SyntaxKind::L_BRACE,
            RawToken::Text => SyntaxKind::RAW_TEXT,
        }
    }
}

impl From<TagToken> for SyntaxKind {
    fn from(token: TagToken) -> Self {
        match token {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::RBrace => SyntaxKind::R_BRACE,
            TagToken::LBrace => SyntaxKind::L_BRACE,
            TagToken::Slash => SyntaxKind::SLASH,
            TagToken::Dot => SyntaxKind::DOT,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::Colon => SyntaxKind::COLON,
            TagToken::Comma => SyntaxKind::COMMA,
            TagToken::Pipe => SyntaxKind::PIPE,
            TagToken::LParen => SyntaxKind::L_PAREN,
            TagToken::RParen => SyntaxKind::R_PAREN,
            TagToken::LBracket => SyntaxKind::L_BRACKET,
            TagToken::RBracket => SyntaxKind::R_BRACKET,
            TagToken::String => SyntaxKind::STRING,
            TagToken::DollarIdent => SyntaxKind::DOLLAR_IDENT,
            TagToken::Ident => SyntaxKind::IDENT,
            TagToken::Number => SyntaxKind::NUMBER,
            TagToken::Op => SyntaxKind::OP,
        }
    }
}

enum Mode<'a> {
    Raw(logos::Lexer<'a, RawToken>),
    Tag(logos::Lexer<'a, TagToken>),
}

/// Lexer producing the full, lossless token stream for one file.
pub struct Lexer<'a> {
    mode: Option<Mode<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            mode: Some(Mode::Raw(RawToken::lexer(input))),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode.take()? {
            Mode::Raw(mut inner) => {
                let token = inner.next()?;
                let text = inner.slice();
                let offset = TextSize::new(inner.span().start as u32);
                let kind = match token {
                    Ok(t) => {
                        let kind: SyntaxKind = t.into();
                        if t == RawToken::LBrace {
                            self.mode = Some(Mode::Tag(inner.morph()));
                        } else {
                            self.mode = Some(Mode::Raw(inner));
                        }
                        kind
                    }
                    Err(()) => {
                        self.mode = Some(Mode::Raw(inner));
                        SyntaxKind::ERROR
                    }
                };
                Some(Token { kind, text, offset })
            }
            Mode::Tag(mut inner) => {
                let token = inner.next()?;
                let text = inner.slice();
                let offset = TextSize::new(inner.span().start as u32);
                let kind = match token {
                    Ok(t) => {
                        let kind: SyntaxKind = t.into();
                        if t == TagToken::RBrace {
                            self.mode = Some(Mode::Raw(inner.morph()));
                        } else {
                            self.mode = Some(Mode::Tag(inner));
                        }
                        kind
                    }
                    Err(()) => {
                        self.mode = Some(Mode::Tag(inner));
                        SyntaxKind::ERROR
                    }
                };
                Some(Token { kind, text, offset })
            }
        }
    }
}

/// Tokenize an entire string into a Vec.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
