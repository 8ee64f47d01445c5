//! Recursive descent parser for Soy source files.
//!
//! Builds a rowan GreenNode tree from the token stream. The tree is
//! lossless: every input byte lands in some token, and unparseable runs are
//! wrapped in `ERROR` nodes rather than dropped.

use super::keywords;
use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// Parse result containing the green tree and any errors.
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node.
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse Soy source text into a CST.
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens, TextSize::of(input));
    parser.source_file();
    parser.finish()
}

/// What follows the `{` of the tag at the current position.
enum TagStart<'a> {
    /// `{command ...}`
    Command(&'a str),
    /// `{/command}`
    End(&'a str),
    /// `{$expr}` and other implicit prints
    Expr,
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    eof_offset: TextSize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], eof_offset: TextSize) -> Self {
        Self {
            tokens,
            pos: 0,
            eof_offset,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.current().map(|t| t.kind).unwrap_or(SyntaxKind::ERROR)
    }

    fn current_text(&self) -> &'a str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.at_eof() && self.current_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek_kind(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    /// Kind of the next non-whitespace token after the current one.
    fn peek_significant(&self) -> Option<SyntaxKind> {
        self.tokens[self.pos + 1..]
            .iter()
            .map(|t| t.kind)
            .find(|k| *k != SyntaxKind::WHITESPACE)
    }

    /// Classify the tag starting at the current `{` token.
    fn tag_start(&self) -> Option<TagStart<'a>> {
        debug_assert!(self.at(SyntaxKind::L_BRACE));
        let mut i = self.pos + 1;
        while self.tokens.get(i).is_some_and(|t| t.kind == SyntaxKind::WHITESPACE) {
            i += 1;
        }
        let token = self.tokens.get(i)?;
        match token.kind {
            SyntaxKind::SLASH => {
                let mut j = i + 1;
                while self.tokens.get(j).is_some_and(|t| t.kind == SyntaxKind::WHITESPACE) {
                    j += 1;
                }
                match self.tokens.get(j) {
                    Some(t) if t.kind == SyntaxKind::IDENT => Some(TagStart::End(t.text)),
                    _ => Some(TagStart::End("")),
                }
            }
            SyntaxKind::IDENT => Some(TagStart::Command(token.text)),
            _ => Some(TagStart::Expr),
        }
    }

    // =========================================================================
    // Token consumption and errors
    // =========================================================================

    fn bump(&mut self) {
        if let Some(token) = self.current() {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn skip_ws(&mut self) {
        while self.at(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }

    fn here(&self) -> TextRange {
        match self.current() {
            Some(token) => token.range(),
            None => TextRange::empty(self.eof_offset),
        }
    }

    fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.here();
        self.error(message, range);
    }

    /// Record an error and consume one token inside an ERROR node.
    fn error_and_bump(&mut self, message: impl Into<String>) {
        self.error_here(message);
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump();
        self.builder.finish_node();
    }

    // =========================================================================
    // File structure
    // =========================================================================

    fn source_file(&mut self) {
        self.builder.start_node(SyntaxKind::SOY_FILE.into());
        while !self.at_eof() {
            self.file_item();
        }
        self.builder.finish_node();
    }

    fn file_item(&mut self) {
        match self.current_kind() {
            SyntaxKind::RAW_TEXT
            | SyntaxKind::WHITESPACE
            | SyntaxKind::LINE_COMMENT
            | SyntaxKind::BLOCK_COMMENT => self.bump(),
            SyntaxKind::DOC_TEXT => self.doc_then_template(),
            SyntaxKind::L_BRACE => self.tag_item(),
            _ => self.error_and_bump("unexpected token"),
        }
    }

    /// A doc comment, wrapped together with the template definition that
    /// follows it (if one does).
    fn doc_then_template(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.doc_comment();
        while (!self.at_eof() && self.current_kind().is_trivia())
            || (self.at(SyntaxKind::RAW_TEXT) && self.current_text().trim().is_empty())
        {
            self.bump();
        }
        if self.at(SyntaxKind::L_BRACE) {
            match self.tag_start() {
                Some(TagStart::Command(keywords::TEMPLATE)) => {
                    self.template_def(Some(checkpoint), false);
                }
                Some(TagStart::Command(keywords::DELTEMPLATE)) => {
                    self.template_def(Some(checkpoint), true);
                }
                _ => {}
            }
        }
    }

    /// Split a doc comment token into DOC_TEXT runs and DOC_PARAM nodes.
    fn doc_comment(&mut self) {
        let token = match self.current() {
            Some(t) => t.clone(),
            None => return,
        };
        self.pos += 1;
        self.builder.start_node(SyntaxKind::DOC_COMMENT.into());

        let text = token.text;
        let mut last = 0;
        let mut search = 0;
        while let Some(found) = text[search..].find("@param") {
            let at = search + found;
            // must not be glued to a preceding identifier
            let prev_ok = text[..at]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_');
            let mut kw_end = at + "@param".len();
            if text[kw_end..].starts_with('?') {
                kw_end += 1;
            }
            let ws_len = text[kw_end..]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .map(char::len_utf8)
                .sum::<usize>();
            let name_start = kw_end + ws_len;
            let name_len = text[name_start..]
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .map(char::len_utf8)
                .sum::<usize>();
            if !prev_ok || ws_len == 0 || name_len == 0 {
                search = kw_end;
                continue;
            }
            if last < at {
                self.builder
                    .token(SyntaxKind::DOC_TEXT.into(), &text[last..at]);
            }
            self.builder.start_node(SyntaxKind::DOC_PARAM.into());
            self.builder
                .token(SyntaxKind::DOC_PARAM_KW.into(), &text[at..kw_end]);
            self.builder
                .token(SyntaxKind::WHITESPACE.into(), &text[kw_end..name_start]);
            self.builder.start_node(SyntaxKind::DOC_PARAM_NAME.into());
            self.builder.token(
                SyntaxKind::IDENT.into(),
                &text[name_start..name_start + name_len],
            );
            self.builder.finish_node();
            self.builder.finish_node();
            last = name_start + name_len;
            search = last;
        }
        if last < text.len() {
            self.builder
                .token(SyntaxKind::DOC_TEXT.into(), &text[last..]);
        }
        self.builder.finish_node();
    }

    // =========================================================================
    // Tag dispatch
    // =========================================================================

    fn tag_item(&mut self) {
        match self.tag_start() {
            None => {
                self.error_here("unterminated tag at end of file");
                self.builder.start_node(SyntaxKind::ERROR.into());
                self.bump();
                self.builder.finish_node();
            }
            Some(TagStart::End(_)) => self.unmatched_end_tag(),
            Some(TagStart::Expr) => self.print_tag(true),
            Some(TagStart::Command(cmd)) => match cmd {
                keywords::NAMESPACE => {
                    self.simple_decl(SyntaxKind::NAMESPACE_DECL, SyntaxKind::NAMESPACE_NAME)
                }
                keywords::DELPACKAGE => {
                    self.simple_decl(SyntaxKind::DELPACKAGE_DECL, SyntaxKind::DELPACKAGE_NAME)
                }
                keywords::ALIAS => self.alias_decl(),
                keywords::TEMPLATE => self.template_def(None, false),
                keywords::DELTEMPLATE => self.template_def(None, true),
                keywords::CALL => self.call_tag(false),
                keywords::DELCALL => self.call_tag(true),
                keywords::PARAM => self.param_tag(),
                keywords::PRINT => self.print_tag(false),
                keywords::LET => self.let_tag(),
                c if keywords::is_standalone_command(c) => self.generic_tag(),
                c if keywords::is_block_command(c) => self.block_tag(c),
                _ => self.generic_tag(),
            },
        }
    }

    fn unmatched_end_tag(&mut self) {
        self.error_here("end tag without a matching open tag");
        self.builder.start_node(SyntaxKind::ERROR.into());
        self.bump(); // {
        while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) && !self.at(SyntaxKind::L_BRACE) {
            self.bump();
        }
        if self.at(SyntaxKind::R_BRACE) {
            self.bump();
        }
        self.builder.finish_node();
    }

    // =========================================================================
    // Tag building blocks
    // =========================================================================

    /// Parses `{`, a TAG_BODY (command ident, command-specific interior,
    /// attribute/junk rest), an optional `/`, and `}`. Returns true when the
    /// tag was self-closing.
    fn tag_shell(&mut self, has_command: bool, interior: impl FnOnce(&mut Self)) -> bool {
        self.bump(); // L_BRACE
        self.builder.start_node(SyntaxKind::TAG_BODY.into());
        self.skip_ws();
        if has_command && self.at(SyntaxKind::IDENT) {
            self.bump();
        }
        interior(self);
        self.tag_body_rest();
        self.builder.finish_node();
        let mut self_closing = false;
        if self.at(SyntaxKind::SLASH) {
            self.bump();
            self_closing = true;
        }
        if self.at(SyntaxKind::R_BRACE) {
            self.bump();
        } else {
            self.error_here("expected `}`");
        }
        self_closing
    }

    /// Consumes the remainder of a tag interior: attributes, variable
    /// references and loose expression tokens, up to the closing brace.
    fn tag_body_rest(&mut self) {
        loop {
            if self.at_eof() {
                self.error_here("unterminated tag");
                return;
            }
            match self.current_kind() {
                SyntaxKind::R_BRACE => return,
                SyntaxKind::SLASH if self.peek_kind(1) == Some(SyntaxKind::R_BRACE) => return,
                SyntaxKind::L_BRACE => {
                    self.error_here("unterminated tag");
                    return;
                }
                SyntaxKind::WHITESPACE => self.bump(),
                SyntaxKind::IDENT if self.peek_significant() == Some(SyntaxKind::EQ) => {
                    self.attribute();
                }
                SyntaxKind::DOLLAR_IDENT => self.var_ref(),
                _ => self.bump(),
            }
        }
    }

    /// `name="value"`
    fn attribute(&mut self) {
        self.builder.start_node(SyntaxKind::ATTRIBUTE.into());
        self.builder.start_node(SyntaxKind::ATTRIBUTE_NAME.into());
        self.bump(); // IDENT
        self.builder.finish_node();
        self.skip_ws();
        self.bump(); // EQ
        self.skip_ws();
        if self.at(SyntaxKind::STRING) {
            self.builder.start_node(SyntaxKind::ATTRIBUTE_VALUE.into());
            self.bump();
            self.builder.finish_node();
        } else {
            self.error_here("expected attribute value");
        }
        self.builder.finish_node();
    }

    fn var_ref(&mut self) {
        self.builder.start_node(SyntaxKind::VAR_REF.into());
        self.bump(); // DOLLAR_IDENT
        self.builder.finish_node();
    }

    /// `a.b.c` with no interior whitespace, wrapped in `kind`. Accepts a
    /// leading dot for local names like `.foo`.
    fn dotted_name(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
        if self.at(SyntaxKind::DOT) {
            self.bump();
        }
        if self.at(SyntaxKind::IDENT) {
            self.bump();
        } else {
            self.error_here("expected name");
        }
        while self.at(SyntaxKind::DOT) && self.peek_kind(1) == Some(SyntaxKind::IDENT) {
            self.bump();
            self.bump();
        }
        self.builder.finish_node();
    }

    /// Expression tokens up to the end of the tag, with `$refs` wrapped in
    /// VAR_REF nodes. No precedence structure: expression *analysis* is out
    /// of scope, only the reference nodes matter to resolution.
    fn expression(&mut self) {
        if matches!(
            self.current_kind(),
            SyntaxKind::R_BRACE | SyntaxKind::L_BRACE
        ) || (self.at(SyntaxKind::SLASH) && self.peek_kind(1) == Some(SyntaxKind::R_BRACE))
            || self.at_eof()
        {
            return;
        }
        self.builder.start_node(SyntaxKind::EXPRESSION.into());
        loop {
            if self.at_eof() {
                break;
            }
            match self.current_kind() {
                SyntaxKind::R_BRACE | SyntaxKind::L_BRACE => break,
                SyntaxKind::SLASH if self.peek_kind(1) == Some(SyntaxKind::R_BRACE) => break,
                SyntaxKind::DOLLAR_IDENT => self.var_ref(),
                _ => self.bump(),
            }
        }
        self.builder.finish_node();
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// `{namespace a.b}` / `{delpackage p}`
    fn simple_decl(&mut self, decl_kind: SyntaxKind, name_kind: SyntaxKind) {
        self.builder.start_node(decl_kind.into());
        self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::IDENT) {
                p.dotted_name(name_kind);
            } else {
                p.error_here("expected name");
            }
        });
        self.builder.finish_node();
    }

    /// `{alias a.b.c}` / `{alias a.b.c as d}`
    fn alias_decl(&mut self) {
        self.builder.start_node(SyntaxKind::ALIAS_DECL.into());
        self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::IDENT) {
                p.dotted_name(SyntaxKind::ALIAS_NAME);
            } else {
                p.error_here("expected namespace name");
            }
            p.skip_ws();
            if p.at(SyntaxKind::IDENT) && p.current_text() == keywords::AS {
                p.bump();
                p.skip_ws();
                if p.at(SyntaxKind::IDENT) {
                    p.builder.start_node(SyntaxKind::ALIAS_IDENT.into());
                    p.bump();
                    p.builder.finish_node();
                } else {
                    p.error_here("expected alias identifier");
                }
            }
        });
        self.builder.finish_node();
    }

    // =========================================================================
    // Templates
    // =========================================================================

    fn template_def(&mut self, checkpoint: Option<Checkpoint>, is_del: bool) {
        let (def_kind, tag_kind, name_kind, cmd) = if is_del {
            (
                SyntaxKind::DELTEMPLATE_DEF,
                SyntaxKind::DELTEMPLATE_TAG,
                SyntaxKind::DELTEMPLATE_NAME,
                keywords::DELTEMPLATE,
            )
        } else {
            (
                SyntaxKind::TEMPLATE_DEF,
                SyntaxKind::TEMPLATE_TAG,
                SyntaxKind::TEMPLATE_NAME,
                keywords::TEMPLATE,
            )
        };
        match checkpoint {
            Some(cp) => self.builder.start_node_at(cp, def_kind.into()),
            None => self.builder.start_node(def_kind.into()),
        }
        self.builder.start_node(tag_kind.into());
        let self_closing = self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::DOT) || p.at(SyntaxKind::IDENT) {
                p.dotted_name(name_kind);
            } else {
                p.error_here("expected template name");
            }
        });
        self.builder.finish_node(); // tag
        if !self_closing {
            self.tag_block_body(cmd);
            if !self.at_eof() {
                self.end_tag(cmd);
            }
        }
        self.builder.finish_node(); // def
    }

    /// Body items up to (but not including) the `{/cmd}` end tag.
    fn tag_block_body(&mut self, cmd: &str) {
        loop {
            if self.at_eof() {
                self.error_here(format!("missing {{/{cmd}}}"));
                return;
            }
            if self.at(SyntaxKind::L_BRACE) {
                if let Some(TagStart::End(end_cmd)) = self.tag_start() {
                    if end_cmd == cmd {
                        return;
                    }
                    self.unmatched_end_tag();
                    continue;
                }
            }
            match self.current_kind() {
                SyntaxKind::RAW_TEXT
                | SyntaxKind::WHITESPACE
                | SyntaxKind::LINE_COMMENT
                | SyntaxKind::BLOCK_COMMENT
                | SyntaxKind::DOC_TEXT => self.bump(),
                SyntaxKind::L_BRACE => self.tag_item(),
                _ => self.error_and_bump("unexpected token"),
            }
        }
    }

    /// `{/cmd}`
    fn end_tag(&mut self, cmd: &str) {
        self.builder.start_node(SyntaxKind::END_TAG.into());
        self.bump(); // {
        self.skip_ws();
        if self.at(SyntaxKind::SLASH) {
            self.bump();
        }
        self.skip_ws();
        if self.at(SyntaxKind::IDENT) {
            if self.current_text() != cmd {
                self.error_here(format!("expected {{/{cmd}}}"));
            }
            self.bump();
        }
        self.skip_ws();
        if self.at(SyntaxKind::R_BRACE) {
            self.bump();
        } else {
            self.error_here("expected `}`");
        }
        self.builder.finish_node();
    }

    // =========================================================================
    // Body commands
    // =========================================================================

    fn call_tag(&mut self, is_del: bool) {
        let (kind, name_kind, cmd) = if is_del {
            (
                SyntaxKind::DELCALL_TAG,
                SyntaxKind::DELCALL_NAME,
                keywords::DELCALL,
            )
        } else {
            (SyntaxKind::CALL_TAG, SyntaxKind::CALL_NAME, keywords::CALL)
        };
        self.builder.start_node(kind.into());
        let self_closing = self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::DOT) || p.at(SyntaxKind::IDENT) {
                p.dotted_name(name_kind);
            } else {
                p.error_here("expected call target");
            }
        });
        if !self_closing {
            self.tag_block_body(cmd);
            if !self.at_eof() {
                self.end_tag(cmd);
            }
        }
        self.builder.finish_node();
    }

    fn param_tag(&mut self) {
        self.builder.start_node(SyntaxKind::PARAM_TAG.into());
        let self_closing = self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::IDENT) {
                p.builder.start_node(SyntaxKind::PARAM_NAME.into());
                p.bump();
                p.builder.finish_node();
            } else {
                p.error_here("expected parameter name");
            }
            p.skip_ws();
            if p.at(SyntaxKind::COLON) {
                p.bump();
                p.expression();
            }
        });
        if !self_closing {
            self.tag_block_body(keywords::PARAM);
            if !self.at_eof() {
                self.end_tag(keywords::PARAM);
            }
        }
        self.builder.finish_node();
    }

    fn print_tag(&mut self, implicit: bool) {
        self.builder.start_node(SyntaxKind::PRINT_TAG.into());
        self.tag_shell(!implicit, |p| {
            p.skip_ws();
            p.expression();
        });
        self.builder.finish_node();
    }

    fn let_tag(&mut self) {
        self.builder.start_node(SyntaxKind::LET_TAG.into());
        let self_closing = self.tag_shell(true, |p| {
            p.skip_ws();
            if p.at(SyntaxKind::DOLLAR_IDENT) {
                p.builder.start_node(SyntaxKind::LET_NAME.into());
                p.bump();
                p.builder.finish_node();
            } else {
                p.error_here("expected `$name`");
            }
            p.skip_ws();
            if p.at(SyntaxKind::COLON) {
                p.bump();
                p.expression();
            }
        });
        if !self_closing {
            self.tag_block_body(keywords::LET);
            if !self.at_eof() {
                self.end_tag(keywords::LET);
            }
        }
        self.builder.finish_node();
    }

    fn block_tag(&mut self, cmd: &'a str) {
        self.builder.start_node(SyntaxKind::BLOCK_TAG.into());
        // the interior loop handles the condition tokens and any attributes
        let self_closing = self.tag_shell(true, |_| {});
        if !self_closing {
            self.tag_block_body(cmd);
            if !self.at_eof() {
                self.end_tag(cmd);
            }
        }
        self.builder.finish_node();
    }

    fn generic_tag(&mut self) {
        self.builder.start_node(SyntaxKind::GENERIC_TAG.into());
        self.tag_shell(true, |_| {});
        self.builder.finish_node();
    }
}
