//! Single-pass declaration scanner.
//!
//! Keeps the index in sync without waiting for a full reparse: the file text
//! is tokenized once and only the declaration commands (namespace,
//! delpackage, alias, template, deltemplate) are picked out. No tree is
//! built and no grammar checking happens, so a file that fails to parse can
//! still contribute index entries.

use crate::parser::{keywords, tokenize, SyntaxKind, Token};
use smol_str::SmolStr;

/// The declarations found in one file's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRecord {
    /// First `{namespace ...}` declaration, if any.
    pub namespace: Option<SmolStr>,
    /// First `{delpackage ...}` declaration, if any.
    pub delpackage: Option<SmolStr>,
    /// Template short names, without the leading dot.
    pub templates: Vec<SmolStr>,
    /// Full deltemplate names.
    pub deltemplates: Vec<SmolStr>,
    /// Namespaces referenced by `{alias ...}` declarations.
    pub aliases: Vec<SmolStr>,
}

/// Scan `text` for declaration keywords.
pub fn scan(text: &str) -> ScanRecord {
    let tokens = tokenize(text);
    let mut record = ScanRecord::default();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind != SyntaxKind::L_BRACE {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while tokens.get(j).is_some_and(|t| t.kind == SyntaxKind::WHITESPACE) {
            j += 1;
        }
        let command = match tokens.get(j) {
            Some(t) if t.kind == SyntaxKind::IDENT && keywords::is_declaration_command(t.text) => {
                t.text
            }
            _ => {
                i = j;
                continue;
            }
        };
        j += 1;
        while tokens.get(j).is_some_and(|t| t.kind == SyntaxKind::WHITESPACE) {
            j += 1;
        }
        let (name, next) = dotted_name(&tokens, j);
        if !name.is_empty() {
            match command {
                keywords::NAMESPACE => {
                    if record.namespace.is_none() && !name.starts_with('.') {
                        record.namespace = Some(SmolStr::from(name.as_str()));
                    }
                }
                keywords::DELPACKAGE => {
                    if record.delpackage.is_none() && !name.starts_with('.') {
                        record.delpackage = Some(SmolStr::from(name.as_str()));
                    }
                }
                keywords::ALIAS => {
                    if !name.starts_with('.') {
                        record.aliases.push(SmolStr::from(name.as_str()));
                    }
                }
                keywords::TEMPLATE => {
                    // index by short name whether declared `.foo` or `ns.foo`
                    let short = name.rsplit('.').next().unwrap_or(&name);
                    if !short.is_empty() {
                        record.templates.push(SmolStr::from(short));
                    }
                }
                keywords::DELTEMPLATE => {
                    if !name.starts_with('.') {
                        record.deltemplates.push(SmolStr::from(name.as_str()));
                    }
                }
                _ => {}
            }
        }
        i = next;
    }
    record
}

/// Concatenate a `.`/identifier run starting at `start`; returns the text
/// and the position after it.
fn dotted_name(tokens: &[Token<'_>], start: usize) -> (String, usize) {
    let mut name = String::new();
    let mut i = start;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            SyntaxKind::DOT | SyntaxKind::IDENT => {
                name.push_str(token.text);
                i += 1;
            }
            _ => break,
        }
    }
    (name, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
{namespace ns.example}
{alias other.space as os}
{alias plain.words}

/** @param name */
{template .greet}
  {call os.helper /}
{/template}

{template .farewell}bye{/template}
";

    #[test]
    fn test_scan_declarations() {
        let record = scan(FILE);
        assert_eq!(record.namespace.as_deref(), Some("ns.example"));
        assert_eq!(record.delpackage, None);
        assert_eq!(record.templates, vec!["greet", "farewell"]);
        assert!(record.deltemplates.is_empty());
        assert_eq!(record.aliases, vec!["other.space", "plain.words"]);
    }

    #[test]
    fn test_scan_ignores_calls_and_params() {
        let record = scan("{namespace ns}\n{template .a}{call ns.b}{param template: 1/}{/call}{/template}\n");
        assert_eq!(record.templates, vec!["a"]);
    }

    #[test]
    fn test_scan_delegates() {
        let record = scan("{delpackage pkg}\n{namespace ns}\n{deltemplate sys.widget}x{/deltemplate}\n");
        assert_eq!(record.delpackage.as_deref(), Some("pkg"));
        assert_eq!(record.deltemplates, vec!["sys.widget"]);
    }

    #[test]
    fn test_scan_absolute_template_name_indexes_short_name() {
        let record = scan("{namespace ns}\n{template ns.foo}x{/template}\n");
        assert_eq!(record.templates, vec!["foo"]);
    }

    #[test]
    fn test_scan_skips_commented_out_declarations() {
        let record = scan("// {template .hidden}\n{namespace ns}\n/* {template .also} */\n");
        assert!(record.templates.is_empty());
        assert_eq!(record.namespace.as_deref(), Some("ns"));
    }

    #[test]
    fn test_scan_unparsable_text_still_yields_declarations() {
        // an unclosed call tag would be a parse error, the scanner does not care
        let record = scan("{namespace ns}\n{template .a}{call .broken\n{/template}\n");
        assert_eq!(record.templates, vec!["a"]);
    }

    #[test]
    fn test_scan_idempotent() {
        assert_eq!(scan(FILE), scan(FILE));
    }
}
