//! Validation for Soy identifiers, namespaces, and template names.
//!
//! Prebuilt path constructors validate their string inputs with these
//! helpers and degrade to the empty path when a name is malformed, so a bad
//! reference in source text can never turn into a query authoring error.

use unicode_ident::{is_xid_continue, is_xid_start};

/// Returns true if `text` is a single valid Soy identifier segment.
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || is_xid_start(c) => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || is_xid_continue(c))
}

/// Returns true if `text` is a valid dotted namespace name, e.g. `a.b.c`.
///
/// A namespace must contain at least one segment and must not begin or end
/// with a dot.
pub fn is_valid_namespace(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_valid_identifier)
}

/// Returns true if `text` is a valid fully qualified template name,
/// e.g. `a.b.foo`: a namespace followed by one more segment.
pub fn is_valid_template_name(text: &str) -> bool {
    match text.rsplit_once('.') {
        Some((namespace, short)) => is_valid_namespace(namespace) && is_valid_identifier(short),
        None => false,
    }
}

/// Returns true if `text` is a valid local template name, e.g. `.foo`.
pub fn is_valid_local_template_name(text: &str) -> bool {
    text.strip_prefix('.')
        .is_some_and(|rest| is_valid_identifier(rest) && !rest.contains('.'))
}
