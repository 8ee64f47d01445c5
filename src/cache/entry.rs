//! Index entries: one indexed declaration each.

use crate::base::FileId;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;
use std::fmt;

/// An insertion-ordered set of entries, the value type of every index level.
pub type EntrySet = IndexSet<CacheEntry, FxBuildHasher>;

/// One indexed declaration.
///
/// A plain comparable value: equality is by all fields. Created when the
/// scanner sees a declaration, destroyed when the owning file is rescanned
/// or removed and the declaration no longer appears.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheEntry {
    /// The declaring scope: the file's namespace for templates, the file's
    /// delegate package for deltemplates. None when the file declares none.
    pub scope: Option<SmolStr>,
    /// Template short name (`foo`), or the full deltemplate name (`a.b.foo`).
    pub name: SmolStr,
    /// True for deltemplate declarations.
    pub delegate: bool,
    /// The file the declaration was scanned from.
    pub file: FileId,
}

impl CacheEntry {
    pub fn template(scope: Option<SmolStr>, name: impl Into<SmolStr>, file: FileId) -> Self {
        Self {
            scope,
            name: name.into(),
            delegate: false,
            file,
        }
    }

    pub fn deltemplate(scope: Option<SmolStr>, name: impl Into<SmolStr>, file: FileId) -> Self {
        Self {
            scope,
            name: name.into(),
            delegate: true,
            file,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}@{}",
            if self.delegate { "del " } else { "" },
            self.scope.as_deref().unwrap_or("<none>"),
            self.name,
            self.file
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_all_fields() {
        let a = CacheEntry::template(Some("ns".into()), "foo", FileId::new(1));
        let b = CacheEntry::template(Some("ns".into()), "foo", FileId::new(1));
        assert_eq!(a, b);
        assert_ne!(a, CacheEntry::template(Some("ns".into()), "foo", FileId::new(2)));
        assert_ne!(a, CacheEntry::deltemplate(Some("ns".into()), "foo", FileId::new(1)));
        assert_ne!(a, CacheEntry::template(None, "foo", FileId::new(1)));
    }

    #[test]
    fn test_entry_set_dedups() {
        let mut set = EntrySet::default();
        set.insert(CacheEntry::template(Some("ns".into()), "foo", FileId::new(1)));
        set.insert(CacheEntry::template(Some("ns".into()), "foo", FileId::new(1)));
        assert_eq!(set.len(), 1);
    }
}
