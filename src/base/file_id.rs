//! File identifiers for tracking source files.

use std::fmt;

/// A lightweight handle that uniquely identifies a file within a workspace.
///
/// The actual path is stored in workspace side tables; index entries and
/// query contexts only ever carry the handle. Comparisons are O(1) and the
/// handle is 4 bytes, so it is cheap to copy, hash, and store in entry sets.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId from a raw index.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl From<u32> for FileId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<FileId> for u32 {
    #[inline]
    fn from(id: FileId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_roundtrip() {
        let id = FileId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(u32::from(id), 7);
        assert_eq!(FileId::from(7u32), id);
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(FileId::new(3).to_string(), "file#3");
    }
}
