//! The incremental, hierarchical symbol index.
//!
//! Maps namespaces and delegate packages to the files and declarations that
//! define them, kept correct file-by-file as sources are added, edited, or
//! removed, with no full-project rescans. The index is a best-effort
//! accelerator consumed by the query engine's cross-file step; resolution
//! still functions (returning "unresolved") where the index is incomplete.

mod alias_cache;
mod entry;
mod manager;
mod module_cache;
mod monitor;
mod scanner;

pub use alias_cache::AliasCache;
pub use entry::{CacheEntry, EntrySet};
pub use manager::{
    CacheReadGuard, FileEnumeration, ModuleId, SourceAccess, SoyCacheManager, MAX_SCAN_BYTES,
    SOY_EXTENSION,
};
pub use module_cache::ModuleCache;
pub use monitor::{CacheDiff, CacheMonitor};
pub use scanner::{scan, ScanRecord};
