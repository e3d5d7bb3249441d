//! Namespace prefixes
//!
//! Shortened vocabulary names (`prefix__local`) are only meaningful together
//! with the prefix map that produced them, so the map is persisted in the
//! graph next to the data.

pub mod procedures;
pub mod registry;

pub use procedures::{
    add_prefix, add_prefixes_from_text, list_prefixes, remove_all_prefixes, remove_prefix, PrefixMap,
};
pub use registry::{NamespaceError, NamespacePrefixRegistry, NamespaceResult, STANDARD_NAMESPACES};
