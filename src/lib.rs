//! Triplegraph
//!
//! Maps RDF data onto a labeled property graph and back.
//!
//! # Architecture
//!
//! - `graph`: in-memory property graph with unique indexes, typed adjacency
//!   and all-or-nothing write transactions
//! - `rdf`: RDF terms, Turtle / N-Triples / RDF/XML parsing, literal translation
//! - `namespace`: the persisted prefix registry and its administration
//! - `import`: batched import, delete and SKOS import of parsed statements
//! - `export`: triple pattern queries answered from the graph
//! - `config`: YAML-loadable settings
//!
//! ## Example Usage
//!
//! ```rust
//! use triplegraph::config::{ExportOptions, ImportConfig};
//! use triplegraph::export::{export_pattern, PatternObject, TriplePattern};
//! use triplegraph::graph::GraphDatabase;
//! use triplegraph::import::import_rdf;
//! use triplegraph::rdf::RdfFormat;
//!
//! let db = GraphDatabase::new();
//! let ttl = r#"
//!     @prefix foaf: <http://xmlns.com/foaf/0.1/> .
//!     <http://example.org/alice> a foaf:Person ; foaf:name "Alice" .
//!     <http://example.org/bob> a foaf:Person ; foaf:name "Bob" .
//! "#;
//!
//! // Import
//! let summary = import_rdf(&db, ttl.as_bytes(), RdfFormat::Turtle, &ImportConfig::default()).unwrap();
//! assert_eq!(summary.triples_mapped, 4);
//!
//! // Query by type
//! let people = TriplePattern::any()
//!     .with_predicate("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
//!     .with_object(PatternObject::iri("http://xmlns.com/foaf/0.1/Person"));
//! let statements = export_pattern(&db, &people, ExportOptions::default()).unwrap();
//! assert_eq!(statements.len(), 2);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod export;
pub mod graph;
pub mod import;
pub mod namespace;
pub mod rdf;

// Re-export main types for convenience
pub use config::{ExportOptions, GraphConfig, ImportConfig, Settings};
pub use export::{describe_node, export_pattern, ExportError, TriplePattern, TriplePatternTranslator};
pub use graph::{GraphDatabase, GraphError, GraphStore, PropertyValue};
pub use import::{delete_rdf, import_rdf, import_skos, ImportError, ImportSummary};
pub use namespace::{NamespaceError, NamespacePrefixRegistry};
pub use rdf::{RdfFormat, StreamedStatement};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
