//! Export of graph data as RDF statements
//!
//! ```rust
//! use triplegraph::config::{ExportOptions, ImportConfig};
//! use triplegraph::export::{export_pattern, TriplePattern};
//! use triplegraph::graph::GraphDatabase;
//! use triplegraph::import::import_rdf;
//! use triplegraph::rdf::RdfFormat;
//!
//! let db = GraphDatabase::new();
//! let ttl = r#"
//!     @prefix ex: <http://example.org/> .
//!     ex:alice ex:name "Alice" ; ex:knows ex:bob .
//! "#;
//! import_rdf(&db, ttl.as_bytes(), RdfFormat::Turtle, &ImportConfig::default()).unwrap();
//!
//! let pattern = TriplePattern::any().with_subject("http://example.org/alice");
//! let statements = export_pattern(&db, &pattern, ExportOptions::default()).unwrap();
//! assert_eq!(statements.len(), 2);
//! ```

pub mod pattern;
pub mod translator;
pub mod vocabulary;

pub use pattern::{PatternObject, TriplePattern};
pub use translator::{Statements, TriplePatternTranslator};
pub use vocabulary::ExportVocabulary;

use crate::config::{ConfigError, ExportOptions};
use crate::graph::{GraphDatabase, GraphError};
use crate::namespace::NamespaceError;
use crate::rdf::StreamedStatement;
use thiserror::Error;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid triple pattern: {0}")]
    InvalidPattern(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Collect the statements matching `pattern`
pub fn export_pattern(
    db: &GraphDatabase,
    pattern: &TriplePattern,
    options: ExportOptions,
) -> ExportResult<Vec<StreamedStatement>> {
    let store = db.read()?;
    let translator = TriplePatternTranslator::new(&store, options)?;
    let statements = translator.stream(pattern).collect();
    Ok(statements)
}

/// Collect the statements about one resource
pub fn describe_node(
    db: &GraphDatabase,
    uri: &str,
    include_context: bool,
    options: ExportOptions,
) -> ExportResult<Vec<StreamedStatement>> {
    let store = db.read()?;
    let translator = TriplePatternTranslator::new(&store, options)?;
    Ok(translator.stream_node_by_uri(uri, include_context))
}
