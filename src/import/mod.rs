//! RDF import and delete
//!
//! Statements are classified by a [`Router`] into a [`Batch`] and applied
//! to the graph every `commit_size` mapped statements by an [`ApplyPolicy`].
//! Each batch is its own transaction: a failed batch is rolled back and
//! reported as lost while earlier batches stay committed. When a run stops
//! early the error still carries the [`ImportSummary`] of what was applied.
//!
//! ```rust
//! use triplegraph::config::ImportConfig;
//! use triplegraph::graph::GraphDatabase;
//! use triplegraph::import::import_rdf;
//! use triplegraph::rdf::RdfFormat;
//!
//! let db = GraphDatabase::new();
//! let ttl = r#"
//!     @prefix ex: <http://example.org/> .
//!     ex:alice a ex:Person ; ex:name "Alice" ; ex:knows ex:bob .
//! "#;
//! let summary = import_rdf(&db, ttl.as_bytes(), RdfFormat::Turtle, &ImportConfig::default()).unwrap();
//! assert_eq!(summary.triples_mapped, 3);
//! ```

pub mod batch;
pub mod cache;
pub mod policy;
pub mod processor;
pub mod router;
pub mod skos;
pub mod summary;

pub use batch::{Batch, PendingResource, PendingStatement, PendingValue};
pub use cache::NodeResolutionCache;
pub use policy::{ApplyPolicy, BatchTally, DeletePolicy, LoadPolicy};
pub use processor::StatementProcessor;
pub use router::{DirectRouter, Router, Vocabulary};
pub use skos::SkosRouter;
pub use summary::ImportSummary;

use crate::config::{ConfigError, ImportConfig};
use crate::graph::{GraphDatabase, GraphError};
use crate::namespace::NamespaceError;
use crate::rdf::parser::{ParseError, RdfFormat};
use std::io::BufRead;
use thiserror::Error;

/// Import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Prefix sync failed with abort-on-error set
    #[error("Problems syncing up namespace prefixes in partial commit: {0}")]
    NamespaceSync(#[source] NamespaceError),

    /// A batch was rolled back with abort-on-error set
    #[error("Partial commit failed and was rolled back, {lost} triples lost: {source}")]
    PartialCommitFailure { lost: u64, source: GraphError },

    /// The configured stream limit was hit
    #[error("Triple limit of {0} reached")]
    TripleLimitReached(u64),

    /// A run stopped early. Batches committed before `source` stay
    /// committed and `summary` counts them.
    #[error("RDF run aborted: {source}")]
    Aborted {
        summary: Box<ImportSummary>,
        source: Box<ImportError>,
    },
}

impl ImportError {
    /// Counts gathered before the run stopped, if it had started
    pub fn summary(&self) -> Option<&ImportSummary> {
        match self {
            ImportError::Aborted { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// The error that stopped the run
    pub fn cause(&self) -> &ImportError {
        match self {
            ImportError::Aborted { source, .. } => source.cause(),
            other => other,
        }
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Import an RDF document
pub fn import_rdf<B: BufRead>(
    db: &GraphDatabase,
    reader: B,
    format: RdfFormat,
    config: &ImportConfig,
) -> ImportResult<ImportSummary> {
    StatementProcessor::loader(db, config.clone())?.run(reader, format)
}

/// Delete the statements of an RDF document from the graph
pub fn delete_rdf<B: BufRead>(
    db: &GraphDatabase,
    reader: B,
    format: RdfFormat,
    config: &ImportConfig,
) -> ImportResult<ImportSummary> {
    StatementProcessor::deleter(db, config.clone())?.run(reader, format)
}

/// Import a SKOS concept scheme
pub fn import_skos<B: BufRead>(
    db: &GraphDatabase,
    reader: B,
    format: RdfFormat,
    config: &ImportConfig,
) -> ImportResult<ImportSummary> {
    StatementProcessor::skos_importer(db, config.clone())?.run(reader, format)
}
