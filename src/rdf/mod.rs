//! RDF terms, parsing and statement streaming
//!
//! Parsing is push-based: [`parse_into`] drives an [`RdfHandler`] with one
//! [`Triple`] at a time, so large documents never sit in memory whole.
//!
//! # Example
//!
//! ```rust
//! use triplegraph::rdf::{parse_str, RdfFormat};
//!
//! let triples = parse_str(
//!     "<http://example.org/alice> <http://xmlns.com/foaf/0.1/name> \"Alice\" .",
//!     RdfFormat::NTriples,
//! )
//! .unwrap();
//! assert_eq!(triples.len(), 1);
//! assert_eq!(triples[0].predicate.as_str(), "http://xmlns.com/foaf/0.1/name");
//! ```

pub mod literal;
pub mod parser;
pub mod statement;
pub mod stream;
pub mod types;
pub mod vocab;

pub use parser::{parse_into, parse_str, ParseError, ParseResult, RdfFormat, RdfHandler};
pub use statement::{ObjectTerm, StreamedStatement};
pub use stream::{StatementStreamer, StreamError, StreamedDocument};
pub use types::{
    BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject, Triple,
};
