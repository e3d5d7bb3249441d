//! Push-style RDF statement source
//!
//! Supports:
//! - Turtle (TTL)
//! - N-Triples (NT)
//! - RDF/XML
//!
//! A parser drives an [`RdfHandler`] through `start_rdf`, one
//! `handle_statement` per triple, and `end_rdf`. The handler may stop the
//! stream at any point by returning an error.

use super::types::{BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfSubject, Triple};
use rio_api::model as rio;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleError, TurtleParser};
use rio_xml::{RdfXmlError, RdfXmlParser};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// N-Triples format (.nt)
    NTriples,
    /// RDF/XML format (.rdf)
    RdfXml,
}

impl FromStr for RdfFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(RdfFormat::Turtle),
            "n-triples" | "ntriples" | "nt" => Ok(RdfFormat::NTriples),
            "rdf/xml" | "rdfxml" | "xml" | "rdf" => Ok(RdfFormat::RdfXml),
            _ => Err(ParseError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Turtle or N-Triples syntax or IO error
    #[error("Turtle parse error: {0}")]
    Turtle(#[from] TurtleError),

    /// RDF/XML syntax or IO error
    #[error("RDF/XML parse error: {0}")]
    RdfXml(#[from] RdfXmlError),

    /// A parsed term could not be represented
    #[error("Invalid term: {0}")]
    InvalidTerm(#[from] RdfError),

    /// Quoted triples and other constructs outside plain RDF
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// Unknown format name
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Receiver of a statement stream
pub trait RdfHandler {
    type Error: From<ParseError>;

    /// Called once before the first statement
    fn start_rdf(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once per parsed triple
    fn handle_statement(&mut self, triple: Triple) -> Result<(), Self::Error>;

    /// Called once after the last statement of a complete stream
    fn end_rdf(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Why the rio callback stopped
enum Interrupt<E> {
    Syntax(ParseError),
    Handler(E),
}

impl<E> From<TurtleError> for Interrupt<E> {
    fn from(e: TurtleError) -> Self {
        Interrupt::Syntax(e.into())
    }
}

impl<E> From<RdfXmlError> for Interrupt<E> {
    fn from(e: RdfXmlError) -> Self {
        Interrupt::Syntax(e.into())
    }
}

/// Parse `reader` as `format` and push every triple into `handler`.
///
/// `end_rdf` is only called when the whole document was consumed.
pub fn parse_into<R: BufRead, H: RdfHandler>(reader: R, format: RdfFormat, handler: &mut H) -> Result<(), H::Error> {
    handler.start_rdf()?;

    let mut on_triple = |t: rio::Triple<'_>| -> Result<(), Interrupt<H::Error>> {
        let triple = convert_triple(&t).map_err(Interrupt::Syntax)?;
        handler.handle_statement(triple).map_err(Interrupt::Handler)
    };
    let outcome = match format {
        RdfFormat::Turtle => TurtleParser::new(reader, None).parse_all(&mut on_triple),
        RdfFormat::NTriples => NTriplesParser::new(reader).parse_all(&mut on_triple),
        RdfFormat::RdfXml => RdfXmlParser::new(reader, None).parse_all(&mut on_triple),
    };
    match outcome {
        Ok(()) => {}
        Err(Interrupt::Syntax(e)) => return Err(e.into()),
        Err(Interrupt::Handler(e)) => return Err(e),
    }

    handler.end_rdf()
}

/// Parse a whole document into memory
pub fn parse_str(input: &str, format: RdfFormat) -> ParseResult<Vec<Triple>> {
    struct Collect(Vec<Triple>);

    impl RdfHandler for Collect {
        type Error = ParseError;

        fn handle_statement(&mut self, triple: Triple) -> ParseResult<()> {
            self.0.push(triple);
            Ok(())
        }
    }

    let mut collect = Collect(Vec::new());
    parse_into(input.as_bytes(), format, &mut collect)?;
    Ok(collect.0)
}

fn convert_triple(t: &rio::Triple<'_>) -> ParseResult<Triple> {
    let subject = match t.subject {
        rio::Subject::NamedNode(n) => RdfSubject::NamedNode(NamedNode::new(n.iri)?),
        rio::Subject::BlankNode(b) => RdfSubject::BlankNode(BlankNode::new(b.id)?),
        rio::Subject::Triple(_) => return Err(ParseError::Unsupported("quoted triple subject".into())),
    };
    let predicate = RdfPredicate::new(t.predicate.iri)?;
    let object = match t.object {
        rio::Term::NamedNode(n) => RdfObject::NamedNode(NamedNode::new(n.iri)?),
        rio::Term::BlankNode(b) => RdfObject::BlankNode(BlankNode::new(b.id)?),
        rio::Term::Literal(rio::Literal::Simple { value }) => RdfObject::Literal(Literal::new_simple_literal(value)),
        rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }) => {
            RdfObject::Literal(Literal::new_language_tagged_literal(value, language)?)
        }
        rio::Term::Literal(rio::Literal::Typed { value, datatype }) => {
            RdfObject::Literal(Literal::new_typed_literal(value, NamedNode::new(datatype.iri)?))
        }
        rio::Term::Triple(_) => return Err(ParseError::Unsupported("quoted triple object".into())),
    };
    Ok(Triple::new(subject, predicate, object))
}
