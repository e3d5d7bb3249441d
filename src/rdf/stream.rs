//! Parse-and-stream without touching the graph

use super::parser::{parse_into, ParseError, RdfFormat, RdfHandler};
use super::statement::StreamedStatement;
use super::types::Triple;
use std::io::BufRead;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Triple limit of {0} reached")]
    TripleLimitReached(u64),
}

/// Collects parsed statements as [`StreamedStatement`] records
#[derive(Debug, Default)]
pub struct StatementStreamer {
    exclusions: Vec<String>,
    limit: Option<u64>,
    parsed: u64,
    statements: Vec<StreamedStatement>,
}

/// Statements of one streamed document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamedDocument {
    pub statements: Vec<StreamedStatement>,
    pub triples_parsed: u64,
    pub limit_reached: bool,
}

impl StatementStreamer {
    pub fn new(exclusions: Option<&[String]>, limit: Option<u64>) -> Self {
        Self {
            exclusions: exclusions.map(<[String]>::to_vec).unwrap_or_default(),
            limit,
            ..Self::default()
        }
    }

    /// Parse `reader` and collect its statements, stopping quietly at the limit
    pub fn stream<B: BufRead>(mut self, reader: B, format: RdfFormat) -> Result<StreamedDocument, ParseError> {
        let limit_reached = match parse_into(reader, format, &mut self) {
            Ok(()) => false,
            Err(StreamError::TripleLimitReached(limit)) => {
                warn!(limit, "triple limit reached, stopping the stream");
                true
            }
            Err(StreamError::Parse(e)) => return Err(e),
        };
        Ok(StreamedDocument {
            statements: self.statements,
            triples_parsed: self.parsed,
            limit_reached,
        })
    }
}

impl RdfHandler for StatementStreamer {
    type Error = StreamError;

    fn handle_statement(&mut self, triple: Triple) -> Result<(), StreamError> {
        // only kept statements count towards the limit
        if let Some(limit) = self.limit {
            if self.statements.len() as u64 >= limit {
                return Err(StreamError::TripleLimitReached(limit));
            }
        }
        self.parsed += 1;
        if !self.exclusions.iter().any(|p| p == triple.predicate.as_str()) {
            self.statements.push(StreamedStatement::from(&triple));
        }
        Ok(())
    }
}
