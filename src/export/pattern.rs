//! Triple patterns with wildcards

use super::{ExportError, ExportResult};
use crate::rdf::vocab::{xsd, RDF_LANG_STRING, RDF_TYPE};
use serde::{Deserialize, Serialize};

/// Bound object of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternObject {
    Iri(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl PatternObject {
    pub fn iri(iri: impl Into<String>) -> Self {
        PatternObject::Iri(iri.into())
    }

    /// A plain string literal
    pub fn literal(value: impl Into<String>) -> Self {
        PatternObject::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        PatternObject::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        PatternObject::Literal {
            value: value.into(),
            datatype: Some(RDF_LANG_STRING.to_string()),
            language: Some(language.into()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, PatternObject::Literal { .. })
    }
}

/// A (subject, predicate, object) pattern; `None` is a wildcard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<PatternObject>,
}

impl TriplePattern {
    /// Create a new triple pattern
    pub fn new(subject: Option<String>, predicate: Option<String>, object: Option<PatternObject>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The all-wildcard pattern
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a pattern from flat fields.
    ///
    /// A language tag is only valid on an `rdf:langString` (or untyped)
    /// literal, and literal fields are only valid on a literal object.
    pub fn from_parts(
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
        is_literal: bool,
        literal_type: Option<&str>,
        literal_lang: Option<&str>,
    ) -> ExportResult<Self> {
        let object = match object {
            None => None,
            Some(value) if is_literal => match (literal_type, literal_lang) {
                (Some(dt), Some(_)) if dt != RDF_LANG_STRING => {
                    return Err(ExportError::InvalidPattern(format!(
                        "literal '{value}' has both datatype <{dt}> and a language tag"
                    )))
                }
                (_, Some(lang)) => Some(PatternObject::tagged(value, lang)),
                (Some(dt), None) if dt == RDF_LANG_STRING => {
                    return Err(ExportError::InvalidPattern(format!("literal '{value}' is missing its language tag")))
                }
                (dt, None) => Some(PatternObject::typed(value, dt.unwrap_or(xsd::STRING))),
            },
            Some(_) if literal_type.is_some() || literal_lang.is_some() => {
                return Err(ExportError::InvalidPattern(
                    "datatype or language given for an IRI object".to_string(),
                ))
            }
            Some(iri) => Some(PatternObject::iri(iri)),
        };
        Ok(Self {
            subject: subject.map(str::to_string),
            predicate: predicate.map(str::to_string),
            object,
        })
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_object(mut self, object: PatternObject) -> Self {
        self.object = Some(object);
        self
    }

    pub fn is_type_pattern(&self) -> bool {
        self.predicate.as_deref() == Some(RDF_TYPE)
    }

    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none() && self.predicate.is_none() && self.object.is_none()
    }
}
