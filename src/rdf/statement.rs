//! Flat statement records produced by streaming and export

use super::types::{RdfObject, Triple};
use super::vocab::RDF_LANG_STRING;
use serde::Serialize;
use std::fmt;

/// Object position of a produced statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectTerm {
    pub value: String,
    pub is_literal: bool,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl ObjectTerm {
    /// A resource reference
    pub fn iri(iri: impl Into<String>) -> Self {
        Self {
            value: iri.into(),
            is_literal: false,
            datatype: None,
            language: None,
        }
    }

    /// A typed literal
    pub fn typed(value: String, datatype: &str) -> Self {
        Self {
            value,
            is_literal: true,
            datatype: Some(datatype.to_string()),
            language: None,
        }
    }

    /// A language-tagged literal
    pub fn tagged(value: String, language: String) -> Self {
        Self {
            value,
            is_literal: true,
            datatype: Some(RDF_LANG_STRING.to_string()),
            language: Some(language),
        }
    }
}

/// One produced statement.
///
/// When `subject_triple` is set the subject is the quoted triple
/// `<< s p o >>` and `subject` holds its rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StreamedStatement {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub is_literal: bool,
    pub literal_type: Option<String>,
    pub literal_lang: Option<String>,
    pub subject_triple: Option<[String; 3]>,
}

impl StreamedStatement {
    /// Statement about a plain subject
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: ObjectTerm) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.value,
            is_literal: object.is_literal,
            literal_type: object.datatype,
            literal_lang: object.language,
            subject_triple: None,
        }
    }

    /// Statement whose subject is the quoted triple `(s, p, o)`
    pub fn quoted(quoted: [String; 3], predicate: impl Into<String>, object: ObjectTerm) -> Self {
        let rendering = format!("<< <{}> <{}> <{}> >>", quoted[0], quoted[1], quoted[2]);
        Self {
            subject_triple: Some(quoted),
            ..Self::new(rendering, predicate, object)
        }
    }

    /// The object position as a term
    pub fn object_term(&self) -> ObjectTerm {
        ObjectTerm {
            value: self.object.clone(),
            is_literal: self.is_literal,
            datatype: self.literal_type.clone(),
            language: self.literal_lang.clone(),
        }
    }
}

impl From<&Triple> for StreamedStatement {
    fn from(triple: &Triple) -> Self {
        let object = match &triple.object {
            RdfObject::Literal(l) => match l.language() {
                Some(lang) => ObjectTerm::tagged(l.value().to_string(), lang.to_string()),
                None => ObjectTerm::typed(l.value().to_string(), l.datatype()),
            },
            other => ObjectTerm::iri(other.resource_uri().unwrap_or_default()),
        };
        Self::new(triple.subject.resource_uri(), triple.predicate.as_str(), object)
    }
}

impl fmt::Display for StreamedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = match self.subject_triple {
            Some(_) => self.subject.clone(),
            None => format!("<{}>", self.subject),
        };
        let object = match (self.is_literal, &self.literal_lang, &self.literal_type) {
            (false, _, _) => format!("<{}>", self.object),
            (true, Some(lang), _) => format!("\"{}\"@{}", self.object, lang),
            (true, None, Some(dt)) => format!("\"{}\"^^<{}>", self.object, dt),
            (true, None, None) => format!("\"{}\"", self.object),
        };
        write!(f, "{} <{}> {} .", subject, self.predicate, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::{BlankNode, Literal, RdfPredicate};

    #[test]
    fn test_from_triple() {
        let t = Triple::with_literal(
            "http://ex.org/a",
            "http://ex.org/label",
            Literal::new_language_tagged_literal("Cat", "en").unwrap(),
        )
        .unwrap();
        let s = StreamedStatement::from(&t);
        assert_eq!(s.subject, "http://ex.org/a");
        assert!(s.is_literal);
        assert_eq!(s.literal_lang.as_deref(), Some("en"));
        assert_eq!(s.literal_type.as_deref(), Some(RDF_LANG_STRING));
        assert_eq!(s.to_string(), "<http://ex.org/a> <http://ex.org/label> \"Cat\"@en .");
    }

    #[test]
    fn test_blank_object_uses_bnode_uri() {
        let t = Triple::new(
            crate::rdf::NamedNode::new("http://ex.org/a").unwrap().into(),
            RdfPredicate::new("http://ex.org/p").unwrap(),
            BlankNode::new("b1").unwrap().into(),
        );
        let s = StreamedStatement::from(&t);
        assert_eq!(s.object, "bnode://b1");
        assert!(!s.is_literal);
    }

    #[test]
    fn test_quoted_subject() {
        let s = StreamedStatement::quoted(
            ["http://ex.org/a".into(), "http://ex.org/knows".into(), "http://ex.org/b".into()],
            "http://ex.org/since",
            ObjectTerm::typed("2020".into(), crate::rdf::vocab::xsd::LONG),
        );
        assert_eq!(s.subject, "<< <http://ex.org/a> <http://ex.org/knows> <http://ex.org/b> >>");
        assert_eq!(s.subject_triple.as_ref().map(|t| t[1].as_str()), Some("http://ex.org/knows"));
    }
}
