//! Translation between RDF literals and graph property values
//!
//! Import reads well-known XSD datatypes into native values and keeps
//! everything else as a string. Language tags and custom datatypes survive
//! only when the graph config asks for it, encoded into the string as
//! `value@lang` and `value^^datatype`. Export reverses the encoding, so a
//! pattern literal run through [`canonical_object`] compares equal to what
//! the exporter produces for the same stored value.

use super::statement::ObjectTerm;
use super::types::Literal;
use super::vocab::{self, xsd, RDF_LANG_STRING};
use crate::config::GraphConfig;
use crate::graph::PropertyValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const CUSTOM_TYPE_SEPARATOR: &str = "^^";

/// Translate a parsed literal into a property value
pub fn to_property_value(literal: &Literal, config: &GraphConfig) -> PropertyValue {
    from_lexical(literal.value(), Some(literal.datatype()), literal.language(), config)
}

/// Translate a lexical form with optional datatype and language tag
pub fn from_lexical(
    value: &str,
    datatype: Option<&str>,
    language: Option<&str>,
    config: &GraphConfig,
) -> PropertyValue {
    if let Some(lang) = language.filter(|l| !l.is_empty()) {
        return if config.keep_lang_tag {
            PropertyValue::String(format!("{value}@{lang}"))
        } else {
            PropertyValue::String(value.to_string())
        };
    }

    let datatype = match datatype {
        None => return PropertyValue::String(value.to_string()),
        Some(dt) if dt == xsd::STRING || dt == RDF_LANG_STRING => {
            return PropertyValue::String(value.to_string())
        }
        Some(dt) => dt,
    };

    let (ns, local) = vocab::split_iri(datatype);
    if ns == vocab::XSD_NS {
        if let Some(parsed) = parse_xsd(value, local) {
            return parsed;
        }
    }

    if config.keep_custom_data_types && !is_native_xsd(datatype) {
        PropertyValue::String(format!("{value}{CUSTOM_TYPE_SEPARATOR}{datatype}"))
    } else {
        PropertyValue::String(value.to_string())
    }
}

fn is_native_xsd(datatype: &str) -> bool {
    let (ns, local) = vocab::split_iri(datatype);
    ns == vocab::XSD_NS
        && (xsd::INTEGER_TYPES.contains(&local)
            || xsd::FLOAT_TYPES.contains(&local)
            || matches!(local, "boolean" | "date" | "dateTime"))
}

fn parse_xsd(value: &str, local: &str) -> Option<PropertyValue> {
    let value = value.trim();
    if xsd::INTEGER_TYPES.contains(&local) {
        return value.parse::<i64>().ok().map(PropertyValue::Integer);
    }
    if xsd::FLOAT_TYPES.contains(&local) {
        return value.parse::<f64>().ok().map(PropertyValue::Float);
    }
    match local {
        "boolean" => match value {
            "true" | "1" => Some(PropertyValue::Boolean(true)),
            "false" | "0" => Some(PropertyValue::Boolean(false)),
            _ => None,
        },
        "date" => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(PropertyValue::Date),
        "dateTime" => DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
            .map(PropertyValue::DateTime),
        _ => None,
    }
}

/// Render a scalar property value as an RDF literal term.
///
/// Arrays are expanded by the caller, one term per element.
pub fn to_object_term(value: &PropertyValue, config: &GraphConfig) -> ObjectTerm {
    match value {
        PropertyValue::String(s) => string_term(s, config),
        PropertyValue::Integer(i) => ObjectTerm::typed(i.to_string(), xsd::LONG),
        PropertyValue::Float(f) => ObjectTerm::typed(format!("{f:?}"), xsd::DOUBLE),
        PropertyValue::Boolean(b) => ObjectTerm::typed(b.to_string(), xsd::BOOLEAN),
        PropertyValue::Date(d) => ObjectTerm::typed(d.format("%Y-%m-%d").to_string(), xsd::DATE),
        PropertyValue::DateTime(dt) => ObjectTerm::typed(
            dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            xsd::DATE_TIME,
        ),
        PropertyValue::Array(items) => {
            // arrays of arrays are rejected by the store; render the first element
            match items.first() {
                Some(first) => to_object_term(first, config),
                None => ObjectTerm::typed(String::new(), xsd::STRING),
            }
        }
    }
}

fn string_term(s: &str, config: &GraphConfig) -> ObjectTerm {
    if config.keep_lang_tag {
        if let Some((value, lang)) = split_lang_tag(s) {
            return ObjectTerm::tagged(value.to_string(), lang.to_ascii_lowercase());
        }
    }
    if config.keep_custom_data_types {
        if let Some((value, datatype)) = s.rsplit_once(CUSTOM_TYPE_SEPARATOR) {
            if datatype.contains(':') {
                return ObjectTerm::typed(value.to_string(), datatype);
            }
        }
    }
    ObjectTerm::typed(s.to_string(), xsd::STRING)
}

/// Split `value@lang` where `lang` is a BCP 47 shaped tag
fn split_lang_tag(s: &str) -> Option<(&str, &str)> {
    let (value, tag) = s.rsplit_once('@')?;
    let mut subtags = tag.split('-');
    let primary = subtags.next()?;
    let primary_ok = (1..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok = subtags.all(|t| (1..=8).contains(&t.len()) && t.chars().all(|c| c.is_ascii_alphanumeric()));
    (primary_ok && rest_ok).then_some((value, tag))
}

/// Canonical term for a literal given in a query pattern: the term the
/// exporter would produce for the value the importer would have stored.
pub fn canonical_object(
    value: &str,
    datatype: Option<&str>,
    language: Option<&str>,
    config: &GraphConfig,
) -> (PropertyValue, ObjectTerm) {
    let stored = from_lexical(value, datatype, language, config);
    let term = to_object_term(&stored, config);
    (stored, term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::NamedNode;

    fn typed(value: &str, dt: &str) -> Literal {
        Literal::new_typed_literal(value, NamedNode::new(dt).unwrap())
    }

    #[test]
    fn test_numeric_and_boolean_literals() {
        let config = GraphConfig::default();
        assert_eq!(
            to_property_value(&typed("42", "http://www.w3.org/2001/XMLSchema#integer"), &config),
            PropertyValue::Integer(42)
        );
        assert_eq!(
            to_property_value(&typed("2.5", "http://www.w3.org/2001/XMLSchema#decimal"), &config),
            PropertyValue::Float(2.5)
        );
        assert_eq!(
            to_property_value(&typed("true", xsd::BOOLEAN), &config),
            PropertyValue::Boolean(true)
        );
        // unparseable numbers fall back to strings
        assert_eq!(
            to_property_value(&typed("forty", xsd::LONG), &config),
            PropertyValue::String("forty".into())
        );
    }

    #[test]
    fn test_temporal_literals() {
        let config = GraphConfig::default();
        let date = to_property_value(&typed("2024-02-29", xsd::DATE), &config);
        assert_eq!(date, PropertyValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));

        let dt = to_property_value(&typed("2024-02-29T10:30:00Z", xsd::DATE_TIME), &config);
        let term = to_object_term(&dt, &config);
        assert_eq!(term.value, "2024-02-29T10:30:00");
        assert_eq!(term.datatype.as_deref(), Some(xsd::DATE_TIME));
    }

    #[test]
    fn test_language_tags() {
        let cat = Literal::new_language_tagged_literal("Cat", "en").unwrap();

        let plain = GraphConfig::default();
        assert_eq!(to_property_value(&cat, &plain), PropertyValue::String("Cat".into()));

        let keep = GraphConfig {
            keep_lang_tag: true,
            ..GraphConfig::default()
        };
        let stored = to_property_value(&cat, &keep);
        assert_eq!(stored, PropertyValue::String("Cat@en".into()));

        let term = to_object_term(&stored, &keep);
        assert_eq!(term, ObjectTerm::tagged("Cat".into(), "en".into()));

        // an email address is not a tagged literal
        let email = to_object_term(&PropertyValue::String("me@example.org".into()), &keep);
        assert_eq!(email.language, None);
    }

    #[test]
    fn test_custom_datatypes() {
        let lit = typed("12", "http://ex.org/dt#celsius");
        assert_eq!(
            to_property_value(&lit, &GraphConfig::default()),
            PropertyValue::String("12".into())
        );

        let keep = GraphConfig {
            keep_custom_data_types: true,
            ..GraphConfig::default()
        };
        let stored = to_property_value(&lit, &keep);
        assert_eq!(stored, PropertyValue::String("12^^http://ex.org/dt#celsius".into()));
        let term = to_object_term(&stored, &keep);
        assert_eq!(term.value, "12");
        assert_eq!(term.datatype.as_deref(), Some("http://ex.org/dt#celsius"));
    }

    #[test]
    fn test_canonical_object_matches_export() {
        let config = GraphConfig::default();
        let (stored, term) = canonical_object("7", Some("http://www.w3.org/2001/XMLSchema#int"), None, &config);
        assert_eq!(stored, PropertyValue::Integer(7));
        assert_eq!(term, ObjectTerm::typed("7".into(), xsd::LONG));

        let (_, float) = canonical_object("3", Some(xsd::DOUBLE), None, &config);
        assert_eq!(float.value, "3.0");
    }
}
