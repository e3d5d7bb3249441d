//! Vocabulary IRIs and IRI helpers

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const SKOSXL_NS: &str = "http://www.w3.org/2008/05/skos-xl#";
pub const SCHEMA_NS: &str = "http://schema.org/";
pub const SHACL_NS: &str = "http://www.w3.org/ns/shacl#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

    /// Local names of the datatypes read as 64-bit integers
    pub const INTEGER_TYPES: &[&str] = &[
        "integer",
        "long",
        "int",
        "short",
        "byte",
        "nonNegativeInteger",
        "nonPositiveInteger",
        "negativeInteger",
        "positiveInteger",
        "unsignedLong",
        "unsignedInt",
        "unsignedShort",
        "unsignedByte",
    ];

    /// Local names of the datatypes read as doubles
    pub const FLOAT_TYPES: &[&str] = &["decimal", "double", "float"];
}

pub mod skos {
    pub const CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";
    pub const BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";
    pub const NARROWER: &str = "http://www.w3.org/2004/02/skos/core#narrower";
    pub const RELATED: &str = "http://www.w3.org/2004/02/skos/core#related";
    pub const PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
    pub const ALT_LABEL: &str = "http://www.w3.org/2004/02/skos/core#altLabel";
    pub const HIDDEN_LABEL: &str = "http://www.w3.org/2004/02/skos/core#hiddenLabel";
}

pub mod skosxl {
    pub const PREF_LABEL: &str = "http://www.w3.org/2008/05/skos-xl#prefLabel";
    pub const ALT_LABEL: &str = "http://www.w3.org/2008/05/skos-xl#altLabel";
    pub const HIDDEN_LABEL: &str = "http://www.w3.org/2008/05/skos-xl#hiddenLabel";
    pub const LITERAL_FORM: &str = "http://www.w3.org/2008/05/skos-xl#literalForm";
}

/// URI scheme given to blank nodes
pub const BNODE_PREFIX: &str = "bnode://";

/// Namespace of subjects minted for nodes that carry no `uri`
pub const BASE_INDIVIDUAL_NS: &str = "neo4j://graph.individuals#";

/// Default namespace for labels, keys and types that have no IRI of their own
pub const BASE_SCHEMA_NS: &str = "neo4j://graph.schema#";
pub const BASE_SCHEMA_PREFIX: &str = "n4sch";

/// Label carried by every imported resource node
pub const RESOURCE_LABEL: &str = "Resource";

/// Unique key of imported resource nodes
pub const URI_KEY: &str = "uri";

/// Labels of bookkeeping nodes that never show up as data
pub const NS_PREFIX_DEF_LABEL: &str = "_NsPrefDef";
pub const GRAPH_CONFIG_LABEL: &str = "_GraphConfig";
pub const MAPPING_DEF_LABEL: &str = "_MapDef";
pub const MAPPING_NS_LABEL: &str = "_MapNs";
pub const VALIDATOR_CONFIG_LABEL: &str = "_n10sValidatorConfig";

pub const RESERVED_LABELS: &[&str] = &[
    RESOURCE_LABEL,
    NS_PREFIX_DEF_LABEL,
    GRAPH_CONFIG_LABEL,
    MAPPING_DEF_LABEL,
    MAPPING_NS_LABEL,
    VALIDATOR_CONFIG_LABEL,
];

/// Bookkeeping labels: every reserved label except `Resource`
pub fn is_bookkeeping_label(label: &str) -> bool {
    label != RESOURCE_LABEL && RESERVED_LABELS.contains(&label)
}

/// Split an IRI into namespace and local name.
///
/// The namespace ends at the last `#`, else the last `/`, else the last `:`.
/// Without any of them the whole IRI is the local name.
pub fn split_iri(iri: &str) -> (&str, &str) {
    let cut = iri
        .rfind('#')
        .or_else(|| iri.rfind('/'))
        .or_else(|| iri.rfind(':'))
        .map_or(0, |i| i + 1);
    iri.split_at(cut)
}

/// Local name of an IRI
pub fn local_name(iri: &str) -> &str {
    split_iri(iri).1
}

/// True for URIs standing in for blank nodes
pub fn is_blank_uri(uri: &str) -> bool {
    uri.starts_with(BNODE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_iri() {
        assert_eq!(split_iri(RDF_TYPE), (RDF_NS, "type"));
        assert_eq!(split_iri("http://schema.org/Person"), ("http://schema.org/", "Person"));
        assert_eq!(split_iri("urn:isbn:123"), ("urn:isbn:", "123"));
        assert_eq!(split_iri("plain"), ("", "plain"));
        assert_eq!(split_iri("http://ex.org/a#"), ("http://ex.org/a#", ""));
        assert_eq!(local_name(skos::BROADER), "broader");
    }

    #[test]
    fn test_reserved_labels() {
        assert!(is_bookkeeping_label("_NsPrefDef"));
        assert!(is_bookkeeping_label("_GraphConfig"));
        assert!(!is_bookkeeping_label("Resource"));
        assert!(!is_bookkeeping_label("ns0__Person"));
        assert!(is_blank_uri("bnode://x1"));
        assert!(!is_blank_uri("http://x1"));
    }
}
