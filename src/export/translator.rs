//! Answering triple patterns from the property graph
//!
//! Every node yields one `rdf:type` statement per data label and one
//! statement per property element. Every relationship yields one statement,
//! plus, with `include_rel_properties`, one statement per relationship
//! property whose subject is the quoted relationship triple.
//!
//! Which part of the graph is visited depends on what the pattern binds:
//!
//! | subject | predicate  | object  | visited                                  |
//! |---------|------------|---------|------------------------------------------|
//! | bound   | any        | any     | the subject node and its outgoing edges  |
//! | -       | `rdf:type` | -       | all nodes                                |
//! | -       | `rdf:type` | IRI     | nodes with the matching label            |
//! | -       | bound      | -       | nodes with the key, edges of the type    |
//! | -       | bound      | IRI     | incoming edges of the type at the object |
//! | -       | bound      | literal | nodes with the key                       |
//! | -       | -          | IRI     | incoming edges at the object             |
//! | -       | -          | literal | all nodes (full scan)                    |
//! | -       | -          | -       | everything, lazily                       |

use super::pattern::{PatternObject, TriplePattern};
use super::vocabulary::ExportVocabulary;
use super::ExportResult;
use crate::config::{ExportOptions, GraphConfig};
use crate::graph::{Direction, Edge, GraphStore, Node, NodeId};
use crate::namespace::NamespacePrefixRegistry;
use crate::rdf::literal::{canonical_object, to_object_term};
use crate::rdf::vocab::{self, BASE_INDIVIDUAL_NS, RDF_TYPE, RESOURCE_LABEL, URI_KEY};
use crate::rdf::{ObjectTerm, StreamedStatement};
use indexmap::IndexSet;
use tracing::{debug, warn};

/// Statements produced for a pattern
pub type Statements<'a> = Box<dyn Iterator<Item = StreamedStatement> + 'a>;

/// Translates triple patterns into graph lookups
pub struct TriplePatternTranslator<'g> {
    store: &'g GraphStore,
    config: GraphConfig,
    vocab: ExportVocabulary,
    include_rel_properties: bool,
}

/// A pattern with its names resolved against the graph
struct Resolved<'p> {
    subject: Option<&'p str>,
    predicate: Option<&'p str>,
    object: Option<ObjectTerm>,
}

impl Resolved<'_> {
    fn accepts(&self, statement: &StreamedStatement) -> bool {
        if let Some(subject) = self.subject {
            let quoted_subject = statement.subject_triple.as_ref().map(|t| t[0].as_str());
            if statement.subject != subject && quoted_subject != Some(subject) {
                return false;
            }
        }
        if let Some(predicate) = self.predicate {
            if statement.predicate != predicate {
                return false;
            }
        }
        match &self.object {
            Some(object) => statement.object_term() == *object,
            None => true,
        }
    }
}

impl<'g> TriplePatternTranslator<'g> {
    /// Read the graph config and prefixes from `store`
    pub fn new(store: &'g GraphStore, options: ExportOptions) -> ExportResult<Self> {
        let persisted = GraphConfig::load(store)?;
        let registry = NamespacePrefixRegistry::load(store)?;
        let vocab = ExportVocabulary::new(persisted.as_ref(), registry, options.mappings, options.mapped_only);
        Ok(Self {
            store,
            config: persisted.unwrap_or_default(),
            vocab,
            include_rel_properties: options.include_rel_properties,
        })
    }

    /// Statements matching `pattern`
    pub fn stream<'a>(&'a self, pattern: &'a TriplePattern) -> Statements<'a> {
        let resolved = Resolved {
            subject: pattern.subject.as_deref(),
            predicate: pattern.predicate.as_deref(),
            object: pattern.object.as_ref().map(|o| self.object_term(o)),
        };

        if pattern.is_wildcard() {
            warn!("fully unbound pattern, streaming the whole graph");
            return Box::new(self.all_statements());
        }

        let candidates = match (&pattern.subject, &pattern.predicate, &pattern.object) {
            (Some(subject), predicate, object) => self.subject_statements(subject, predicate.as_deref(), object.as_ref()),
            (None, Some(predicate), object) if predicate == RDF_TYPE => self.type_statements(object.as_ref()),
            (None, Some(predicate), object) => self.predicate_statements(predicate, object.as_ref()),
            (None, None, Some(PatternObject::Iri(iri))) => self.incoming_statements(iri, None),
            (None, None, Some(PatternObject::Literal { .. })) => {
                warn!("pattern binds only a literal object, scanning all node properties");
                self.data_nodes().flat_map(|n| self.property_statements(n, None)).collect()
            }
            (None, None, None) => Vec::new(),
        };

        let matched: IndexSet<StreamedStatement> = candidates.into_iter().filter(|s| resolved.accepts(s)).collect();
        debug!(statements = matched.len(), "pattern answered");
        Box::new(matched.into_iter())
    }

    /// Statements about the node identified by `uri`. With `include_context`
    /// the statements pointing at it are included as well.
    pub fn stream_node_by_uri(&self, uri: &str, include_context: bool) -> Vec<StreamedStatement> {
        let Some(node) = self.resolve(uri) else {
            return Vec::new();
        };
        let mut statements: IndexSet<StreamedStatement> = self.node_statements(node).into_iter().collect();
        for edge in self.store.relationships(node.id, Direction::Outgoing, None) {
            statements.extend(self.edge_statements(edge));
        }
        if include_context {
            for edge in self.store.relationships(node.id, Direction::Incoming, None) {
                statements.extend(self.edge_statements(edge));
            }
        }
        statements.into_iter().collect()
    }

    // ==================== Strategies ====================

    fn subject_statements(
        &self,
        subject: &str,
        predicate: Option<&str>,
        object: Option<&PatternObject>,
    ) -> Vec<StreamedStatement> {
        let Some(node) = self.resolve(subject) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if predicate.is_none() || predicate == Some(RDF_TYPE) {
            out.extend(self.type_statements_of(node));
        }
        if predicate == Some(RDF_TYPE) {
            return out;
        }

        let name = match predicate {
            Some(p) => match self.vocab.iri_to_name(p) {
                Some(name) => Some(name),
                None => return out,
            },
            None => None,
        };
        if !matches!(object, Some(PatternObject::Iri(_))) {
            out.extend(self.property_statements(node, name.as_deref()));
        }
        // relationship property statements are keyed by property, not by type
        let edge_type = if self.include_rel_properties { None } else { name.as_deref() };
        if self.include_rel_properties || !matches!(object, Some(PatternObject::Literal { .. })) {
            for edge in self.store.relationships(node.id, Direction::Outgoing, edge_type) {
                out.extend(self.edge_statements(edge));
            }
        }
        out
    }

    fn type_statements(&self, object: Option<&PatternObject>) -> Vec<StreamedStatement> {
        match object {
            None => self.data_nodes().flat_map(|n| self.type_statements_of(n)).collect(),
            Some(PatternObject::Iri(class)) => match self.vocab.iri_to_name(class) {
                Some(label) => self
                    .store
                    .nodes_by_label(&label)
                    .filter(|n| is_data_node(n))
                    .flat_map(|n| self.type_statements_of(n))
                    .collect(),
                None => Vec::new(),
            },
            Some(PatternObject::Literal { .. }) => Vec::new(),
        }
    }

    fn predicate_statements(&self, predicate: &str, object: Option<&PatternObject>) -> Vec<StreamedStatement> {
        let Some(name) = self.vocab.iri_to_name(predicate) else {
            return Vec::new();
        };
        match object {
            None => {
                let properties = self
                    .data_nodes()
                    .filter(|n| n.has_property(&name))
                    .flat_map(|n| self.property_statements(n, Some(&name)));
                let relationships = self.store.edges_by_type(&name).flat_map(|e| self.edge_statements(e));
                properties.chain(relationships).collect()
            }
            Some(PatternObject::Iri(iri)) => self.incoming_statements(iri, Some(&name)),
            Some(PatternObject::Literal { .. }) => self
                .data_nodes()
                .filter(|n| n.has_property(&name))
                .flat_map(|n| self.property_statements(n, Some(&name)))
                .collect(),
        }
    }

    fn incoming_statements(&self, object: &str, edge_type: Option<&str>) -> Vec<StreamedStatement> {
        let Some(target) = self.resolve(object) else {
            return Vec::new();
        };
        self.store
            .relationships(target.id, Direction::Incoming, edge_type)
            .flat_map(|e| self.edge_statements(e))
            .collect()
    }

    fn all_statements(&self) -> impl Iterator<Item = StreamedStatement> + '_ {
        let nodes = self.data_nodes().flat_map(move |n| self.node_statements(n));
        let edges = self.store.all_edges().flat_map(move |e| self.edge_statements(e));
        nodes.chain(edges)
    }

    // ==================== Conversion ====================

    fn node_statements(&self, node: &Node) -> Vec<StreamedStatement> {
        let mut out = self.type_statements_of(node);
        out.extend(self.property_statements(node, None));
        out
    }

    fn type_statements_of(&self, node: &Node) -> Vec<StreamedStatement> {
        let subject = self.subject_iri(node);
        node.labels
            .iter()
            .filter(|l| l.as_str() != RESOURCE_LABEL && !vocab::is_bookkeeping_label(l.as_str()))
            .filter_map(|l| self.vocab.name_to_iri(l.as_str()))
            .map(|class| StreamedStatement::new(subject.clone(), RDF_TYPE, ObjectTerm::iri(class)))
            .collect()
    }

    /// Property statements of `node`, optionally for one key only
    fn property_statements(&self, node: &Node, key: Option<&str>) -> Vec<StreamedStatement> {
        let subject = self.subject_iri(node);
        let mut out = Vec::new();
        for (name, value) in &node.properties {
            if name == URI_KEY || key.is_some_and(|k| k != name) {
                continue;
            }
            let Some(predicate) = self.vocab.name_to_iri(name) else {
                continue;
            };
            for element in value.elements() {
                out.push(StreamedStatement::new(
                    subject.clone(),
                    predicate.clone(),
                    to_object_term(element, &self.config),
                ));
            }
        }
        out
    }

    fn edge_statements(&self, edge: &Edge) -> Vec<StreamedStatement> {
        let (Some(source), Some(target)) = (self.store.get_node(edge.source), self.store.get_node(edge.target)) else {
            return Vec::new();
        };
        let Some(predicate) = self.vocab.name_to_iri(edge.edge_type.as_str()) else {
            return Vec::new();
        };
        let (s, o) = (self.subject_iri(source), self.subject_iri(target));
        let mut out = vec![StreamedStatement::new(s.clone(), predicate.clone(), ObjectTerm::iri(o.clone()))];
        if self.include_rel_properties {
            let quoted = [s, predicate, o];
            for (name, value) in &edge.properties {
                let Some(property) = self.vocab.name_to_iri(name) else {
                    continue;
                };
                for element in value.elements() {
                    out.push(StreamedStatement::quoted(
                        quoted.clone(),
                        property.clone(),
                        to_object_term(element, &self.config),
                    ));
                }
            }
        }
        out
    }

    // ==================== Helpers ====================

    fn data_nodes(&self) -> impl Iterator<Item = &'g Node> + 'g {
        self.store.all_nodes().filter(|n| is_data_node(n))
    }

    fn subject_iri(&self, node: &Node) -> String {
        match node.get_property(URI_KEY).and_then(|v| v.as_string()) {
            Some(uri) => uri.to_string(),
            None => format!("{BASE_INDIVIDUAL_NS}{}", node.id.as_u64()),
        }
    }

    /// Node a subject or object IRI refers to
    fn resolve(&self, uri: &str) -> Option<&'g Node> {
        if let Some(id) = uri.strip_prefix(BASE_INDIVIDUAL_NS) {
            let id = id.parse::<u64>().ok()?;
            return self.store.get_node(NodeId::new(id)).filter(|n| is_data_node(n));
        }
        let id = self.store.find_node(RESOURCE_LABEL, URI_KEY, uri)?;
        self.store.get_node(id)
    }

    /// The term the exporter would produce for a pattern object
    fn object_term(&self, object: &PatternObject) -> ObjectTerm {
        match object {
            PatternObject::Iri(iri) => ObjectTerm::iri(iri.clone()),
            PatternObject::Literal {
                value,
                datatype,
                language,
            } => canonical_object(value, datatype.as_deref(), language.as_deref(), &self.config).1,
        }
    }
}

fn is_data_node(node: &Node) -> bool {
    !node.labels.iter().any(|l| vocab::is_bookkeeping_label(l.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, PropertyValue};
    use crate::rdf::vocab::xsd;

    /// A plain property graph: no persisted config, no prefixes
    fn movie_graph() -> GraphStore {
        let mut store = GraphStore::new();
        let keanu = store.create_node("Person");
        store.set_node_property(keanu, "name", "Keanu").unwrap();
        store.set_node_property(keanu, "born", 1964i64).unwrap();
        let matrix = store.create_node("Movie");
        store.set_node_property(matrix, "title", "The Matrix").unwrap();
        let e = store.create_edge(keanu, matrix, "ACTED_IN").unwrap();
        store.set_edge_property(e, "role", "Neo").unwrap();
        store
    }

    fn individual(id: u64) -> String {
        format!("{BASE_INDIVIDUAL_NS}{id}")
    }

    fn schema(name: &str) -> String {
        format!("{}{name}", vocab::BASE_SCHEMA_NS)
    }

    #[test]
    fn test_full_scan_of_plain_graph() {
        let store = movie_graph();
        let translator = TriplePatternTranslator::new(&store, ExportOptions::default()).unwrap();
        let all: Vec<_> = translator.stream(&TriplePattern::any()).collect();
        // 2 types, 3 properties, 1 relationship
        assert_eq!(all.len(), 6);
        assert!(all.iter().any(|s| s.subject == individual(0)
            && s.predicate == RDF_TYPE
            && s.object == schema("Person")));
        let born = all.iter().find(|s| s.predicate == schema("born")).unwrap();
        assert_eq!(born.literal_type.as_deref(), Some(xsd::LONG));
    }

    #[test]
    fn test_subject_bound() {
        let store = movie_graph();
        let translator = TriplePatternTranslator::new(&store, ExportOptions::default()).unwrap();

        let pattern = TriplePattern::any().with_subject(individual(0));
        assert_eq!(translator.stream(&pattern).count(), 4);

        let pattern = pattern.with_predicate(schema("ACTED_IN"));
        let found: Vec<_> = translator.stream(&pattern).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].object, individual(1));

        let pattern = TriplePattern::any()
            .with_subject(individual(0))
            .with_object(PatternObject::typed("1964", "http://www.w3.org/2001/XMLSchema#integer"));
        let found: Vec<_> = translator.stream(&pattern).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].predicate, schema("born"));
    }

    #[test]
    fn test_predicate_and_object_strategies() {
        let store = movie_graph();
        let translator = TriplePatternTranslator::new(&store, ExportOptions::default()).unwrap();

        let types = TriplePattern::any().with_predicate(RDF_TYPE).with_object(PatternObject::iri(schema("Movie")));
        let found: Vec<_> = translator.stream(&types).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, individual(1));

        let incoming = TriplePattern::any().with_object(PatternObject::iri(individual(1)));
        assert_eq!(translator.stream(&incoming).count(), 1);

        let by_literal = TriplePattern::any().with_object(PatternObject::literal("The Matrix"));
        let found: Vec<_> = translator.stream(&by_literal).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].predicate, schema("title"));

        let by_key = TriplePattern::any().with_predicate(schema("name"));
        assert_eq!(translator.stream(&by_key).count(), 1);
    }

    #[test]
    fn test_relationship_properties_are_quoted() {
        let store = movie_graph();
        let options = ExportOptions {
            include_rel_properties: true,
            ..ExportOptions::default()
        };
        let translator = TriplePatternTranslator::new(&store, options).unwrap();
        let all: Vec<_> = translator.stream(&TriplePattern::any()).collect();
        let role = all.iter().find(|s| s.subject_triple.is_some()).unwrap();
        assert_eq!(role.predicate, schema("role"));
        assert_eq!(
            role.subject_triple.as_ref().unwrap(),
            &[individual(0), schema("ACTED_IN"), individual(1)]
        );
        assert_eq!(role.object, "Neo");
    }

    #[test]
    fn test_arrays_expand_and_bookkeeping_is_hidden() {
        let mut store = GraphStore::new();
        let id = store
            .create_node_with_properties(
                [Label::new(RESOURCE_LABEL), Label::new("Tag")],
                [
                    (URI_KEY.to_string(), PropertyValue::from("http://ex.org/t")),
                    (
                        "alias".to_string(),
                        PropertyValue::Array(vec!["a".into(), "b".into()]),
                    ),
                ]
                .into_iter()
                .collect(),
            )
            .unwrap();
        store.create_node(vocab::NS_PREFIX_DEF_LABEL);

        let translator = TriplePatternTranslator::new(&store, ExportOptions::default()).unwrap();
        let all: Vec<_> = translator.stream(&TriplePattern::any()).collect();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|s| s.subject == "http://ex.org/t"));
        assert_eq!(translator.stream_node_by_uri("http://ex.org/t", false).len(), 3);
        assert!(translator.stream_node_by_uri(&individual(id.as_u64() + 1), false).is_empty());
    }
}
