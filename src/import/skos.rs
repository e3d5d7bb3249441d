//! SKOS concept schemes
//!
//! Only concepts and their links are mapped:
//!
//! | Statement | Graph |
//! |---|---|
//! | `c rdf:type skos:Concept` | class label on `c`, `name` = local name |
//! | `a skos:broader b` | `a -[SCO]-> b` |
//! | `a skos:narrower b` | `b -[SCO]-> a` |
//! | `a skos:related b` | `a -[RELATED]-> b` |
//! | `c skos:prefLabel "l"` (alt, hidden) | property on `c` |
//! | `c skosxl:prefLabel x` + `x skosxl:literalForm "l"` | same as `skos:prefLabel` |
//!
//! The two SKOS-XL legs may arrive in any order and in different batches.

use super::batch::Batch;
use super::router::{Router, Vocabulary};
use super::ImportResult;
use crate::graph::PropertyValue;
use crate::rdf::types::Literal;
use crate::rdf::vocab::{self, skos, skosxl, RDF_TYPE};
use crate::rdf::{literal, RdfObject, RdfSubject, Triple};
use rustc_hash::FxHashMap;
use tracing::debug;

const NAME_KEY: &str = "name";

/// Router for SKOS vocabularies
#[derive(Debug, Default)]
pub struct SkosRouter {
    /// label resource -> (concept, equivalent SKOS label predicate)
    first_legs: FxHashMap<String, (String, &'static str)>,
    /// label resource -> literal form
    second_legs: FxHashMap<String, Literal>,
}

impl SkosRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn instantiate(&self, concept: &str, vocab: &mut Vocabulary<'_>, batch: &mut Batch) -> ImportResult<()> {
        let label = vocab.handle_schema_name(&vocab.config().class_label_name)?;
        batch.add_label(concept, label);
        self.set_name(concept, vocab, batch)
    }

    fn set_name(&self, concept: &str, vocab: &mut Vocabulary<'_>, batch: &mut Batch) -> ImportResult<()> {
        let key = vocab.handle_schema_name(NAME_KEY)?;
        batch.set_property(concept, key, PropertyValue::String(vocab::local_name(concept).to_string()), false);
        Ok(())
    }

    fn relate(
        &self,
        from: &str,
        rel_name: &str,
        to: &str,
        vocab: &mut Vocabulary<'_>,
        batch: &mut Batch,
    ) -> ImportResult<()> {
        self.set_name(from, vocab, batch)?;
        self.set_name(to, vocab, batch)?;
        let rel_type = vocab.handle_schema_name(rel_name)?;
        batch.add_statement(from, rel_type, to);
        Ok(())
    }

    fn set_label(
        &self,
        concept: &str,
        predicate: &str,
        value: &Literal,
        vocab: &mut Vocabulary<'_>,
        batch: &mut Batch,
    ) -> ImportResult<()> {
        let key = vocab.handle_iri(predicate)?;
        let config = vocab.config();
        batch.set_property(
            concept,
            key,
            literal::to_property_value(value, config),
            config.is_multivalued(predicate),
        );
        Ok(())
    }
}

fn skos_equivalent(xl_predicate: &str) -> Option<&'static str> {
    match xl_predicate {
        skosxl::PREF_LABEL => Some(skos::PREF_LABEL),
        skosxl::ALT_LABEL => Some(skos::ALT_LABEL),
        skosxl::HIDDEN_LABEL => Some(skos::HIDDEN_LABEL),
        _ => None,
    }
}

impl Router for SkosRouter {
    fn start(&mut self, vocab: &mut Vocabulary<'_>) -> ImportResult<()> {
        let config = vocab.config();
        if config.handle_vocab_uris.is_shorten() {
            vocab.bind(&config.base_schema_prefix, &config.base_schema_namespace)?;
            debug!(prefix = %config.base_schema_prefix, "schema prefix bound");
        }
        Ok(())
    }

    fn classify(&mut self, triple: &Triple, vocab: &mut Vocabulary<'_>, batch: &mut Batch) -> ImportResult<bool> {
        let predicate = triple.predicate.as_str();
        let subject = match &triple.subject {
            RdfSubject::NamedNode(n) => Some(n.as_str()),
            RdfSubject::BlankNode(_) => None,
        };

        match (predicate, subject, &triple.object) {
            (RDF_TYPE, Some(concept), RdfObject::NamedNode(class)) if class.as_str() == skos::CONCEPT => {
                self.instantiate(concept, vocab, batch)?;
            }
            (skos::BROADER, Some(narrower), RdfObject::NamedNode(broader)) => {
                let rel = &vocab.config().subclass_of_rel_name;
                self.relate(narrower, rel, broader.as_str(), vocab, batch)?;
            }
            (skos::NARROWER, Some(broader), RdfObject::NamedNode(narrower)) => {
                let rel = &vocab.config().subclass_of_rel_name;
                self.relate(narrower.as_str(), rel, broader, vocab, batch)?;
            }
            (skos::RELATED, Some(a), RdfObject::NamedNode(b)) => {
                let rel = &vocab.config().related_concept_rel_name;
                self.relate(a, rel, b.as_str(), vocab, batch)?;
            }
            (skos::PREF_LABEL | skos::ALT_LABEL | skos::HIDDEN_LABEL, Some(concept), RdfObject::Literal(value)) => {
                self.instantiate(concept, vocab, batch)?;
                self.set_label(concept, predicate, value, vocab, batch)?;
            }
            (skosxl::PREF_LABEL | skosxl::ALT_LABEL | skosxl::HIDDEN_LABEL, Some(concept), object) => {
                let (Some(label_resource), Some(equivalent)) = (object.resource_uri(), skos_equivalent(predicate))
                else {
                    return Ok(false);
                };
                self.instantiate(concept, vocab, batch)?;
                match self.second_legs.remove(&label_resource) {
                    Some(form) => self.set_label(concept, equivalent, &form, vocab, batch)?,
                    None => {
                        self.first_legs.insert(label_resource, (concept.to_string(), equivalent));
                    }
                }
            }
            (skosxl::LITERAL_FORM, _, RdfObject::Literal(form)) => {
                let label_resource = triple.subject.resource_uri();
                match self.first_legs.remove(&label_resource) {
                    Some((concept, equivalent)) => {
                        // the concept may belong to an earlier batch
                        self.instantiate(&concept, vocab, batch)?;
                        self.set_label(&concept, equivalent, form, vocab, batch)?;
                    }
                    None => {
                        self.second_legs.insert(label_resource, form.clone());
                    }
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn unapplied_at_end(&self) -> u64 {
        (self.first_legs.len() + self.second_legs.len()) as u64
    }
}
