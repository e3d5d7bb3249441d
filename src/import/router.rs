//! Statement classification
//!
//! A [`Router`] decides what a parsed statement means for the graph and
//! buffers it in the current [`Batch`]. How the buffered deltas are then
//! applied is up to the processor's [`ApplyPolicy`](super::policy::ApplyPolicy),
//! so the same router serves both loading and deleting.

use super::batch::Batch;
use super::ImportResult;
use crate::config::{GraphConfig, VocabUriHandling};
use crate::namespace::{NamespacePrefixRegistry, NamespaceResult};
use crate::rdf::vocab::{self, RDF_TYPE, URI_KEY};
use crate::rdf::{literal, RdfObject, Triple};
use tracing::warn;

/// Turns vocabulary IRIs into graph names under the configured handling mode
pub struct Vocabulary<'a> {
    config: &'a GraphConfig,
    registry: &'a mut NamespacePrefixRegistry,
}

impl<'a> Vocabulary<'a> {
    pub fn new(config: &'a GraphConfig, registry: &'a mut NamespacePrefixRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &'a GraphConfig {
        self.config
    }

    /// Label, property key or relationship type for `iri`
    pub fn handle_iri(&mut self, iri: &str) -> NamespaceResult<String> {
        match self.config.handle_vocab_uris {
            VocabUriHandling::Shorten | VocabUriHandling::ShortenStrict => {
                let strict = self.config.handle_vocab_uris == VocabUriHandling::ShortenStrict;
                let (ns, local) = vocab::split_iri(iri);
                let prefix = self.registry.get_prefix_or_add(ns, strict)?;
                Ok(format!("{prefix}__{local}"))
            }
            VocabUriHandling::Ignore => Ok(vocab::local_name(iri).to_string()),
            VocabUriHandling::Keep => Ok(iri.to_string()),
        }
    }

    /// Graph name for a term of the base schema namespace
    pub fn handle_schema_name(&mut self, name: &str) -> NamespaceResult<String> {
        let iri = format!("{}{}", self.config.base_schema_namespace, name);
        self.handle_iri(&iri)
    }

    /// Bind a prefix explicitly
    pub fn bind(&mut self, prefix: &str, ns: &str) -> NamespaceResult<()> {
        self.registry.add(prefix, ns)
    }
}

/// Classifies parsed statements into batch deltas
pub trait Router {
    /// Called once before the first statement
    fn start(&mut self, _vocab: &mut Vocabulary<'_>) -> ImportResult<()> {
        Ok(())
    }

    /// Buffer `triple`. Returns whether it was mapped.
    fn classify(&mut self, triple: &Triple, vocab: &mut Vocabulary<'_>, batch: &mut Batch) -> ImportResult<bool>;

    /// Mapped statements still waiting for a partner at end of stream
    fn unapplied_at_end(&self) -> u64 {
        0
    }
}

/// Generic RDF: types become labels, literals become properties, every
/// other statement becomes a relationship.
///
/// A literal whose property key would be `uri` is left unmapped, since that
/// key holds the resource identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRouter;

impl Router for DirectRouter {
    fn classify(&mut self, triple: &Triple, vocab: &mut Vocabulary<'_>, batch: &mut Batch) -> ImportResult<bool> {
        let subject = triple.subject.resource_uri();
        let predicate = triple.predicate.as_str();

        match &triple.object {
            RdfObject::NamedNode(class) if predicate == RDF_TYPE => {
                let label = vocab.handle_iri(class.as_str())?;
                batch.add_label(&subject, label);
                batch.record(&subject);
            }
            RdfObject::Literal(lit) => {
                let key = vocab.handle_iri(predicate)?;
                if key == URI_KEY {
                    warn!(%predicate, subject = %subject, "property would overwrite the resource uri, skipped");
                    return Ok(false);
                }
                let config = vocab.config();
                let value = literal::to_property_value(lit, config);
                batch.set_property(&subject, key, value, config.is_multivalued(predicate));
                batch.record(&subject);
            }
            object => {
                let rel_type = vocab.handle_iri(predicate)?;
                let object = object.resource_uri().unwrap_or_default();
                batch.add_statement(&subject, rel_type, &object);
            }
        }
        Ok(true)
    }
}
