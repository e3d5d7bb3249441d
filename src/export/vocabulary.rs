//! Graph names back to IRIs

use crate::config::{GraphConfig, VocabUriHandling};
use crate::namespace::NamespacePrefixRegistry;
use crate::rdf::vocab;
use indexmap::IndexMap;

const PREFIX_SEPARATOR: &str = "__";

/// Inverts the import-time vocabulary handling.
///
/// Names listed in the export mapping table always win. A graph without a
/// persisted config is treated as plain property graph data living in the
/// base schema namespace.
#[derive(Debug, Clone)]
pub struct ExportVocabulary {
    mode: Option<VocabUriHandling>,
    base_ns: String,
    registry: NamespacePrefixRegistry,
    mappings: IndexMap<String, String>,
    mapped_only: bool,
}

impl ExportVocabulary {
    pub fn new(
        config: Option<&GraphConfig>,
        registry: NamespacePrefixRegistry,
        mappings: IndexMap<String, String>,
        mapped_only: bool,
    ) -> Self {
        Self {
            mode: config.map(|c| c.handle_vocab_uris),
            base_ns: config.map_or(vocab::BASE_SCHEMA_NS, |c| c.base_schema_namespace.as_str()).to_string(),
            registry,
            mappings,
            mapped_only,
        }
    }

    /// IRI for a label, property key or relationship type. `None` means the
    /// element is filtered out.
    pub fn name_to_iri(&self, name: &str) -> Option<String> {
        if let Some(iri) = self.mappings.get(name) {
            return Some(iri.clone());
        }
        if self.mapped_only {
            return None;
        }
        let iri = match self.mode {
            Some(VocabUriHandling::Shorten | VocabUriHandling::ShortenStrict) => {
                match name.split_once(PREFIX_SEPARATOR) {
                    Some((prefix, local)) => match self.registry.get_ns_for_prefix(prefix) {
                        Some(ns) => format!("{ns}{local}"),
                        None => format!("{}{}", self.base_ns, name),
                    },
                    None => format!("{}{}", self.base_ns, name),
                }
            }
            Some(VocabUriHandling::Keep) => name.to_string(),
            Some(VocabUriHandling::Ignore) | None => format!("{}{}", self.base_ns, name),
        };
        Some(iri)
    }

    /// Graph name an IRI in a query pattern refers to. `None` means nothing
    /// in the graph can match it.
    pub fn iri_to_name(&self, iri: &str) -> Option<String> {
        if let Some((name, _)) = self.mappings.iter().find(|(_, mapped)| mapped.as_str() == iri) {
            return Some(name.clone());
        }
        if self.mapped_only {
            return None;
        }
        let (ns, local) = vocab::split_iri(iri);
        match self.mode {
            Some(VocabUriHandling::Shorten | VocabUriHandling::ShortenStrict) => {
                match self.registry.get_prefix_for_ns(ns) {
                    Some(prefix) => Some(format!("{prefix}{PREFIX_SEPARATOR}{local}")),
                    None if ns == self.base_ns => Some(local.to_string()),
                    None => None,
                }
            }
            Some(VocabUriHandling::Keep) => Some(iri.to_string()),
            Some(VocabUriHandling::Ignore) | None => Some(local.to_string()),
        }
    }
}
