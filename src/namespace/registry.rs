//! Bijective prefix <-> namespace registry
//!
//! The registry is built per operation from the `_NsPrefDef` record in the
//! store, changed in memory and written back with [`flush`]. Importers that
//! mint prefixes while other importers may be doing the same call
//! [`partial_refresh`] at every batch boundary: it adopts what others
//! committed meanwhile and reports a [`NamespaceError::DynamicPrefixConflict`]
//! instead of overwriting a diverging binding.
//!
//! [`flush`]: NamespacePrefixRegistry::flush
//! [`partial_refresh`]: NamespacePrefixRegistry::partial_refresh

use crate::graph::{GraphError, GraphStore, NodeId, Transaction};
use crate::rdf::vocab::{
    NS_PREFIX_DEF_LABEL, OWL_NS, RDFS_NS, RDF_NS, SCHEMA_NS, SHACL_NS, SKOSXL_NS, SKOS_NS, XSD_NS,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Reserved prefix/namespace pairs. Neither side can be bound to anything else.
pub const STANDARD_NAMESPACES: &[(&str, &str)] = &[
    ("sch", SCHEMA_NS),
    ("skos", SKOS_NS),
    ("skosxl", SKOSXL_NS),
    ("rdfs", RDFS_NS),
    ("owl", OWL_NS),
    ("rdf", RDF_NS),
    ("sh", SHACL_NS),
    ("xsd", XSD_NS),
];

const GENERATED_PREFIX: &str = "ns";

/// Namespace registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NamespaceError {
    /// Prefix or namespace already bound incompatibly
    #[error("Invalid prefix + namespace combination: {0}")]
    PrefixConflict(String),

    /// Strict shortening met a namespace with no prefix
    #[error("No prefix has been defined for namespace <{0}> and 'handle_vocab_uris' is set to 'SHORTEN_STRICT'")]
    UndefinedPrefix(String),

    /// Another writer committed a binding that diverges from this registry
    #[error("Prefix definitions changed concurrently: {0}")]
    DynamicPrefixConflict(String),

    /// The persisted record is not a bijection
    #[error("The namespace prefix definition in the store is invalid: {0}")]
    InvalidDefinitionInStore(String),

    /// Removing prefixes while data depends on them
    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    #[error("Invalid prefix definition pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type NamespaceResult<T> = Result<T, NamespaceError>;

fn standard_namespace_for(prefix: &str) -> Option<&'static str> {
    STANDARD_NAMESPACES.iter().find(|(p, _)| *p == prefix).map(|(_, ns)| *ns)
}

fn standard_prefix_for(ns: &str) -> Option<&'static str> {
    STANDARD_NAMESPACES.iter().find(|(_, n)| *n == ns).map(|(p, _)| *p)
}

/// In-memory prefix <-> namespace bijection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespacePrefixRegistry {
    prefix_to_ns: BTreeMap<String, String>,
    ns_to_prefix: BTreeMap<String, String>,
}

impl NamespacePrefixRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the persisted record
    pub fn load(store: &GraphStore) -> NamespaceResult<Self> {
        let mut registry = Self::new();
        if let Some(id) = record_id(store) {
            registry.adopt_record(store, id)?;
        }
        Ok(registry)
    }

    /// Build the registry from the persisted record, write-locking the
    /// record for the rest of `tx`
    pub fn load_locked(tx: &mut Transaction<'_>) -> NamespaceResult<Self> {
        let mut registry = Self::new();
        if let Some(id) = record_id(tx) {
            tx.acquire_write_lock(id)?;
            registry.adopt_record(tx, id)?;
        }
        Ok(registry)
    }

    fn adopt_record(&mut self, store: &GraphStore, id: NodeId) -> NamespaceResult<()> {
        for (prefix, ns) in persisted_pairs(store, id) {
            self.add(&prefix, &ns)
                .map_err(|e| NamespaceError::InvalidDefinitionInStore(e.to_string()))?;
        }
        Ok(())
    }

    pub fn get_ns_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_ns.get(prefix).map(String::as_str)
    }

    pub fn get_prefix_for_ns(&self, ns: &str) -> Option<&str> {
        self.ns_to_prefix.get(ns).map(String::as_str)
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix_to_ns.contains_key(prefix)
    }

    pub fn has_ns(&self, ns: &str) -> bool {
        self.ns_to_prefix.contains_key(ns)
    }

    pub fn len(&self) -> usize {
        self.prefix_to_ns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix_to_ns.is_empty()
    }

    /// Prefix -> namespace pairs, ordered by prefix
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefix_to_ns
    }

    /// Bind `prefix` to `ns`. Re-adding an identical pair is a no-op.
    pub fn add(&mut self, prefix: &str, ns: &str) -> NamespaceResult<()> {
        if let Some(reserved) = standard_namespace_for(prefix).filter(|r| *r != ns) {
            return Err(NamespaceError::PrefixConflict(format!(
                "{prefix} is a reserved namespace prefix for <{reserved}>"
            )));
        }
        if let Some(reserved) = standard_prefix_for(ns).filter(|r| *r != prefix) {
            return Err(NamespaceError::PrefixConflict(format!(
                "{ns} is a standard namespace that has the associated standard prefix {reserved}"
            )));
        }
        if let Some(bound) = self.prefix_to_ns.get(prefix).filter(|b| *b != ns) {
            return Err(NamespaceError::PrefixConflict(format!(
                "prefix {prefix} is in use for namespace <{bound}>"
            )));
        }
        if let Some(bound) = self.ns_to_prefix.get(ns).filter(|b| *b != prefix) {
            return Err(NamespaceError::PrefixConflict(format!(
                "namespace <{ns}> has already an associated prefix ({bound})"
            )));
        }
        if !self.prefix_to_ns.contains_key(prefix) {
            self.prefix_to_ns.insert(prefix.to_string(), ns.to_string());
            self.ns_to_prefix.insert(ns.to_string(), prefix.to_string());
        }
        Ok(())
    }

    /// Prefix for `ns`, binding one if needed.
    ///
    /// Non-strict: a standard namespace gets its standard prefix, anything
    /// else the first unused `nsN` counting from the number of prefixes
    /// already starting with `ns`. Strict: unknown namespaces are an error.
    pub fn get_prefix_or_add(&mut self, ns: &str, strict: bool) -> NamespaceResult<String> {
        if let Some(prefix) = self.ns_to_prefix.get(ns) {
            return Ok(prefix.clone());
        }
        if strict {
            return Err(NamespaceError::UndefinedPrefix(ns.to_string()));
        }

        let prefix = match standard_prefix_for(ns) {
            Some(standard) => standard.to_string(),
            None => {
                let mut n = self
                    .prefix_to_ns
                    .keys()
                    .filter(|p| p.starts_with(GENERATED_PREFIX))
                    .count();
                loop {
                    let candidate = format!("{GENERATED_PREFIX}{n}");
                    if !self.prefix_to_ns.contains_key(&candidate) && standard_namespace_for(&candidate).is_none() {
                        break candidate;
                    }
                    n += 1;
                }
            }
        };
        self.add(&prefix, ns)?;
        debug!(%prefix, %ns, "prefix bound");
        Ok(prefix)
    }

    /// Remove `prefix` and its namespace, if bound
    pub fn remove_prefix(&mut self, prefix: &str) {
        if let Some(ns) = self.prefix_to_ns.remove(prefix) {
            self.ns_to_prefix.remove(&ns);
        }
    }

    /// Remove `ns` and its prefix, if bound
    pub fn remove_namespace(&mut self, ns: &str) {
        if let Some(prefix) = self.ns_to_prefix.remove(ns) {
            self.prefix_to_ns.remove(&prefix);
        }
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.prefix_to_ns.clear();
        self.ns_to_prefix.clear();
    }

    /// Write the registry to the persisted record.
    ///
    /// Persisted pairs that are gone or changed in memory are removed, new
    /// pairs are added. The record is created only when there is something
    /// to store.
    pub fn flush(&self, store: &mut GraphStore) -> NamespaceResult<()> {
        let id = match record_id(store) {
            Some(id) => id,
            None if self.is_empty() => return Ok(()),
            None => store.create_node(NS_PREFIX_DEF_LABEL),
        };

        let persisted = persisted_pairs(store, id);
        for (prefix, ns) in &persisted {
            if self.get_ns_for_prefix(prefix) != Some(ns.as_str()) {
                store.remove_node_property(id, prefix)?;
            }
        }
        for (prefix, ns) in &self.prefix_to_ns {
            if persisted.get(prefix) != Some(ns) {
                store.set_node_property(id, prefix.clone(), ns.clone())?;
            }
        }
        Ok(())
    }

    /// Adopt bindings committed by other writers since this registry was
    /// loaded. A persisted pair whose prefix or namespace is bound to a
    /// different partner here is a conflict.
    pub fn reload(&mut self, tx: &mut Transaction<'_>) -> NamespaceResult<()> {
        let Some(id) = record_id(tx) else {
            return Ok(());
        };
        tx.acquire_write_lock(id)?;

        for (prefix, ns) in persisted_pairs(tx, id) {
            if let Some(local_ns) = self.get_ns_for_prefix(&prefix).filter(|l| *l != ns) {
                return Err(NamespaceError::DynamicPrefixConflict(format!(
                    "prefix {prefix} is bound to <{ns}> in the store but to <{local_ns}> locally"
                )));
            }
            if let Some(local_prefix) = self.get_prefix_for_ns(&ns).filter(|l| *l != prefix) {
                return Err(NamespaceError::DynamicPrefixConflict(format!(
                    "namespace <{ns}> has prefix {prefix} in the store but {local_prefix} locally"
                )));
            }
            if !self.has_prefix(&prefix) {
                self.add(&prefix, &ns)
                    .map_err(|e| NamespaceError::DynamicPrefixConflict(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// [`reload`](Self::reload) then [`flush`](Self::flush)
    pub fn partial_refresh(&mut self, tx: &mut Transaction<'_>) -> NamespaceResult<()> {
        self.reload(tx)?;
        self.flush(tx)
    }
}

fn record_id(store: &GraphStore) -> Option<NodeId> {
    store.nodes_by_label(NS_PREFIX_DEF_LABEL).next().map(|n| n.id)
}

fn persisted_pairs(store: &GraphStore, id: NodeId) -> BTreeMap<String, String> {
    store
        .get_node(id)
        .map(|node| {
            node.properties
                .iter()
                .filter_map(|(k, v)| v.as_string().map(|ns| (k.clone(), ns.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphDatabase;

    #[test]
    fn test_add_round_trip() {
        let mut reg = NamespacePrefixRegistry::new();
        reg.add("ex", "http://example.org/").unwrap();
        assert_eq!(reg.get_ns_for_prefix("ex"), Some("http://example.org/"));
        assert_eq!(reg.get_prefix_for_ns("http://example.org/"), Some("ex"));

        // identical pair is idempotent
        reg.add("ex", "http://example.org/").unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_add_conflicts() {
        let mut reg = NamespacePrefixRegistry::new();
        reg.add("ex", "http://example.org/").unwrap();

        assert!(matches!(reg.add("ex", "http://other.org/"), Err(NamespaceError::PrefixConflict(_))));
        assert!(matches!(reg.add("ex2", "http://example.org/"), Err(NamespaceError::PrefixConflict(_))));
        assert!(matches!(reg.add("skos", "http://example.org/skos#"), Err(NamespaceError::PrefixConflict(_))));
        assert!(matches!(reg.add("foaf", RDF_NS), Err(NamespaceError::PrefixConflict(_))));

        // the reserved pair itself is fine
        reg.add("rdf", RDF_NS).unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_get_prefix_or_add() {
        let mut reg = NamespacePrefixRegistry::new();
        assert_eq!(reg.get_prefix_or_add(SKOS_NS, false).unwrap(), "skos");
        assert_eq!(reg.get_prefix_or_add("http://a.org/", false).unwrap(), "ns0");
        assert_eq!(reg.get_prefix_or_add("http://b.org/", false).unwrap(), "ns1");
        assert_eq!(reg.get_prefix_or_add("http://a.org/", false).unwrap(), "ns0");

        assert_eq!(
            reg.get_prefix_or_add("http://c.org/", true),
            Err(NamespaceError::UndefinedPrefix("http://c.org/".into()))
        );
        assert_eq!(reg.get_prefix_or_add("http://b.org/", true).unwrap(), "ns1");
    }

    #[test]
    fn test_generated_prefix_skips_used_names() {
        let mut reg = NamespacePrefixRegistry::new();
        reg.add("ns1", "http://one.org/").unwrap();
        reg.add("nsfoo", "http://foo.org/").unwrap();
        // two keys start with "ns": ns2 is next and unused
        assert_eq!(reg.get_prefix_or_add("http://x.org/", false).unwrap(), "ns2");

        reg.remove_prefix("nsfoo");
        // "ns" keys are ns1 and ns2, so the count points at ns2 which is taken
        assert_eq!(reg.get_prefix_or_add("http://y.org/", false).unwrap(), "ns3");
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut reg = NamespacePrefixRegistry::new();
        reg.add("ex", "http://example.org/").unwrap();
        reg.remove_prefix("nope");
        reg.remove_namespace("http://nope.org/");
        assert_eq!(reg.len(), 1);

        reg.remove_namespace("http://example.org/");
        assert!(reg.is_empty());
        assert!(!reg.has_prefix("ex"));
    }

    #[test]
    fn test_flush_and_load() {
        let db = GraphDatabase::new();
        let mut tx = db.begin_tx().unwrap();
        let empty = NamespacePrefixRegistry::new();
        empty.flush(&mut tx).unwrap();
        assert_eq!(tx.node_count(), 0);

        let mut reg = NamespacePrefixRegistry::new();
        reg.add("ex", "http://example.org/").unwrap();
        reg.add("ns0", "http://a.org/").unwrap();
        reg.flush(&mut tx).unwrap();
        tx.commit();

        let loaded = NamespacePrefixRegistry::load(&db.read().unwrap()).unwrap();
        assert_eq!(loaded, reg);

        // removals and changes are written back
        let mut tx = db.begin_tx().unwrap();
        let mut changed = NamespacePrefixRegistry::load_locked(&mut tx).unwrap();
        changed.remove_prefix("ex");
        changed.add("ex", "http://example.com/").unwrap();
        changed.remove_prefix("ns0");
        changed.flush(&mut tx).unwrap();
        tx.commit();

        let loaded = NamespacePrefixRegistry::load(&db.read().unwrap()).unwrap();
        assert_eq!(loaded.get_ns_for_prefix("ex"), Some("http://example.com/"));
        assert!(!loaded.has_prefix("ns0"));
    }

    #[test]
    fn test_invalid_record() {
        let mut store = GraphStore::new();
        let id = store.create_node(NS_PREFIX_DEF_LABEL);
        store.set_node_property(id, "skos", "http://not-skos.org/").unwrap();
        assert!(matches!(
            NamespacePrefixRegistry::load(&store),
            Err(NamespaceError::InvalidDefinitionInStore(_))
        ));
    }

    #[test]
    fn test_partial_refresh_adopts_and_detects_conflicts() {
        let db = GraphDatabase::new();

        let mut first = NamespacePrefixRegistry::load(&db.read().unwrap()).unwrap();
        let mut second = NamespacePrefixRegistry::load(&db.read().unwrap()).unwrap();

        assert_eq!(first.get_prefix_or_add("http://a.org/", false).unwrap(), "ns0");
        let mut tx = db.begin_tx().unwrap();
        first.partial_refresh(&mut tx).unwrap();
        tx.commit();

        // second minted ns0 for a different namespace meanwhile
        assert_eq!(second.get_prefix_or_add("http://b.org/", false).unwrap(), "ns0");
        let mut tx = db.begin_tx().unwrap();
        let err = second.partial_refresh(&mut tx).unwrap_err();
        assert!(matches!(err, NamespaceError::DynamicPrefixConflict(_)));
        tx.rollback();

        // a registry with disjoint bindings adopts the persisted ones
        let mut third = NamespacePrefixRegistry::new();
        third.add("ex", "http://example.org/").unwrap();
        let mut tx = db.begin_tx().unwrap();
        third.partial_refresh(&mut tx).unwrap();
        tx.commit();
        assert_eq!(third.get_ns_for_prefix("ns0"), Some("http://a.org/"));

        let persisted = NamespacePrefixRegistry::load(&db.read().unwrap()).unwrap();
        assert_eq!(persisted.len(), 2);
    }
}
