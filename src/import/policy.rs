//! Apply policies
//!
//! An [`ApplyPolicy`] turns buffered deltas into store mutations. Loading
//! creates what is missing and merges values; deleting removes what is
//! present and counts what is not.

use super::batch::PendingValue;
use crate::graph::{Direction, EdgeId, GraphResult, GraphStore, Label, NodeId, PropertyMap, PropertyValue};
use crate::rdf::vocab::{RESOURCE_LABEL, URI_KEY};
use indexmap::IndexSet;

/// Per-batch outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    /// Statements touching a blank node, never materialized
    pub blank_node_statements: u64,
    /// Blank-node statements with exactly one blank endpoint
    pub one_sided_blank: u64,
    /// Statements whose target was missing (deletes only)
    pub missed: u64,
}

/// How buffered deltas are applied to the store
pub trait ApplyPolicy {
    /// Whether prefixes minted during the run are persisted at each flush
    fn syncs_namespaces(&self) -> bool;

    /// Node for a resource URI, if it exists or can be created
    fn resolve(&self, store: &mut GraphStore, uri: &str) -> GraphResult<Option<NodeId>>;

    fn apply_labels(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        labels: &IndexSet<String>,
        tally: &mut BatchTally,
    ) -> GraphResult<()>;

    fn apply_property(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        key: &str,
        value: &PendingValue,
        tally: &mut BatchTally,
    ) -> GraphResult<()>;

    fn apply_relationship(
        &self,
        store: &mut GraphStore,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        tally: &mut BatchTally,
    ) -> GraphResult<()>;

    /// Remove `node` if nothing but its identity is left. Returns whether it was removed.
    fn collect_if_empty(&self, _store: &mut GraphStore, _node: NodeId) -> GraphResult<bool> {
        Ok(false)
    }
}

/// Side from which an existing relationship is looked up
pub(crate) fn scan_side(store: &GraphStore, from: NodeId, to: NodeId, rel_type: &str) -> Direction {
    if store.degree(from, Some(rel_type), Direction::Outgoing) < store.degree(to, Some(rel_type), Direction::Incoming) {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

/// Existing `from -[rel_type]-> to`, scanning from the lower-degree end
pub(crate) fn find_relationship(store: &GraphStore, from: NodeId, to: NodeId, rel_type: &str) -> Option<EdgeId> {
    match scan_side(store, from, to, rel_type) {
        Direction::Outgoing => store
            .relationships(from, Direction::Outgoing, Some(rel_type))
            .find(|e| e.target == to)
            .map(|e| e.id),
        _ => store
            .relationships(to, Direction::Incoming, Some(rel_type))
            .find(|e| e.source == from)
            .map(|e| e.id),
    }
}

fn stored_value(store: &GraphStore, node: NodeId, key: &str) -> Option<PropertyValue> {
    store.get_node(node).and_then(|n| n.get_property(key)).cloned()
}

/// Create-or-update
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadPolicy;

impl ApplyPolicy for LoadPolicy {
    fn syncs_namespaces(&self) -> bool {
        true
    }

    fn resolve(&self, store: &mut GraphStore, uri: &str) -> GraphResult<Option<NodeId>> {
        if let Some(id) = store.find_node(RESOURCE_LABEL, URI_KEY, uri) {
            return Ok(Some(id));
        }
        let mut properties = PropertyMap::new();
        properties.insert(URI_KEY.to_string(), PropertyValue::String(uri.to_string()));
        store
            .create_node_with_properties([Label::new(RESOURCE_LABEL)], properties)
            .map(Some)
    }

    fn apply_labels(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        labels: &IndexSet<String>,
        _tally: &mut BatchTally,
    ) -> GraphResult<()> {
        for label in labels {
            store.add_label(node, label.as_str())?;
        }
        Ok(())
    }

    fn apply_property(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        key: &str,
        value: &PendingValue,
        _tally: &mut BatchTally,
    ) -> GraphResult<()> {
        match value {
            PendingValue::Single(v) => {
                store.set_node_property(node, key, v.clone())?;
            }
            PendingValue::Multi(values) => {
                // a property is a set of values: union with what is stored
                let mut merged = stored_value(store, node, key)
                    .map(|v| v.elements().to_vec())
                    .unwrap_or_default();
                for v in values {
                    if !merged.contains(v) {
                        merged.push(v.clone());
                    }
                }
                store.set_node_property(node, key, PropertyValue::Array(merged))?;
            }
        }
        Ok(())
    }

    fn apply_relationship(
        &self,
        store: &mut GraphStore,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        _tally: &mut BatchTally,
    ) -> GraphResult<()> {
        if find_relationship(store, from, to, rel_type).is_none() {
            store.create_edge(from, to, rel_type)?;
        }
        Ok(())
    }
}

/// Remove-if-present
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePolicy;

impl ApplyPolicy for DeletePolicy {
    fn syncs_namespaces(&self) -> bool {
        false
    }

    fn resolve(&self, store: &mut GraphStore, uri: &str) -> GraphResult<Option<NodeId>> {
        Ok(store.find_node(RESOURCE_LABEL, URI_KEY, uri))
    }

    fn apply_labels(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        labels: &IndexSet<String>,
        tally: &mut BatchTally,
    ) -> GraphResult<()> {
        for label in labels {
            if !store.remove_label(node, label)? {
                tally.missed += 1;
            }
        }
        Ok(())
    }

    fn apply_property(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        key: &str,
        value: &PendingValue,
        tally: &mut BatchTally,
    ) -> GraphResult<()> {
        let Some(current) = stored_value(store, node, key) else {
            tally.missed += value.len() as u64;
            return Ok(());
        };
        match value {
            PendingValue::Single(_) => {
                store.remove_node_property(node, key)?;
            }
            PendingValue::Multi(values) => {
                tally.missed += values.iter().filter(|v| !current.contains(v)).count() as u64;
                let remaining: Vec<PropertyValue> = current
                    .elements()
                    .iter()
                    .filter(|v| !values.contains(v))
                    .cloned()
                    .collect();
                if remaining.is_empty() {
                    store.remove_node_property(node, key)?;
                } else if remaining.len() < current.elements().len() {
                    store.set_node_property(node, key, PropertyValue::Array(remaining))?;
                }
            }
        }
        Ok(())
    }

    fn apply_relationship(
        &self,
        store: &mut GraphStore,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        tally: &mut BatchTally,
    ) -> GraphResult<()> {
        match find_relationship(store, from, to, rel_type) {
            Some(edge) => {
                store.delete_edge(edge)?;
            }
            None => tally.missed += 1,
        }
        Ok(())
    }

    fn collect_if_empty(&self, store: &mut GraphStore, node: NodeId) -> GraphResult<bool> {
        let Some(n) = store.get_node(node) else {
            return Ok(false);
        };
        let bare = n.label_count() == 1
            && n.has_label(RESOURCE_LABEL)
            && n.properties.len() == 1
            && n.has_property(URI_KEY)
            && !store.has_relationships(node);
        if bare {
            store.delete_node(node)?;
        }
        Ok(bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(store: &mut GraphStore, uri: &str) -> NodeId {
        LoadPolicy.resolve(store, uri).unwrap().unwrap()
    }

    #[test]
    fn test_load_resolves_existing_node() {
        let mut store = GraphStore::new();
        store.create_unique_constraint(RESOURCE_LABEL, URI_KEY).unwrap();
        let a = resource(&mut store, "http://ex.org/a");
        assert_eq!(resource(&mut store, "http://ex.org/a"), a);
        assert_eq!(store.node_count(), 1);
        assert_eq!(DeletePolicy.resolve(&mut store, "http://ex.org/missing").unwrap(), None);
    }

    #[test]
    fn test_multivalue_merge_and_subtract() {
        let mut store = GraphStore::new();
        let a = resource(&mut store, "http://ex.org/a");
        let mut tally = BatchTally::default();

        store.set_node_property(a, "alias", "x").unwrap();
        let add = PendingValue::Multi(vec!["y".into(), "x".into()]);
        LoadPolicy.apply_property(&mut store, a, "alias", &add, &mut tally).unwrap();
        assert_eq!(
            store.get_node(a).unwrap().get_property("alias"),
            Some(&PropertyValue::Array(vec!["x".into(), "y".into()]))
        );

        let remove = PendingValue::Multi(vec!["x".into(), "z".into()]);
        DeletePolicy.apply_property(&mut store, a, "alias", &remove, &mut tally).unwrap();
        assert_eq!(tally.missed, 1);
        assert_eq!(
            store.get_node(a).unwrap().get_property("alias"),
            Some(&PropertyValue::Array(vec!["y".into()]))
        );

        let last = PendingValue::Multi(vec!["y".into()]);
        DeletePolicy.apply_property(&mut store, a, "alias", &last, &mut tally).unwrap();
        assert!(!store.get_node(a).unwrap().has_property("alias"));
    }

    #[test]
    fn test_heterogeneous_merge_fails() {
        let mut store = GraphStore::new();
        let a = resource(&mut store, "http://ex.org/a");
        store.set_node_property(a, "n", 1i64).unwrap();
        let add = PendingValue::Multi(vec!["one".into()]);
        assert!(LoadPolicy
            .apply_property(&mut store, a, "n", &add, &mut BatchTally::default())
            .is_err());
    }

    #[test]
    fn test_relationship_dedup_and_delete() {
        let mut store = GraphStore::new();
        let a = resource(&mut store, "http://ex.org/a");
        let b = resource(&mut store, "http://ex.org/b");
        let mut tally = BatchTally::default();

        LoadPolicy.apply_relationship(&mut store, a, b, "KNOWS", &mut tally).unwrap();
        LoadPolicy.apply_relationship(&mut store, a, b, "KNOWS", &mut tally).unwrap();
        assert_eq!(store.edge_count(), 1);

        DeletePolicy.apply_relationship(&mut store, a, b, "KNOWS", &mut tally).unwrap();
        DeletePolicy.apply_relationship(&mut store, a, b, "KNOWS", &mut tally).unwrap();
        assert_eq!(store.edge_count(), 0);
        assert_eq!(tally.missed, 1);

        assert!(DeletePolicy.collect_if_empty(&mut store, a).unwrap());
        assert!(!store.has_node(a));
        assert!(!DeletePolicy.collect_if_empty(&mut store, a).unwrap());
    }

    #[test]
    fn test_labelled_node_is_kept() {
        let mut store = GraphStore::new();
        let a = resource(&mut store, "http://ex.org/a");
        store.add_label(a, "Person").unwrap();
        assert!(!DeletePolicy.collect_if_empty(&mut store, a).unwrap());

        let mut tally = BatchTally::default();
        let labels: IndexSet<String> = ["Person".to_string(), "Robot".to_string()].into_iter().collect();
        DeletePolicy.apply_labels(&mut store, a, &labels, &mut tally).unwrap();
        assert_eq!(tally.missed, 1);
        assert!(DeletePolicy.collect_if_empty(&mut store, a).unwrap());
    }

    #[test]
    fn test_scan_starts_from_sparser_side() {
        let mut store = GraphStore::new();
        let hub = resource(&mut store, "http://ex.org/hub");
        let leaf = resource(&mut store, "http://ex.org/leaf");
        for i in 0..50 {
            let other = resource(&mut store, &format!("http://ex.org/n{i}"));
            store.create_edge(hub, other, "LINKS").unwrap();
        }
        // hub has 50 outgoing, leaf has 0 incoming
        assert_eq!(scan_side(&store, hub, leaf, "LINKS"), Direction::Incoming);
        assert_eq!(find_relationship(&store, hub, leaf, "LINKS"), None);

        store.create_edge(hub, leaf, "LINKS").unwrap();
        assert!(find_relationship(&store, hub, leaf, "LINKS").is_some());

        // a sparse source scans its own outgoing edges
        let fan_in = resource(&mut store, "http://ex.org/fan_in");
        for i in 0..10 {
            let other = resource(&mut store, &format!("http://ex.org/m{i}"));
            store.create_edge(other, fan_in, "LINKS").unwrap();
        }
        assert_eq!(scan_side(&store, leaf, fan_in, "LINKS"), Direction::Outgoing);
    }
}
