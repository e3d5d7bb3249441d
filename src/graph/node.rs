//! Node implementation for the property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A node in the property graph
///
/// Mutation goes through [`GraphStore`](super::GraphStore) so that the label
/// and unique-key indexes stay consistent; the mutators here are crate-private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Set of labels, kept sorted
    pub labels: BTreeSet<Label>,

    /// Properties in insertion order
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node with a set of labels and no properties
    pub fn new(id: NodeId, labels: impl IntoIterator<Item = Label>) -> Self {
        Node {
            id,
            labels: labels.into_iter().collect(),
            properties: PropertyMap::new(),
        }
    }

    pub(crate) fn add_label(&mut self, label: Label) -> bool {
        self.labels.insert(label)
    }

    pub(crate) fn remove_label(&mut self, label: &Label) -> bool {
        self.labels.remove(label)
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    pub(crate) fn set_property(&mut self, key: String, value: PropertyValue) -> Option<PropertyValue> {
        self.properties.insert(key, value)
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub(crate) fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.shift_remove(key)
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get number of labels
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}
