//! In-memory graph storage
//!
//! Arena storage for nodes and edges with:
//! - a label index (label -> node ids)
//! - an edge type index (type -> edge ids)
//! - typed adjacency per node, so per-type degree is a length lookup
//! - optional unique `(label, key)` indexes over string values, used to find
//!   a node by label and key without scanning
//!
//! While a journal is open every mutation records its inverse, so a
//! transaction can be undone at the cost of what it changed.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{Direction, EdgeId, EdgeType, Label, NodeId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Property '{key}' on {node} must hold values of a single type, found {found}")]
    HeterogeneousArray {
        node: NodeId,
        key: String,
        found: &'static str,
    },

    #[error("Node {existing} already has {label}.{key} = '{value}'")]
    UniqueConstraintViolation {
        label: Label,
        key: String,
        value: String,
        existing: NodeId,
    },

    #[error("Graph store lock poisoned")]
    LockPoisoned,
}

pub type GraphResult<T> = Result<T, GraphError>;

type Adjacency = BTreeMap<EdgeType, Vec<EdgeId>>;

/// Inverse of one mutation
#[derive(Debug, Clone)]
enum Undo {
    NodeCreated(NodeId),
    NodeDeleted(Node),
    LabelAdded(NodeId, Label),
    LabelRemoved(NodeId, Label),
    NodeProperty(NodeId, String, Option<PropertyValue>),
    EdgeCreated(EdgeId),
    EdgeDeleted(Edge),
    EdgeProperty(EdgeId, String, Option<PropertyValue>),
    ConstraintCreated(Label, String),
}

/// In-memory graph storage
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Node arena, indexed by node id
    nodes: Vec<Option<Node>>,

    /// Edge arena, indexed by edge id
    edges: Vec<Option<Edge>>,

    /// Outgoing edges for each node, grouped by type
    outgoing: Vec<Adjacency>,

    /// Incoming edges for each node, grouped by type
    incoming: Vec<Adjacency>,

    /// Free node IDs for reuse
    free_node_ids: Vec<u64>,

    /// Free edge IDs for reuse
    free_edge_ids: Vec<u64>,

    label_index: HashMap<Label, BTreeSet<NodeId>>,

    edge_type_index: HashMap<EdgeType, BTreeSet<EdgeId>>,

    /// (label, key) -> string value -> owning node
    unique_index: HashMap<(Label, String), FxHashMap<String, NodeId>>,

    node_count: usize,
    edge_count: usize,

    /// Undo records of the open transaction, newest last
    journal: Option<Vec<Undo>>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Nodes ====================

    /// Create a node with a single label
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        let id = self.allocate_node_id();
        let label = label.into();
        self.label_index.entry(label.clone()).or_default().insert(id);
        self.nodes[id.index()] = Some(Node::new(id, [label]));
        self.node_count += 1;
        self.record(Undo::NodeCreated(id));
        id
    }

    /// Create a node with several labels and properties, checking unique indexes
    pub fn create_node_with_properties(
        &mut self,
        labels: impl IntoIterator<Item = Label>,
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        let labels: BTreeSet<Label> = labels.into_iter().collect();
        for label in &labels {
            for (key, value) in &properties {
                if let (Some(index), PropertyValue::String(v)) =
                    (self.unique_index.get(&(label.clone(), key.clone())), value)
                {
                    if let Some(&existing) = index.get(v) {
                        return Err(GraphError::UniqueConstraintViolation {
                            label: label.clone(),
                            key: key.clone(),
                            value: v.clone(),
                            existing,
                        });
                    }
                }
            }
        }

        let next = NodeId::new(self.free_node_ids.last().copied().unwrap_or(self.nodes.len() as u64));
        for (key, value) in &properties {
            if let Some(found) = value.heterogeneous_element() {
                return Err(GraphError::HeterogeneousArray { node: next, key: key.clone(), found });
            }
        }

        let id = self.allocate_node_id();
        for label in &labels {
            self.label_index.entry(label.clone()).or_default().insert(id);
            for (key, value) in &properties {
                self.index_unique(id, label, key, value);
            }
        }
        let mut node = Node::new(id, labels);
        node.properties = properties;
        self.nodes[id.index()] = Some(node);
        self.node_count += 1;
        self.record(Undo::NodeCreated(id));
        Ok(id)
    }

    fn allocate_node_id(&mut self) -> NodeId {
        let raw = self.free_node_ids.pop().unwrap_or(self.nodes.len() as u64);
        let idx = raw as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
            self.outgoing.resize_with(idx + 1, Adjacency::new);
            self.incoming.resize_with(idx + 1, Adjacency::new);
        }
        NodeId::new(raw)
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Check if a node exists
    pub fn has_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Add a label to a node, returning false if it was already present
    pub fn add_label(&mut self, id: NodeId, label: impl Into<Label>) -> GraphResult<bool> {
        let label = label.into();
        let node = self.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
        if node.labels.contains(&label) {
            return Ok(false);
        }
        let properties = node.properties.clone();
        for (key, value) in &properties {
            self.check_unique(id, &label, key, value)?;
        }
        for (key, value) in &properties {
            self.index_unique(id, &label, key, value);
        }
        self.node_mut(id)?.add_label(label.clone());
        self.label_index.entry(label.clone()).or_default().insert(id);
        self.record(Undo::LabelAdded(id, label));
        Ok(true)
    }

    /// Remove a label from a node, returning false if it was not present
    pub fn remove_label(&mut self, id: NodeId, label: &str) -> GraphResult<bool> {
        let label = Label::new(label);
        let node = self.node_mut(id)?;
        if !node.remove_label(&label) {
            return Ok(false);
        }
        let properties = node.properties.clone();
        for (key, value) in &properties {
            self.unindex_unique(&label, key, value);
        }
        if let Some(ids) = self.label_index.get_mut(&label) {
            ids.remove(&id);
        }
        self.record(Undo::LabelRemoved(id, label));
        Ok(true)
    }

    /// Set a node property, returning the previous value
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        if let Some(found) = value.heterogeneous_element() {
            return Err(GraphError::HeterogeneousArray { node: id, key, found });
        }
        let labels = self.get_node(id).ok_or(GraphError::NodeNotFound(id))?.labels.clone();
        for label in &labels {
            self.check_unique(id, label, &key, &value)?;
        }

        let old = self.node_mut(id)?.set_property(key.clone(), value.clone());
        for label in &labels {
            if let Some(old) = &old {
                self.unindex_unique(label, &key, old);
            }
            self.index_unique(id, label, &key, &value);
        }
        self.record(Undo::NodeProperty(id, key, old.clone()));
        Ok(old)
    }

    /// Remove a node property, returning the removed value
    pub fn remove_node_property(&mut self, id: NodeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        let node = self.node_mut(id)?;
        let removed = node.remove_property(key);
        if let Some(old) = &removed {
            let labels = node.labels.clone();
            for label in &labels {
                self.unindex_unique(label, key, old);
            }
            self.record(Undo::NodeProperty(id, key.to_string(), Some(old.clone())));
        }
        Ok(removed)
    }

    /// Delete a node and all its connected edges
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let node = self
            .nodes
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::NodeNotFound(id))?;

        for label in &node.labels {
            if let Some(ids) = self.label_index.get_mut(label) {
                ids.remove(&id);
            }
            for (key, value) in &node.properties {
                self.unindex_unique(label, key, value);
            }
        }

        let outgoing = std::mem::take(&mut self.outgoing[id.index()]);
        let incoming = std::mem::take(&mut self.incoming[id.index()]);
        for edge_id in outgoing.values().chain(incoming.values()).flatten() {
            // self-loops appear on both sides
            let _ = self.delete_edge(*edge_id);
        }

        self.free_node_ids.push(id.as_u64());
        self.node_count -= 1;
        self.record(Undo::NodeDeleted(node.clone()));
        Ok(node)
    }

    // ==================== Unique indexes ====================

    /// Create a unique index over string values of `key` on nodes labelled
    /// `label`. Idempotent; fails if existing nodes already collide.
    pub fn create_unique_constraint(&mut self, label: impl Into<Label>, key: impl Into<String>) -> GraphResult<()> {
        let label = label.into();
        let key = key.into();
        let index_key = (label.clone(), key.clone());
        if self.unique_index.contains_key(&index_key) {
            return Ok(());
        }

        let mut index = FxHashMap::default();
        for node in self.nodes_by_label(label.as_str()) {
            if let Some(PropertyValue::String(value)) = node.get_property(&key) {
                if let Some(&existing) = index.get(value) {
                    return Err(GraphError::UniqueConstraintViolation {
                        label,
                        key,
                        value: value.clone(),
                        existing,
                    });
                }
                index.insert(value.clone(), node.id);
            }
        }
        self.unique_index.insert(index_key, index);
        self.record(Undo::ConstraintCreated(label, key));
        Ok(())
    }

    /// Check whether a unique index exists for `(label, key)`
    pub fn has_unique_constraint(&self, label: &str, key: &str) -> bool {
        self.unique_index.contains_key(&(Label::new(label), key.to_string()))
    }

    /// Find the node with `label` whose string property `key` equals `value`.
    ///
    /// Uses the unique index when one exists, otherwise scans the label.
    pub fn find_node(&self, label: &str, key: &str, value: &str) -> Option<NodeId> {
        let label = Label::new(label);
        match self.unique_index.get(&(label.clone(), key.to_string())) {
            Some(index) => index.get(value).copied(),
            None => self.label_index.get(&label)?.iter().copied().find(|id| {
                self.get_node(*id)
                    .and_then(|n| n.get_property(key))
                    .and_then(PropertyValue::as_string)
                    == Some(value)
            }),
        }
    }

    fn check_unique(&self, id: NodeId, label: &Label, key: &str, value: &PropertyValue) -> GraphResult<()> {
        let PropertyValue::String(value) = value else {
            return Ok(());
        };
        match self
            .unique_index
            .get(&(label.clone(), key.to_string()))
            .and_then(|index| index.get(value))
        {
            Some(&existing) if existing != id => Err(GraphError::UniqueConstraintViolation {
                label: label.clone(),
                key: key.to_string(),
                value: value.clone(),
                existing,
            }),
            _ => Ok(()),
        }
    }

    fn index_unique(&mut self, id: NodeId, label: &Label, key: &str, value: &PropertyValue) {
        if let (Some(index), PropertyValue::String(value)) =
            (self.unique_index.get_mut(&(label.clone(), key.to_string())), value)
        {
            index.insert(value.clone(), id);
        }
    }

    fn unindex_unique(&mut self, label: &Label, key: &str, value: &PropertyValue) {
        if let (Some(index), PropertyValue::String(value)) =
            (self.unique_index.get_mut(&(label.clone(), key.to_string())), value)
        {
            index.remove(value);
        }
    }

    // ==================== Edges ====================

    /// Create an edge between two nodes
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let raw = self.free_edge_ids.pop().unwrap_or(self.edges.len() as u64);
        let id = EdgeId::new(raw);
        if id.index() >= self.edges.len() {
            self.edges.resize_with(id.index() + 1, || None);
        }

        let edge_type = edge_type.into();
        self.outgoing[source.index()].entry(edge_type.clone()).or_default().push(id);
        self.incoming[target.index()].entry(edge_type.clone()).or_default().push(id);
        self.edge_type_index.entry(edge_type.clone()).or_default().insert(id);
        self.edges[id.index()] = Some(Edge::new(id, source, target, edge_type));
        self.edge_count += 1;
        self.record(Undo::EdgeCreated(id));
        Ok(id)
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index()).and_then(Option::as_ref)
    }

    /// Set an edge property, returning the previous value
    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let edge = self
            .edges
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::EdgeNotFound(id))?;
        let key = key.into();
        let old = edge.properties.insert(key.clone(), value.into());
        self.record(Undo::EdgeProperty(id, key, old.clone()));
        Ok(old)
    }

    /// Delete an edge
    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self
            .edges
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::EdgeNotFound(id))?;

        if let Some(ids) = self.edge_type_index.get_mut(&edge.edge_type) {
            ids.remove(&id);
        }
        for adjacency in [
            self.outgoing.get_mut(edge.source.index()),
            self.incoming.get_mut(edge.target.index()),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(ids) = adjacency.get_mut(&edge.edge_type) {
                ids.retain(|&eid| eid != id);
                if ids.is_empty() {
                    adjacency.remove(&edge.edge_type);
                }
            }
        }

        self.free_edge_ids.push(id.as_u64());
        self.edge_count -= 1;
        self.record(Undo::EdgeDeleted(edge.clone()));
        Ok(edge)
    }

    /// Number of relationships of `edge_type` (or of any type) at `node`
    pub fn degree(&self, node: NodeId, edge_type: Option<&str>, direction: Direction) -> usize {
        let count = |adj: Option<&Adjacency>| -> usize {
            let Some(adj) = adj else { return 0 };
            match edge_type {
                Some(t) => adj.get(&EdgeType::new(t)).map_or(0, Vec::len),
                None => adj.values().map(Vec::len).sum(),
            }
        };
        let out = || count(self.outgoing.get(node.index()));
        let inc = || count(self.incoming.get(node.index()));
        match direction {
            Direction::Outgoing => out(),
            Direction::Incoming => inc(),
            Direction::Both => out() + inc(),
        }
    }

    /// Relationships at `node` in `direction`, optionally restricted to one type
    pub fn relationships<'a>(
        &'a self,
        node: NodeId,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        let edge_type = edge_type.map(EdgeType::new);
        let pick = move |adj: Option<&'a Adjacency>| -> Vec<EdgeId> {
            let Some(adj) = adj else { return Vec::new() };
            match &edge_type {
                Some(t) => adj.get(t).cloned().unwrap_or_default(),
                None => adj.values().flatten().copied().collect(),
            }
        };
        let mut ids = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            ids.extend(pick(self.outgoing.get(node.index())));
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            ids.extend(pick(self.incoming.get(node.index())));
        }
        ids.into_iter().filter_map(move |id| self.get_edge(id))
    }

    /// Check whether any relationship touches the node
    pub fn has_relationships(&self, node: NodeId) -> bool {
        self.degree(node, None, Direction::Both) > 0
    }

    // ==================== Scans ====================

    /// All nodes carrying `label`, in id order
    pub fn nodes_by_label<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.label_index
            .get(&Label::new(label))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.get_node(*id))
    }

    /// All edges of a type, in id order
    pub fn edges_by_type<'a>(&'a self, edge_type: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edge_type_index
            .get(&EdgeType::new(edge_type))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.get_edge(*id))
    }

    /// All nodes, in id order
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    /// All edges, in id order
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter_map(Option::as_ref)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    // ==================== Journal ====================

    /// Start recording undo information, discarding any previous journal
    pub(crate) fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep every change made since [`begin_journal`](Self::begin_journal)
    pub(crate) fn commit_journal(&mut self) -> usize {
        self.journal.take().map_or(0, |undo| undo.len())
    }

    /// Revert every change made since [`begin_journal`](Self::begin_journal),
    /// newest first. Returns the number of reverted changes.
    pub(crate) fn rollback_journal(&mut self) -> usize {
        let Some(undo) = self.journal.take() else {
            return 0;
        };
        let reverted = undo.len();
        for entry in undo.into_iter().rev() {
            if let Err(e) = self.revert(entry) {
                warn!(error = %e, "could not revert a change during rollback");
            }
        }
        reverted
    }

    fn record(&mut self, undo: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    fn revert(&mut self, undo: Undo) -> GraphResult<()> {
        match undo {
            Undo::NodeCreated(id) => {
                self.delete_node(id)?;
            }
            Undo::NodeDeleted(node) => self.restore_node(node),
            Undo::LabelAdded(id, label) => {
                self.remove_label(id, label.as_str())?;
            }
            Undo::LabelRemoved(id, label) => {
                self.add_label(id, label)?;
            }
            Undo::NodeProperty(id, key, Some(old)) => {
                self.set_node_property(id, key, old)?;
            }
            Undo::NodeProperty(id, key, None) => {
                self.remove_node_property(id, &key)?;
            }
            Undo::EdgeCreated(id) => {
                self.delete_edge(id)?;
            }
            Undo::EdgeDeleted(edge) => self.restore_edge(edge),
            Undo::EdgeProperty(id, key, old) => {
                let edge = self
                    .edges
                    .get_mut(id.index())
                    .and_then(Option::as_mut)
                    .ok_or(GraphError::EdgeNotFound(id))?;
                match old {
                    Some(old) => edge.properties.insert(key, old),
                    None => edge.properties.shift_remove(&key),
                };
            }
            Undo::ConstraintCreated(label, key) => {
                self.unique_index.remove(&(label, key));
            }
        }
        Ok(())
    }

    /// Put a deleted node back under its old id. Its edges are restored
    /// separately.
    fn restore_node(&mut self, node: Node) {
        let id = node.id;
        self.free_node_ids.retain(|&raw| raw != id.as_u64());
        for label in &node.labels {
            self.label_index.entry(label.clone()).or_default().insert(id);
            for (key, value) in &node.properties {
                self.index_unique(id, label, key, value);
            }
        }
        self.nodes[id.index()] = Some(node);
        self.node_count += 1;
    }

    /// Put a deleted edge back under its old id
    fn restore_edge(&mut self, edge: Edge) {
        let id = edge.id;
        self.free_edge_ids.retain(|&raw| raw != id.as_u64());
        self.outgoing[edge.source.index()]
            .entry(edge.edge_type.clone())
            .or_default()
            .push(id);
        self.incoming[edge.target.index()]
            .entry(edge.edge_type.clone())
            .or_default()
            .push(id);
        self.edge_type_index.entry(edge.edge_type.clone()).or_default().insert(id);
        self.edges[id.index()] = Some(edge);
        self.edge_count += 1;
    }
}
