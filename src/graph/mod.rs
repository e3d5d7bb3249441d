//! In-memory labeled property graph
//!
//! This module implements the graph the RDF mapping reads from and writes to:
//! - Nodes with multiple labels and properties
//! - Directed, typed edges with properties
//! - Label, edge-type and unique `(label, key)` indexes
//! - Per-type degree lookups
//! - All-or-nothing write transactions over a shared handle

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod transaction;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use transaction::{GraphDatabase, Transaction};
pub use types::{Direction, EdgeId, EdgeType, Label, NodeId};
