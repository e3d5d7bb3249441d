//! Shared database handle and write transactions
//!
//! A [`Transaction`] holds the store's write lock for its whole lifetime and
//! opens the store's undo journal. Dropping it without calling
//! [`Transaction::commit`] reverts everything it changed, so a failed batch
//! leaves no partial writes behind. Beginning and rolling back cost only what
//! the transaction touched, not the size of the graph.

use super::store::{GraphError, GraphResult, GraphStore};
use super::types::NodeId;
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Cloneable handle to a graph store shared between readers and writers
#[derive(Debug, Clone, Default)]
pub struct GraphDatabase {
    inner: Arc<RwLock<GraphStore>>,
}

impl GraphDatabase {
    /// Create a database over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store
    pub fn from_store(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Begin a write transaction, blocking until no other reader or writer holds the store
    pub fn begin_tx(&self) -> GraphResult<Transaction<'_>> {
        let mut guard = self.inner.write().map_err(|_| GraphError::LockPoisoned)?;
        guard.begin_journal();
        Ok(Transaction {
            guard,
            committed: false,
            locked: BTreeSet::new(),
        })
    }

    /// Acquire a read view of the store
    pub fn read(&self) -> GraphResult<RwLockReadGuard<'_, GraphStore>> {
        self.inner.read().map_err(|_| GraphError::LockPoisoned)
    }
}

/// An exclusive, all-or-nothing unit of work against the store
pub struct Transaction<'db> {
    guard: RwLockWriteGuard<'db, GraphStore>,
    committed: bool,
    locked: BTreeSet<NodeId>,
}

impl Transaction<'_> {
    /// Take an explicit write lock on a node for the rest of the transaction.
    ///
    /// The transaction already excludes every other writer; the lock records
    /// that the caller depends on the node staying unchanged, and fails if
    /// the node does not exist.
    pub fn acquire_write_lock(&mut self, node: NodeId) -> GraphResult<()> {
        if !self.guard.has_node(node) {
            return Err(GraphError::NodeNotFound(node));
        }
        self.locked.insert(node);
        Ok(())
    }

    /// Check if this transaction holds a write lock on `node`
    pub fn holds_lock(&self, node: NodeId) -> bool {
        self.locked.contains(&node)
    }

    /// Make all changes permanent and release the store
    pub fn commit(mut self) {
        let changes = self.guard.commit_journal();
        self.committed = true;
        trace!(changes, locks = self.locked.len(), "transaction committed");
    }

    /// Discard all changes and release the store
    pub fn rollback(self) {}
}

impl Deref for Transaction<'_> {
    type Target = GraphStore;

    fn deref(&self) -> &GraphStore {
        &self.guard
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut GraphStore {
        &mut self.guard
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let reverted = self.guard.rollback_journal();
            trace!(reverted, "transaction rolled back");
        }
    }
}
