//! Bounded URI -> node cache
//!
//! Lives for one batch only: the processor invalidates it at every flush
//! boundary, so cached ids never cross a transaction.

use crate::graph::{GraphResult, NodeId};
use lru::LruCache;
use std::num::NonZeroUsize;

/// LRU cache of resolved resource nodes
#[derive(Debug)]
pub struct NodeResolutionCache {
    entries: LruCache<String, NodeId>,
}

impl NodeResolutionCache {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Cached node for `uri`, else the result of `resolve`.
    ///
    /// Only successful resolutions are cached; a `None` is asked again next
    /// time, since the node may be created later in the same batch.
    pub fn get_or_resolve<F>(&mut self, uri: &str, resolve: F) -> GraphResult<Option<NodeId>>
    where
        F: FnOnce(&str) -> GraphResult<Option<NodeId>>,
    {
        if let Some(id) = self.entries.get(uri) {
            return Ok(Some(*id));
        }
        let resolved = resolve(uri)?;
        if let Some(id) = resolved {
            self.entries.put(uri.to_string(), id);
        }
        Ok(resolved)
    }

    /// Forget one URI, e.g. after its node was deleted
    pub fn invalidate(&mut self, uri: &str) {
        self.entries.pop(uri);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
