//! Run summary

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of an import, delete or SKOS run.
///
/// Counts are reported even when the run stopped early, so partial success
/// stays observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub triples_parsed: u64,
    /// Statements committed to the graph
    pub triples_mapped: u64,
    /// Statements that could not be applied (not deleted, unresolved)
    pub not_applied: u64,
    pub blank_node_statements: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    /// Mapped statements of failed batches
    pub triples_lost: u64,
    pub namespace_sync_failures: u64,
    pub limit_reached: bool,
    /// Prefix map at the end of the run
    pub namespaces: BTreeMap<String, String>,
    pub extra_info: Option<String>,
}

impl ImportSummary {
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0 && self.namespace_sync_failures == 0 && !self.limit_reached
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} triples mapped ({} not applied, {} blank-node statements, {} lost in {} failed batches)",
            self.triples_mapped,
            self.triples_parsed,
            self.not_applied,
            self.blank_node_statements,
            self.triples_lost,
            self.batches_failed
        )
    }
}
