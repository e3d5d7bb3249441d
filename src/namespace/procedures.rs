//! Prefix administration
//!
//! Each operation runs in its own transaction with the prefix record
//! write-locked, and returns the resulting prefix map.

use super::registry::{NamespaceError, NamespacePrefixRegistry, NamespaceResult};
use crate::graph::{GraphDatabase, GraphStore};
use crate::rdf::vocab::RESOURCE_LABEL;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::info;

/// Prefix -> namespace map returned by every operation
pub type PrefixMap = BTreeMap<String, String>;

const TURTLE_OR_SPARQL_PREFIX: &str = r"(?i)@?prefix\s+([\w\-]*)\s*:\s*<([^>\s]+)>";
const XMLNS_PREFIX: &str = r#"xmlns:([\w\-]+)\s*=\s*["']([^"']+)["']"#;

static PREFIX_PATTERNS: LazyLock<Result<[Regex; 2], regex::Error>> =
    LazyLock::new(|| Ok([Regex::new(TURTLE_OR_SPARQL_PREFIX)?, Regex::new(XMLNS_PREFIX)?]));

/// Bind `prefix` to `ns`
pub fn add_prefix(db: &GraphDatabase, prefix: &str, ns: &str) -> NamespaceResult<PrefixMap> {
    let mut tx = db.begin_tx()?;
    let mut registry = NamespacePrefixRegistry::load_locked(&mut tx)?;
    registry.add(prefix, ns)?;
    registry.flush(&mut tx)?;
    tx.commit();
    info!(%prefix, %ns, "prefix added");
    Ok(registry.prefixes().clone())
}

/// Remove one prefix. Not allowed once resources have been imported.
pub fn remove_prefix(db: &GraphDatabase, prefix: &str) -> NamespaceResult<PrefixMap> {
    let mut tx = db.begin_tx()?;
    ensure_no_resources(&tx, "prefixes cannot be removed once resources have been imported")?;
    let mut registry = NamespacePrefixRegistry::load_locked(&mut tx)?;
    registry.remove_prefix(prefix);
    registry.flush(&mut tx)?;
    tx.commit();
    Ok(registry.prefixes().clone())
}

/// Remove every prefix. Not allowed once resources have been imported.
pub fn remove_all_prefixes(db: &GraphDatabase) -> NamespaceResult<PrefixMap> {
    let mut tx = db.begin_tx()?;
    ensure_no_resources(&tx, "the prefix map cannot be cleared once resources have been imported")?;
    let mut registry = NamespacePrefixRegistry::load_locked(&mut tx)?;
    registry.clear();
    registry.flush(&mut tx)?;
    tx.commit();
    info!("all prefixes removed");
    Ok(PrefixMap::new())
}

/// Current prefix map
pub fn list_prefixes(db: &GraphDatabase) -> NamespaceResult<PrefixMap> {
    let store = db.read()?;
    Ok(NamespacePrefixRegistry::load(&store)?.prefixes().clone())
}

/// Bind every prefix declared in a Turtle, SPARQL or RDF/XML header.
///
/// Dashes in prefixes become underscores. Empty (default) prefixes are
/// skipped.
pub fn add_prefixes_from_text(db: &GraphDatabase, text: &str) -> NamespaceResult<PrefixMap> {
    let declarations = prefix_declarations(text)?;
    let mut tx = db.begin_tx()?;
    let mut registry = NamespacePrefixRegistry::load_locked(&mut tx)?;
    for (prefix, ns) in &declarations {
        registry.add(prefix, ns)?;
    }
    registry.flush(&mut tx)?;
    tx.commit();
    info!(count = declarations.len(), "prefixes added from text");
    Ok(registry.prefixes().clone())
}

fn prefix_declarations(text: &str) -> NamespaceResult<Vec<(String, String)>> {
    let patterns = PREFIX_PATTERNS
        .as_ref()
        .map_err(|e| NamespaceError::InvalidPattern(e.to_string()))?;
    let mut found = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(text) {
            let prefix = caps[1].replace('-', "_");
            if !prefix.is_empty() {
                found.push((prefix, caps[2].to_string()));
            }
        }
    }
    Ok(found)
}

fn ensure_no_resources(store: &GraphStore, reason: &str) -> NamespaceResult<()> {
    if store.nodes_by_label(RESOURCE_LABEL).next().is_some() {
        return Err(NamespaceError::OperationNotAllowed(reason.to_string()));
    }
    Ok(())
}
