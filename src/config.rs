//! Configuration
//!
//! All settings are plain serde structs with defaults, so a YAML file only
//! needs the keys it wants to change:
//!
//! ```yaml
//! logging:
//!   level: debug
//! import:
//!   commit_size: 5000
//!   graph:
//!     handle_vocab_uris: SHORTEN
//!     keep_lang_tag: true
//! export:
//!   include_rel_properties: true
//! ```
//!
//! The [`GraphConfig`] part describes how RDF vocabulary is laid out in the
//! graph. It is persisted on a `_GraphConfig` node the first time an import
//! runs so that later imports and exports read the graph the same way.

use crate::graph::{GraphError, GraphStore, PropertyValue};
use crate::rdf::vocab::{BASE_SCHEMA_NS, BASE_SCHEMA_PREFIX, GRAPH_CONFIG_LABEL};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The graph was already imported with a different vocabulary layout
    #[error("Graph config in the store differs from the requested one; the graph must be emptied first")]
    GraphConfigMismatch,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How vocabulary IRIs become labels, property keys and relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VocabUriHandling {
    /// `prefix__localName`, minting `nsN` prefixes for unknown namespaces
    #[default]
    Shorten,
    /// `prefix__localName`; unknown namespaces are an error
    ShortenStrict,
    /// Local name only
    Ignore,
    /// Full IRI
    Keep,
}

impl VocabUriHandling {
    pub fn is_shorten(&self) -> bool {
        matches!(self, VocabUriHandling::Shorten | VocabUriHandling::ShortenStrict)
    }
}

/// What happens when a property receives a second value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultivalHandling {
    /// Last value wins
    #[default]
    Overwrite,
    /// Values accumulate in an array with set semantics
    Array,
}

/// Layout of RDF vocabulary in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub handle_vocab_uris: VocabUriHandling,
    pub handle_multival: MultivalHandling,
    /// Predicates treated as multi-valued under `ARRAY`; all when absent
    pub multival_prop_list: Option<Vec<String>>,
    pub keep_lang_tag: bool,
    pub keep_custom_data_types: bool,
    pub base_schema_namespace: String,
    pub base_schema_prefix: String,
    /// Label of SKOS concepts
    pub class_label_name: String,
    /// Relationship type of `skos:broader`
    pub subclass_of_rel_name: String,
    /// Relationship type of `skos:related`
    pub related_concept_rel_name: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            handle_vocab_uris: VocabUriHandling::default(),
            handle_multival: MultivalHandling::default(),
            multival_prop_list: None,
            keep_lang_tag: false,
            keep_custom_data_types: false,
            base_schema_namespace: BASE_SCHEMA_NS.to_string(),
            base_schema_prefix: BASE_SCHEMA_PREFIX.to_string(),
            class_label_name: "Class".to_string(),
            subclass_of_rel_name: "SCO".to_string(),
            related_concept_rel_name: "RELATED".to_string(),
        }
    }
}

const GRAPH_CONFIG_KEY: &str = "config";

impl GraphConfig {
    /// Whether values of `predicate` accumulate rather than overwrite
    pub fn is_multivalued(&self, predicate: &str) -> bool {
        self.handle_multival == MultivalHandling::Array
            && self
                .multival_prop_list
                .as_ref()
                .map_or(true, |list| list.iter().any(|p| p == predicate))
    }

    /// Read the persisted graph config, if any
    pub fn load(store: &GraphStore) -> ConfigResult<Option<GraphConfig>> {
        let Some(node) = store.nodes_by_label(GRAPH_CONFIG_LABEL).next() else {
            return Ok(None);
        };
        match node.get_property(GRAPH_CONFIG_KEY).and_then(PropertyValue::as_string) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    /// Write this config to the `_GraphConfig` node, creating it if needed
    pub fn persist(&self, store: &mut GraphStore) -> ConfigResult<()> {
        let json = serde_json::to_string(self)?;
        let existing = store.nodes_by_label(GRAPH_CONFIG_LABEL).next().map(|node| node.id);
        let id = match existing {
            Some(id) => id,
            None => store.create_node(GRAPH_CONFIG_LABEL),
        };
        store.set_node_property(id, GRAPH_CONFIG_KEY, json)?;
        debug!("graph config persisted");
        Ok(())
    }

    /// Settle which config a run uses: the persisted one, else `requested`
    /// (or the default), persisting it on first use. Requesting a config
    /// that differs from the persisted one is an error.
    pub fn resolve(store: &mut GraphStore, requested: Option<&GraphConfig>) -> ConfigResult<GraphConfig> {
        match (GraphConfig::load(store)?, requested) {
            (Some(persisted), Some(requested)) if persisted != *requested => Err(ConfigError::GraphConfigMismatch),
            (Some(persisted), _) => Ok(persisted),
            (None, requested) => {
                let config = requested.cloned().unwrap_or_default();
                config.persist(store)?;
                info!(vocab = ?config.handle_vocab_uris, "graph config initialised");
                Ok(config)
            }
        }
    }
}

/// Settings of one import, delete or SKOS run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Vocabulary layout; the persisted one is used when absent
    pub graph: Option<GraphConfig>,
    /// Mapped triples per partial commit
    pub commit_size: u64,
    /// Capacity of the URI -> node cache
    pub node_cache_size: usize,
    /// Predicates skipped entirely
    pub predicate_exclusion_list: Option<Vec<String>>,
    /// Stop after this many parsed triples
    pub stream_triple_limit: Option<u64>,
    /// Fail the run on the first failed batch or namespace sync
    pub abort_on_error: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            graph: None,
            commit_size: 25_000,
            node_cache_size: 10_000,
            predicate_exclusion_list: None,
            stream_triple_limit: None,
            abort_on_error: false,
        }
    }
}

impl ImportConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn is_excluded(&self, predicate: &str) -> bool {
        self.predicate_exclusion_list
            .as_ref()
            .is_some_and(|list| list.iter().any(|p| p == predicate))
    }
}

/// Settings of pattern export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Graph element name -> IRI used in the output
    pub mappings: IndexMap<String, String>,
    /// Emit only elements present in `mappings`
    pub mapped_only: bool,
    /// Emit relationship properties as statements about the quoted relationship triple
    pub include_rel_properties: bool,
}

impl ExportOptions {
    /// Replace the mapping table with a JSON object of `name: iri` pairs
    pub fn with_mappings_json(mut self, json: &str) -> ConfigResult<Self> {
        self.mappings = serde_json::from_str(json)?;
        Ok(self)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Install a global fmt subscriber. Returns false if one was already set.
    pub fn init(&self) -> ConfigResult<bool> {
        let level = tracing::Level::from_str(&self.level).map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))?;
        Ok(tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(self.ansi)
            .try_init()
            .is_ok())
    }
}

/// Everything that can be set from one config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub import: ImportConfig,
    pub export: ExportOptions,
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.commit_size, 25_000);
        assert!(!config.abort_on_error);

        let graph = GraphConfig::default();
        assert_eq!(graph.handle_vocab_uris, VocabUriHandling::Shorten);
        assert_eq!(graph.base_schema_namespace, "neo4j://graph.schema#");
        assert!(!graph.is_multivalued("http://ex.org/p"));
    }

    #[test]
    fn test_multivalued_predicates() {
        let all = GraphConfig {
            handle_multival: MultivalHandling::Array,
            ..GraphConfig::default()
        };
        assert!(all.is_multivalued("http://ex.org/p"));

        let some = GraphConfig {
            multival_prop_list: Some(vec!["http://ex.org/p".into()]),
            ..all
        };
        assert!(some.is_multivalued("http://ex.org/p"));
        assert!(!some.is_multivalued("http://ex.org/q"));
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = ImportConfig::from_yaml_str(
            "commit_size: 2\npredicate_exclusion_list: [\"http://ex.org/skip\"]\ngraph:\n  handle_vocab_uris: SHORTEN_STRICT\n  keep_lang_tag: true\n",
        )
        .unwrap();
        assert_eq!(config.commit_size, 2);
        assert_eq!(config.node_cache_size, 10_000);
        assert!(config.is_excluded("http://ex.org/skip"));
        let graph = config.graph.unwrap();
        assert_eq!(graph.handle_vocab_uris, VocabUriHandling::ShortenStrict);
        assert!(graph.keep_lang_tag);
        assert_eq!(graph.class_label_name, "Class");
    }

    #[test]
    fn test_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: debug\nexport:\n  mapped_only: true\n  mappings:\n    name: http://schema.org/name").unwrap();

        let settings = Settings::from_yaml_file(file.path()).unwrap();
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.export.mapped_only);
        assert_eq!(settings.export.mappings.get("name").map(String::as_str), Some("http://schema.org/name"));
        assert_eq!(settings.import, ImportConfig::default());
    }

    #[test]
    fn test_invalid_log_level() {
        let logging = LoggingConfig {
            level: "loud".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(logging.init(), Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_graph_config_persistence() {
        let mut store = GraphStore::new();
        assert_eq!(GraphConfig::load(&store).unwrap(), None);

        let requested = GraphConfig {
            keep_lang_tag: true,
            ..GraphConfig::default()
        };
        let resolved = GraphConfig::resolve(&mut store, Some(&requested)).unwrap();
        assert_eq!(resolved, requested);
        assert_eq!(GraphConfig::load(&store).unwrap(), Some(requested.clone()));

        // absent request reuses the persisted config
        assert_eq!(GraphConfig::resolve(&mut store, None).unwrap(), requested);

        let different = GraphConfig::default();
        assert!(matches!(
            GraphConfig::resolve(&mut store, Some(&different)),
            Err(ConfigError::GraphConfigMismatch)
        ));
        assert_eq!(store.nodes_by_label(GRAPH_CONFIG_LABEL).count(), 1);
    }

    #[test]
    fn test_persist_rewrites_existing_config_node() {
        let mut store = GraphStore::new();
        GraphConfig::default().persist(&mut store).unwrap();

        let updated = GraphConfig {
            handle_vocab_uris: VocabUriHandling::Keep,
            ..GraphConfig::default()
        };
        updated.persist(&mut store).unwrap();

        assert_eq!(store.nodes_by_label(GRAPH_CONFIG_LABEL).count(), 1);
        assert_eq!(GraphConfig::load(&store).unwrap(), Some(updated));
    }

    #[test]
    fn test_mappings_json() {
        let options = ExportOptions::default()
            .with_mappings_json(r#"{"ns0__Person": "http://schema.org/Person"}"#)
            .unwrap();
        assert_eq!(options.mappings.len(), 1);
    }
}
