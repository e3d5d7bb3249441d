//! Integration tests for RDF import
//!
//! Verifies batching, relationship dedup, multi-valued properties, blank
//! node accounting and failure handling through the public entry points.

use anyhow::Result;
use std::io::Write;
use triplegraph::config::{GraphConfig, ImportConfig, MultivalHandling, Settings, VocabUriHandling};
use triplegraph::graph::{GraphDatabase, PropertyValue};
use triplegraph::import::{import_rdf, ImportError, StatementProcessor};
use triplegraph::namespace::NamespaceError;
use triplegraph::rdf::RdfFormat;

const PEOPLE: &str = r#"
    @prefix ex: <http://example.org/> .
    @prefix foaf: <http://xmlns.com/foaf/0.1/> .

    ex:alice a foaf:Person ;
        foaf:name "Alice" ;
        foaf:age 30 ;
        foaf:knows ex:bob .
    ex:bob a foaf:Person ;
        foaf:name "Bob" .
"#;

fn import(db: &GraphDatabase, ttl: &str, config: &ImportConfig) -> Result<triplegraph::ImportSummary> {
    Ok(import_rdf(db, ttl.as_bytes(), RdfFormat::Turtle, config)?)
}

fn property(db: &GraphDatabase, uri: &str, key: &str) -> Option<PropertyValue> {
    let store = db.read().ok()?;
    let id = store.find_node("Resource", "uri", uri)?;
    store.get_node(id)?.get_property(key).cloned()
}

#[test]
fn test_import_people() -> Result<()> {
    let db = GraphDatabase::new();
    let summary = import(&db, PEOPLE, &ImportConfig::default())?;

    assert_eq!(summary.triples_parsed, 6);
    assert_eq!(summary.triples_mapped, 6);
    assert!(summary.is_complete());
    assert_eq!(summary.namespaces.get("ns0").map(String::as_str), Some("http://xmlns.com/foaf/0.1/"));

    let store = db.read()?;
    let alice = store.find_node("Resource", "uri", "http://example.org/alice").unwrap();
    let node = store.get_node(alice).unwrap();
    assert!(node.has_label("ns0__Person"));
    assert_eq!(node.get_property("ns0__name"), Some(&PropertyValue::String("Alice".into())));
    assert_eq!(node.get_property("ns0__age"), Some(&PropertyValue::Integer(30)));
    assert_eq!(store.edges_by_type("ns0__knows").count(), 1);
    Ok(())
}

#[test]
fn test_repeated_triples_do_not_duplicate_edges() -> Result<()> {
    let db = GraphDatabase::new();
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:link ex:b .
        ex:a ex:link ex:b .
    "#;
    import(&db, ttl, &ImportConfig::default())?;
    import(&db, ttl, &ImportConfig::default())?;

    assert_eq!(db.read()?.edge_count(), 1);
    Ok(())
}

#[test]
fn test_multivalued_properties_are_sets() -> Result<()> {
    let db = GraphDatabase::new();
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_multival: MultivalHandling::Array,
            multival_prop_list: Some(vec!["http://example.org/alias".into()]),
            ..GraphConfig::default()
        }),
        commit_size: 2,
        ..ImportConfig::default()
    };
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:alias "x", "y" ; ex:title "first" .
        ex:a ex:alias "x", "z" ; ex:title "second" .
    "#;
    import(&db, ttl, &config)?;

    assert_eq!(
        property(&db, "http://example.org/a", "ns0__alias"),
        Some(PropertyValue::Array(vec!["x".into(), "y".into(), "z".into()]))
    );
    // not in the list, last value wins
    assert_eq!(
        property(&db, "http://example.org/a", "ns0__title"),
        Some(PropertyValue::String("second".into()))
    );
    Ok(())
}

#[test]
fn test_blank_nodes_are_counted_not_stored() -> Result<()> {
    let db = GraphDatabase::new();
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:name "A" .
        ex:a ex:address [ ex:city "Paris" ; ex:zip "75001" ] .
    "#;
    let summary = import(&db, ttl, &ImportConfig::default())?;

    assert_eq!(summary.triples_parsed, 4);
    assert_eq!(summary.blank_node_statements, 3);
    assert_eq!(summary.triples_mapped, 1);
    assert_eq!(summary.not_applied, 1);
    assert!(summary.extra_info.unwrap().contains("blank nodes"));
    assert_eq!(db.read()?.edge_count(), 0);
    Ok(())
}

#[test]
fn test_vocabulary_modes() -> Result<()> {
    let ignore = GraphDatabase::new();
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_vocab_uris: VocabUriHandling::Ignore,
            ..GraphConfig::default()
        }),
        ..ImportConfig::default()
    };
    import(&ignore, PEOPLE, &config)?;
    assert_eq!(property(&ignore, "http://example.org/bob", "name"), Some("Bob".into()));

    let keep = GraphDatabase::new();
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_vocab_uris: VocabUriHandling::Keep,
            ..GraphConfig::default()
        }),
        ..ImportConfig::default()
    };
    import(&keep, PEOPLE, &config)?;
    assert_eq!(
        property(&keep, "http://example.org/bob", "http://xmlns.com/foaf/0.1/name"),
        Some("Bob".into())
    );
    Ok(())
}

#[test]
fn test_uri_predicate_keeps_resource_identity() -> Result<()> {
    let db = GraphDatabase::new();
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_vocab_uris: VocabUriHandling::Ignore,
            ..GraphConfig::default()
        }),
        ..ImportConfig::default()
    };
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:name "A" ; ex:uri "x" .
    "#;
    let summary = import(&db, ttl, &config)?;
    assert_eq!(summary.triples_parsed, 2);
    assert_eq!(summary.triples_mapped, 1);

    assert_eq!(property(&db, "http://example.org/a", "uri"), Some("http://example.org/a".into()));
    assert_eq!(property(&db, "http://example.org/a", "name"), Some("A".into()));
    assert!(db.read()?.find_node("Resource", "uri", "x").is_none());
    Ok(())
}

#[test]
fn test_strict_mode_requires_prefixes() -> Result<()> {
    let db = GraphDatabase::new();
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_vocab_uris: VocabUriHandling::ShortenStrict,
            ..GraphConfig::default()
        }),
        ..ImportConfig::default()
    };
    let err = import_rdf(&db, PEOPLE.as_bytes(), RdfFormat::Turtle, &config).unwrap_err();
    assert!(matches!(err.cause(), ImportError::Namespace(NamespaceError::UndefinedPrefix(_))));
    // the first statement already needs foaf
    let partial = err.summary().unwrap();
    assert_eq!(partial.triples_parsed, 1);
    assert_eq!(partial.triples_mapped, 0);

    triplegraph::namespace::add_prefix(&db, "foaf", "http://xmlns.com/foaf/0.1/")?;
    let summary = import(&db, PEOPLE, &config)?;
    assert_eq!(summary.triples_mapped, 6);
    assert_eq!(property(&db, "http://example.org/bob", "foaf__name"), Some("Bob".into()));
    Ok(())
}

#[test]
fn test_config_mismatch_is_rejected() -> Result<()> {
    let db = GraphDatabase::new();
    import(&db, PEOPLE, &ImportConfig::default())?;

    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_vocab_uris: VocabUriHandling::Keep,
            ..GraphConfig::default()
        }),
        ..ImportConfig::default()
    };
    assert!(matches!(
        import_rdf(&db, PEOPLE.as_bytes(), RdfFormat::Turtle, &config),
        Err(ImportError::Config(_))
    ));
    Ok(())
}

#[test]
fn test_failed_batch_aborts_when_asked() -> Result<()> {
    let db = GraphDatabase::new();
    let graph = GraphConfig {
        handle_multival: MultivalHandling::Array,
        ..GraphConfig::default()
    };
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:v "text" .
        ex:b ex:w "ok" .
        ex:a ex:v 42 .
        ex:c ex:w "later" .
    "#;
    let config = ImportConfig {
        graph: Some(graph),
        commit_size: 2,
        abort_on_error: true,
        ..ImportConfig::default()
    };
    let err = import_rdf(&db, ttl.as_bytes(), RdfFormat::Turtle, &config).unwrap_err();
    match err.cause() {
        ImportError::PartialCommitFailure { lost, .. } => assert_eq!(*lost, 2),
        other => panic!("unexpected error: {other}"),
    }

    // counts up to the failure survive the abort
    let summary = err.summary().unwrap();
    assert_eq!(summary.triples_parsed, 4);
    assert_eq!(summary.triples_mapped, 2);
    assert_eq!(summary.batches_committed, 1);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.triples_lost, 2);
    assert!(!summary.is_complete());
    assert_eq!(summary.namespaces.get("ns0").map(String::as_str), Some("http://example.org/"));

    // the first batch stays committed, the failed one is rolled back
    assert_eq!(
        property(&db, "http://example.org/a", "ns0__v"),
        Some(PropertyValue::Array(vec!["text".into()]))
    );
    assert_eq!(
        property(&db, "http://example.org/b", "ns0__w"),
        Some(PropertyValue::Array(vec!["ok".into()]))
    );
    assert_eq!(property(&db, "http://example.org/c", "ns0__w"), None);
    Ok(())
}

#[test]
fn test_failed_batch_is_reported_by_default() -> Result<()> {
    let db = GraphDatabase::new();
    let ttl = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:v "text" .
        ex:b ex:w "ok" .
        ex:a ex:v 42 .
        ex:c ex:w "later" .
    "#;
    let config = ImportConfig {
        graph: Some(GraphConfig {
            handle_multival: MultivalHandling::Array,
            ..GraphConfig::default()
        }),
        commit_size: 2,
        ..ImportConfig::default()
    };
    let summary = import(&db, ttl, &config)?;

    assert_eq!(summary.batches_committed, 1);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.triples_lost, 2);
    assert_eq!(summary.triples_mapped, 2);
    assert!(!summary.is_complete());
    Ok(())
}

#[test]
fn test_triple_limit_stops_the_stream() -> Result<()> {
    let db = GraphDatabase::new();
    let config = ImportConfig {
        stream_triple_limit: Some(3),
        ..ImportConfig::default()
    };
    let summary = import(&db, PEOPLE, &config)?;

    assert!(summary.limit_reached);
    assert_eq!(summary.triples_parsed, 3);
    assert_eq!(summary.triples_mapped, 3);
    Ok(())
}

#[test]
fn test_process_in_memory_triples() -> Result<()> {
    let db = GraphDatabase::new();
    let triples = triplegraph::rdf::parse_str(PEOPLE, RdfFormat::Turtle)?;
    let summary = StatementProcessor::loader(&db, ImportConfig::default())?.process(triples)?;
    assert_eq!(summary.triples_mapped, 6);
    Ok(())
}

#[test]
fn test_settings_file_drives_import() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "import:\n  commit_size: 1\n  predicate_exclusion_list:\n    - http://xmlns.com/foaf/0.1/age\n  graph:\n    handle_vocab_uris: IGNORE"
    )?;
    let settings = Settings::from_yaml_file(file.path())?;

    let db = GraphDatabase::new();
    let summary = import(&db, PEOPLE, &settings.import)?;
    assert_eq!(summary.triples_parsed, 6);
    assert_eq!(summary.triples_mapped, 5);
    assert_eq!(summary.batches_committed, 5);
    assert_eq!(property(&db, "http://example.org/alice", "age"), None);

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["triples_mapped"], 5);
    Ok(())
}
