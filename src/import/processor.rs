//! Batched statement processing
//!
//! [`StatementProcessor`] receives parsed statements, lets its [`Router`]
//! buffer them, and every `commit_size` mapped statements applies the
//! buffered batch in one transaction through its [`ApplyPolicy`]:
//!
//! 1. for loading in shorten modes, sync the prefix registry with the store
//!    ([`NamespacePrefixRegistry::partial_refresh`])
//! 2. resolve and update every buffered resource
//! 3. resolve both ends of every buffered relationship and apply it
//! 4. commit, or roll back and report the batch lost
//!
//! The node cache is cleared after every batch whatever the outcome. A run
//! that stops on an error returns [`ImportError::Aborted`] carrying the
//! counts gathered so far.

use super::batch::Batch;
use super::cache::NodeResolutionCache;
use super::policy::{ApplyPolicy, BatchTally, DeletePolicy, LoadPolicy};
use super::router::{DirectRouter, Router, Vocabulary};
use super::skos::SkosRouter;
use super::summary::ImportSummary;
use super::{ImportError, ImportResult};
use crate::config::{GraphConfig, ImportConfig};
use crate::graph::{GraphDatabase, GraphError, GraphResult, GraphStore};
use crate::namespace::NamespacePrefixRegistry;
use crate::rdf::parser::{parse_into, RdfFormat, RdfHandler};
use crate::rdf::vocab::{is_blank_uri, RESOURCE_LABEL, URI_KEY};
use crate::rdf::Triple;
use std::io::BufRead;
use tracing::{debug, error, info, warn};

/// Loads or deletes RDF statements in batches
pub struct StatementProcessor<'db, R: Router, A: ApplyPolicy> {
    db: &'db GraphDatabase,
    config: ImportConfig,
    graph_config: GraphConfig,
    registry: NamespacePrefixRegistry,
    router: R,
    policy: A,
    cache: NodeResolutionCache,
    batch: Batch,
    summary: ImportSummary,
}

impl<'db> StatementProcessor<'db, DirectRouter, LoadPolicy> {
    /// Processor that imports generic RDF
    pub fn loader(db: &'db GraphDatabase, config: ImportConfig) -> ImportResult<Self> {
        Self::new(db, config, DirectRouter, LoadPolicy)
    }
}

impl<'db> StatementProcessor<'db, DirectRouter, DeletePolicy> {
    /// Processor that deletes previously imported RDF
    pub fn deleter(db: &'db GraphDatabase, config: ImportConfig) -> ImportResult<Self> {
        Self::new(db, config, DirectRouter, DeletePolicy)
    }
}

impl<'db> StatementProcessor<'db, SkosRouter, LoadPolicy> {
    /// Processor that imports SKOS concept schemes
    pub fn skos_importer(db: &'db GraphDatabase, config: ImportConfig) -> ImportResult<Self> {
        Self::new(db, config, SkosRouter::new(), LoadPolicy)
    }
}

impl<'db, R: Router, A: ApplyPolicy> StatementProcessor<'db, R, A> {
    /// Prepare a run: make sure resources are uniquely indexed by `uri`,
    /// settle the graph config and load the prefix registry.
    pub fn new(db: &'db GraphDatabase, config: ImportConfig, router: R, policy: A) -> ImportResult<Self> {
        let mut tx = db.begin_tx()?;
        tx.create_unique_constraint(RESOURCE_LABEL, URI_KEY)?;
        let graph_config = GraphConfig::resolve(&mut tx, config.graph.as_ref())?;
        let registry = NamespacePrefixRegistry::load(&tx)?;
        tx.commit();

        Ok(Self {
            db,
            cache: NodeResolutionCache::new(config.node_cache_size),
            config,
            graph_config,
            registry,
            router,
            policy,
            batch: Batch::new(),
            summary: ImportSummary::default(),
        })
    }

    /// Graph config in effect for this run
    pub fn graph_config(&self) -> &GraphConfig {
        &self.graph_config
    }

    /// Parse `reader` and process every statement
    pub fn run<B: BufRead>(mut self, reader: B, format: RdfFormat) -> ImportResult<ImportSummary> {
        let outcome = parse_into(reader, format, &mut self);
        self.finish(outcome)
    }

    /// Process statements that are already in memory
    pub fn process<I>(mut self, triples: I) -> ImportResult<ImportSummary>
    where
        I: IntoIterator<Item = Triple>,
    {
        let outcome = self.stream_all(triples);
        self.finish(outcome)
    }

    fn stream_all<I: IntoIterator<Item = Triple>>(&mut self, triples: I) -> ImportResult<()> {
        self.start_rdf()?;
        for triple in triples {
            self.handle_statement(triple)?;
        }
        self.end_rdf()
    }

    fn finish(mut self, outcome: ImportResult<()>) -> ImportResult<ImportSummary> {
        let outcome = match outcome {
            Err(ImportError::TripleLimitReached(limit)) => {
                warn!(limit, "triple limit reached, stopping the stream");
                self.summary.limit_reached = true;
                self.end_rdf()
            }
            other => other,
        };
        match outcome {
            Ok(()) => Ok(self.summary),
            Err(source) => {
                self.summary.namespaces = self.registry.prefixes().clone();
                error!(error = %source, summary = %self.summary, "RDF run aborted");
                Err(ImportError::Aborted {
                    summary: Box::new(self.summary),
                    source: Box::new(source),
                })
            }
        }
    }

    /// Sync prefixes and apply the current batch in one transaction
    fn periodic_operation(&mut self) -> ImportResult<()> {
        let sync = self.policy.syncs_namespaces() && self.graph_config.handle_vocab_uris.is_shorten();
        let batch = self.batch.take();
        let mapped = batch.mapped();
        let empty = batch.is_empty() && mapped == 0;
        if empty && !sync {
            return Ok(());
        }

        let db = self.db;
        let mut tx = match db.begin_tx() {
            Ok(tx) => tx,
            Err(source) => return self.batch_failed(mapped, source),
        };

        if sync {
            match self.registry.partial_refresh(&mut tx) {
                Ok(()) => debug!(prefixes = self.registry.len(), "namespace prefixes synced"),
                Err(e) => {
                    error!(error = %e, "problems syncing up namespace prefixes in partial commit");
                    self.summary.namespace_sync_failures += 1;
                    if self.config.abort_on_error {
                        return Err(ImportError::NamespaceSync(e));
                    }
                }
            }
        }
        if empty {
            tx.commit();
            return Ok(());
        }

        let mut tally = BatchTally::default();
        let outcome = apply_batch(&mut tx, &batch, &self.policy, &mut self.cache, &mut tally);
        self.cache.invalidate_all();

        match outcome {
            Ok(()) => {
                tx.commit();
                let committed = mapped.saturating_sub(tally.blank_node_statements + tally.missed);
                self.summary.triples_mapped += committed;
                self.summary.not_applied += tally.missed + tally.one_sided_blank;
                self.summary.blank_node_statements += tally.blank_node_statements;
                self.summary.batches_committed += 1;
                debug!(
                    mapped,
                    committed,
                    total = self.summary.triples_mapped,
                    "partial commit"
                );
                Ok(())
            }
            Err(source) => {
                tx.rollback();
                self.batch_failed(mapped, source)
            }
        }
    }

    fn batch_failed(&mut self, mapped: u64, source: GraphError) -> ImportResult<()> {
        self.summary.batches_failed += 1;
        self.summary.triples_lost += mapped;
        error!(error = %source, "partial commit failed and was rolled back, {} triples lost", mapped);
        if self.config.abort_on_error {
            return Err(ImportError::PartialCommitFailure { lost: mapped, source });
        }
        Ok(())
    }
}

/// Apply one batch inside an open transaction
fn apply_batch<A: ApplyPolicy>(
    store: &mut GraphStore,
    batch: &Batch,
    policy: &A,
    cache: &mut NodeResolutionCache,
    tally: &mut BatchTally,
) -> GraphResult<()> {
    for (uri, resource) in batch.resources() {
        if is_blank_uri(uri) {
            tally.blank_node_statements += resource.statements;
            continue;
        }
        let Some(node) = cache.get_or_resolve(uri, |u| policy.resolve(store, u))? else {
            tally.missed += resource.statements;
            continue;
        };
        policy.apply_labels(store, node, &resource.labels, tally)?;
        for (key, value) in &resource.properties {
            policy.apply_property(store, node, key, value, tally)?;
        }
        if policy.collect_if_empty(store, node)? {
            cache.invalidate(uri);
        }
    }

    for st in batch.statements() {
        let blank_subject = is_blank_uri(&st.subject);
        let blank_object = is_blank_uri(&st.object);
        if blank_subject || blank_object {
            tally.blank_node_statements += 1;
            if blank_subject != blank_object {
                tally.one_sided_blank += 1;
            }
            continue;
        }

        let from = cache.get_or_resolve(&st.subject, |u| policy.resolve(store, u))?;
        let to = cache.get_or_resolve(&st.object, |u| policy.resolve(store, u))?;
        let (Some(from), Some(to)) = (from, to) else {
            tally.missed += 1;
            continue;
        };
        policy.apply_relationship(store, from, to, &st.rel_type, tally)?;
        for (node, uri) in [(to, &st.object), (from, &st.subject)] {
            if policy.collect_if_empty(store, node)? {
                cache.invalidate(uri);
            }
        }
    }
    Ok(())
}

impl<R: Router, A: ApplyPolicy> RdfHandler for StatementProcessor<'_, R, A> {
    type Error = ImportError;

    fn start_rdf(&mut self) -> ImportResult<()> {
        info!(
            vocab = ?self.graph_config.handle_vocab_uris,
            commit_size = self.config.commit_size,
            "starting RDF run"
        );
        let mut vocab = Vocabulary::new(&self.graph_config, &mut self.registry);
        self.router.start(&mut vocab)
    }

    fn handle_statement(&mut self, triple: Triple) -> ImportResult<()> {
        if let Some(limit) = self.config.stream_triple_limit {
            if self.summary.triples_parsed >= limit {
                return Err(ImportError::TripleLimitReached(limit));
            }
        }
        self.summary.triples_parsed += 1;

        if !self.config.is_excluded(triple.predicate.as_str()) {
            let mut vocab = Vocabulary::new(&self.graph_config, &mut self.registry);
            if self.router.classify(&triple, &mut vocab, &mut self.batch)? {
                self.batch.count_mapped();
            }
        }

        if self.batch.mapped() >= self.config.commit_size.max(1) {
            self.periodic_operation()?;
        }
        Ok(())
    }

    fn end_rdf(&mut self) -> ImportResult<()> {
        self.periodic_operation()?;

        let unapplied = self.router.unapplied_at_end();
        self.summary.triples_mapped = self.summary.triples_mapped.saturating_sub(unapplied);
        self.summary.namespaces = self.registry.prefixes().clone();
        if self.summary.blank_node_statements > 0 {
            self.summary.extra_info = Some(format!(
                "{} of the statements could not be applied, due to use of blank nodes.",
                self.summary.blank_node_statements
            ));
        }
        info!(summary = %self.summary, "RDF run complete");
        Ok(())
    }
}
