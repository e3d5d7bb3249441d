//! Batch accumulator
//!
//! A [`Batch`] buffers the label, property and relationship deltas of one
//! partial commit. The processor takes it out with [`Batch::take`], applies
//! it inside a single transaction and starts over with an empty one.

use crate::graph::PropertyValue;
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

/// Buffered value of one property
#[derive(Debug, Clone, PartialEq)]
pub enum PendingValue {
    /// Replaces (or, for delete, removes) the stored value
    Single(PropertyValue),
    /// Merged into (or subtracted from) the stored values, set semantics
    Multi(Vec<PropertyValue>),
}

impl PendingValue {
    /// Number of statements this value stands for
    pub fn len(&self) -> usize {
        match self {
            PendingValue::Single(_) => 1,
            PendingValue::Multi(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deltas buffered for one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingResource {
    pub labels: IndexSet<String>,
    pub properties: IndexMap<String, PendingValue>,
    /// Label and property statements attributed to the resource
    pub statements: u64,
}

/// A relationship statement with its type already translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStatement {
    pub subject: String,
    pub rel_type: String,
    pub object: String,
}

/// Everything buffered since the last flush
#[derive(Debug, Default)]
pub struct Batch {
    resources: IndexMap<String, PendingResource>,
    statements: Vec<PendingStatement>,
    mapped: u64,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `uri` is applied at flush, even with no deltas of its own
    pub fn resource(&mut self, uri: &str) -> &mut PendingResource {
        self.resources.entry(uri.to_string()).or_default()
    }

    pub fn add_label(&mut self, uri: &str, label: impl Into<String>) {
        self.resource(uri).labels.insert(label.into());
    }

    /// Buffer a property value. Multi-valued keys collect distinct values,
    /// single-valued keys keep the last one.
    pub fn set_property(&mut self, uri: &str, key: impl Into<String>, value: PropertyValue, multivalued: bool) {
        let properties = &mut self.resource(uri).properties;
        if !multivalued {
            properties.insert(key.into(), PendingValue::Single(value));
            return;
        }
        match properties.entry(key.into()) {
            Entry::Vacant(slot) => {
                slot.insert(PendingValue::Multi(vec![value]));
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                PendingValue::Multi(values) => {
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
                PendingValue::Single(previous) => {
                    let merged = if *previous == value {
                        vec![value]
                    } else {
                        vec![previous.clone(), value]
                    };
                    slot.insert(PendingValue::Multi(merged));
                }
            },
        }
    }

    /// Buffer a relationship; both endpoints become pending resources
    pub fn add_statement(&mut self, subject: &str, rel_type: impl Into<String>, object: &str) {
        self.resource(subject);
        self.resource(object);
        self.statements.push(PendingStatement {
            subject: subject.to_string(),
            rel_type: rel_type.into(),
            object: object.to_string(),
        });
    }

    /// Attribute one label or property statement to `uri`
    pub fn record(&mut self, uri: &str) {
        self.resource(uri).statements += 1;
    }

    pub fn count_mapped(&mut self) {
        self.mapped += 1;
    }

    /// Statements mapped into this batch
    pub fn mapped(&self) -> u64 {
        self.mapped
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.statements.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &PendingResource)> + '_ {
        self.resources.iter().map(|(uri, r)| (uri.as_str(), r))
    }

    pub fn statements(&self) -> &[PendingStatement] {
        &self.statements
    }

    /// Move the buffered deltas out, leaving an empty batch behind
    pub fn take(&mut self) -> Batch {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multivalued_collects_distinct_values() {
        let mut batch = Batch::new();
        batch.set_property("u", "p", "a".into(), true);
        batch.set_property("u", "p", "b".into(), true);
        batch.set_property("u", "p", "a".into(), true);

        let (_, res) = batch.resources().next().unwrap();
        assert_eq!(
            res.properties.get("p"),
            Some(&PendingValue::Multi(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_single_valued_overwrites() {
        let mut batch = Batch::new();
        batch.set_property("u", "p", 1i64.into(), false);
        batch.set_property("u", "p", 2i64.into(), false);
        let (_, res) = batch.resources().next().unwrap();
        assert_eq!(res.properties.get("p"), Some(&PendingValue::Single(2i64.into())));
    }

    #[test]
    fn test_statement_registers_endpoints() {
        let mut batch = Batch::new();
        batch.add_statement("s", "KNOWS", "o");
        batch.record("s");
        batch.count_mapped();

        let uris: Vec<&str> = batch.resources().map(|(u, _)| u).collect();
        assert_eq!(uris, vec!["s", "o"]);
        assert_eq!(batch.statements().len(), 1);
        assert_eq!(batch.mapped(), 1);

        let taken = batch.take();
        assert!(batch.is_empty());
        assert_eq!(batch.mapped(), 0);
        assert!(!taken.is_empty());
    }
}
