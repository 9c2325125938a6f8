//! Aggregate builder.
//!
//! An aggregate is one parent record plus the attribute and reference
//! children that follow it. Reference children give the aggregate its
//! dependency edges.

use crate::config::RecordLayout;
use crate::core_types::schema::FIELD_AGGREGATE_COUNT;
use crate::errors::{DeltaError, Result};
use crate::parser::split_records;
use crate::record::{Record, RecordKind};
use crate::state::FileState;
use crate::{log_op_end, log_op_error, log_op_start};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Display name of the parent record
    pub name: String,
    /// Type-class key
    pub key: String,
    pub parent: Record,
    pub attributes: Vec<Record>,
    pub references: Vec<Record>,
    /// Keys this aggregate references, excluding itself
    pub depends_on: BTreeSet<String>,
    pub self_reference: bool,
}

impl Aggregate {
    fn open(parent: Record) -> Self {
        Self {
            name: parent.name.clone(),
            key: parent.key.clone(),
            parent,
            attributes: Vec::new(),
            references: Vec::new(),
            depends_on: BTreeSet::new(),
            self_reference: false,
        }
    }

    fn attach(&mut self, child: Record) {
        match child.kind {
            RecordKind::AttributeChild => self.attributes.push(child),
            RecordKind::ReferenceChild => {
                if child.target == self.key {
                    self.self_reference = true;
                } else if !child.target.is_empty() {
                    self.depends_on.insert(child.target.clone());
                }
                self.references.push(child);
            }
            RecordKind::Parent | RecordKind::Unclassified => {}
        }
    }

    /// Position of the parent record in its source
    pub fn seq(&self) -> usize {
        self.parent.block.seq
    }
}

/// A reference to a type-class key no aggregate defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub from: String,
    pub target: String,
    pub line: usize,
}

impl From<UnresolvedReference> for DeltaError {
    fn from(r: UnresolvedReference) -> Self {
        DeltaError::UnresolvedReference {
            from: r.from,
            target: r.target,
            line: r.line,
        }
    }
}

/// Aggregates by type-class key, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateIndex {
    order: Vec<String>,
    aggregates: BTreeMap<String, Aggregate>,
    unclassified: Vec<Record>,
    unresolved: Vec<UnresolvedReference>,
}

impl AggregateIndex {
    /// Build from a classified record sequence with a linear scan.
    ///
    /// A parent opens a new aggregate; children attach to the open one,
    /// even past unclassified records. Unclassified records, and children
    /// with no open aggregate, are kept aside in their original relative
    /// order. A repeated parent key replaces the earlier aggregate.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut index = AggregateIndex::default();
        let mut current: Option<Aggregate> = None;

        for record in records {
            match record.kind {
                RecordKind::Parent => {
                    if let Some(done) = current.take() {
                        index.insert(done);
                    }
                    current = Some(Aggregate::open(record));
                }
                RecordKind::AttributeChild | RecordKind::ReferenceChild => match current.as_mut() {
                    Some(aggregate) => aggregate.attach(record),
                    None => index.unclassified.push(record),
                },
                RecordKind::Unclassified => index.unclassified.push(record),
            }
        }
        if let Some(done) = current {
            index.insert(done);
        }
        index.resolve();
        index
    }

    fn insert(&mut self, aggregate: Aggregate) {
        if !self.aggregates.contains_key(&aggregate.key) {
            self.order.push(aggregate.key.clone());
        }
        self.aggregates.insert(aggregate.key.clone(), aggregate);
    }

    /// Drop dependencies on undefined keys and record them.
    fn resolve(&mut self) {
        let known: BTreeSet<String> = self.aggregates.keys().cloned().collect();
        for key in &self.order {
            let Some(aggregate) = self.aggregates.get_mut(key) else {
                continue;
            };
            let dangling: Vec<String> = aggregate
                .depends_on
                .iter()
                .filter(|target| !known.contains(*target))
                .cloned()
                .collect();
            for target in dangling {
                aggregate.depends_on.remove(&target);
                let line = aggregate
                    .references
                    .iter()
                    .find(|r| r.target == target)
                    .map(Record::line)
                    .unwrap_or_else(|| aggregate.parent.line());
                warn!(
                    aggregate_key = %key,
                    target = %target,
                    line,
                    "unresolved reference"
                );
                self.unresolved.push(UnresolvedReference {
                    from: key.clone(),
                    target,
                    line,
                });
            }
        }
    }

    /// Keys in file order
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, key: &str) -> Option<&Aggregate> {
        self.aggregates.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.aggregates.contains_key(key)
    }

    /// Aggregates in file order
    pub fn iter(&self) -> impl Iterator<Item = &Aggregate> {
        self.order.iter().filter_map(|k| self.aggregates.get(k))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn unclassified(&self) -> &[Record] {
        &self.unclassified
    }

    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Fail on the first unresolved reference.
    ///
    /// # Errors
    ///
    /// Returns `DeltaError::UnresolvedReference` for the first dangling
    /// reference in file order.
    pub fn require_resolved(&self) -> Result<()> {
        match self.unresolved.first() {
            Some(r) => Err(r.clone().into()),
            None => Ok(()),
        }
    }
}

/// Build the aggregate index of a file state.
///
/// Each stored block is split back into records and grouped on its own: in
/// an aggregate block the first record is the parent, and the unclassified
/// block contributes only unclassified records.
///
/// # Errors
///
/// Returns `DeltaError::UnbalancedDelimiter` if a stored block no longer
/// splits into whole records.
pub fn build_aggregates(state: &FileState, layout: &RecordLayout) -> Result<AggregateIndex> {
    let started = Instant::now();
    log_op_start!("build_aggregates");

    match collect_records(state, layout) {
        Ok(records) => {
            let index = AggregateIndex::from_records(records);
            log_op_end!(
                "build_aggregates",
                duration_ms = started.elapsed().as_millis() as u64,
                { FIELD_AGGREGATE_COUNT } = index.len(),
                unresolved_count = index.unresolved().len()
            );
            Ok(index)
        }
        Err(err) => {
            log_op_error!(
                "build_aggregates",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

fn collect_records(state: &FileState, layout: &RecordLayout) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut line = state.header().len() + 1;
    let mut seq = 0;

    for key in state.keys() {
        let Some(block) = state.block(key) else {
            continue;
        };
        let unclassified = *key == layout.unclassified_key;
        for (i, mut raw) in split_records(block, layout, line)?.into_iter().enumerate() {
            seq += 1;
            raw.seq = seq;
            let mut record = Record::classify(raw, layout);
            record.kind = match (unclassified, i) {
                (true, _) => RecordKind::Unclassified,
                (false, 0) => RecordKind::Parent,
                (false, _) if record.kind == RecordKind::Parent => RecordKind::Unclassified,
                (false, _) => record.kind,
            };
            if record.kind == RecordKind::Parent {
                record.key = key.clone();
            }
            records.push(record);
        }
        line += block.lines().count();
    }
    Ok(records)
}
