//! Reference validity checks for intermediate states.
//!
//! A state is valid when every reference child points at an aggregate the
//! state contains. [`ReferenceTracker`] keeps per-aggregate reference
//! targets up to date op by op, so checking a long history does not
//! re-split every block after every step.

use crate::config::RecordLayout;
use crate::diff::ChangeOp;
use crate::errors::Result;
use crate::parser::split_records;
use crate::record::{Record, RecordKind};
use crate::state::FileState;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    pub from: String,
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTracker {
    targets: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceTracker {
    /// Index the reference targets of every aggregate in `state`.
    ///
    /// # Errors
    ///
    /// Returns `DeltaError::UnbalancedDelimiter` if a block does not split
    /// into whole records.
    pub fn new(state: &FileState, layout: &RecordLayout) -> Result<Self> {
        let mut tracker = ReferenceTracker::default();
        tracker.reindex(state, layout)?;
        Ok(tracker)
    }

    fn reindex(&mut self, state: &FileState, layout: &RecordLayout) -> Result<()> {
        self.targets.clear();
        for key in state.keys() {
            self.refresh(state, key, layout)?;
        }
        Ok(())
    }

    fn refresh(&mut self, state: &FileState, key: &str, layout: &RecordLayout) -> Result<()> {
        match state.block(key) {
            Some(block) if key != layout.unclassified_key => {
                let targets = reference_targets(key, block, layout)?;
                self.targets.insert(key.to_string(), targets);
            }
            _ => {
                self.targets.remove(key);
            }
        }
        Ok(())
    }

    /// Update the index after `op` has been applied to `state`.
    ///
    /// # Errors
    ///
    /// See [`ReferenceTracker::new`].
    pub fn observe(&mut self, state: &FileState, op: &ChangeOp, layout: &RecordLayout) -> Result<()> {
        match op {
            ChangeOp::Add { key, .. } | ChangeOp::Modify { key, .. } => {
                self.refresh(state, key, layout)
            }
            ChangeOp::Remove { key, .. } => {
                self.targets.remove(key);
                Ok(())
            }
            ChangeOp::SchemaChange { removed, .. } if !removed.is_empty() => {
                self.reindex(state, layout)
            }
            ChangeOp::SchemaChange { .. }
            | ChangeOp::Metadata { .. }
            | ChangeOp::Reposition { .. }
            | ChangeOp::FooterChange { .. } => Ok(()),
        }
    }

    /// References in `state` whose target aggregate is absent, sorted.
    pub fn dangling(&self, state: &FileState) -> Vec<DanglingReference> {
        let mut out = Vec::new();
        for (from, targets) in &self.targets {
            for target in targets {
                if !state.contains(target) {
                    out.push(DanglingReference {
                        from: from.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        out
    }
}

/// Dangling references of a state, computed from scratch.
///
/// # Errors
///
/// See [`ReferenceTracker::new`].
pub fn dangling_references(state: &FileState, layout: &RecordLayout) -> Result<Vec<DanglingReference>> {
    Ok(ReferenceTracker::new(state, layout)?.dangling(state))
}

fn reference_targets(key: &str, block: &str, layout: &RecordLayout) -> Result<BTreeSet<String>> {
    let mut targets = BTreeSet::new();
    for raw in split_records(block, layout, 1)?.into_iter().skip(1) {
        let record = Record::classify(raw, layout);
        if record.kind == RecordKind::ReferenceChild
            && !record.target.is_empty()
            && record.target != key
            && record.target != layout.unclassified_key
        {
            targets.insert(record.target);
        }
    }
    Ok(targets)
}
