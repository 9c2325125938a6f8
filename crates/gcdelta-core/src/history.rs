//! History builder.
//!
//! Turns a diff (or a from-scratch build) into an ordered list of
//! snapshots, one per step, each with a description and a digest. The
//! builder only produces data; writing snapshots out and committing them
//! is left to the caller.
//!
//! ## Steps
//!
//! - First appearance: a skeleton step (header and footer), one step per
//!   insertion group (a cycle group is one step), then the unclassified
//!   rows.
//! - Transition: one step per op, except that consecutive `Add` ops from
//!   the same cycle group share a step.
//!
//! After every step the builder checks for references to absent
//! aggregates. References that already dangle in the input files are
//! ignored; anything else is logged at `warn` and kept on the step.

use crate::aggregate::build_aggregates;
use crate::apply::apply_in_place;
use crate::config::RecordLayout;
use crate::core_types::schema::FIELD_STEP_COUNT;
use crate::diff::{diff, ChangeOp, TargetOrder};
use crate::digest::{compute_history_digest, text_digest};
use crate::errors::Result;
use crate::planner::{group_description, members_in_row_order, plan_insertion_order};
use crate::replay::verify_round_trip;
use crate::serialize::serialize;
use crate::state::FileState;
use crate::validity::{dangling_references, DanglingReference, ReferenceTracker};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::warn;

pub const SKELETON_DESCRIPTION: &str = "Initialize file skeleton (header and footer)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStep {
    /// 1-based
    pub sequence: usize,
    pub description: String,
    /// Aggregate keys touched by this step
    pub keys: Vec<String>,
    pub ops: Vec<ChangeOp>,
    /// Serialized file after this step
    #[serde(skip)]
    pub text: String,
    /// SHA256 of `text`
    pub digest: String,
    /// References left dangling by this step only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<DanglingReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    pub steps: Vec<HistoryStep>,
    /// Digest over the ordered step digests
    pub digest: String,
}

impl History {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn final_text(&self) -> Option<&str> {
        self.steps.last().map(|s| s.text.as_str())
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.description.as_str())
    }

    /// Steps that left references dangling
    pub fn invalid_steps(&self) -> impl Iterator<Item = &HistoryStep> {
        self.steps.iter().filter(|s| !s.dangling.is_empty())
    }
}

/// Build the history of a file appearing for the first time.
///
/// # Errors
///
/// Propagates parse errors, and returns `DeltaError::RoundTripMismatch` if
/// the last step does not reproduce `text` exactly.
pub fn first_appearance(text: &str, layout: &RecordLayout) -> Result<History> {
    let started = Instant::now();
    log_op_start!("history_first_appearance");

    match build_first_appearance(text, layout) {
        Ok(history) => {
            log_op_end!(
                "history_first_appearance",
                duration_ms = started.elapsed().as_millis() as u64,
                { FIELD_STEP_COUNT } = history.len()
            );
            Ok(history)
        }
        Err(err) => {
            log_op_error!(
                "history_first_appearance",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

/// Build the history of a change from `old_text` to `new_text`.
///
/// Identical inputs give an empty history.
///
/// # Errors
///
/// Propagates parse and diff errors, and returns
/// `DeltaError::RoundTripMismatch` if the last step does not reproduce
/// `new_text` exactly.
pub fn transition(old_text: &str, new_text: &str, layout: &RecordLayout) -> Result<History> {
    let started = Instant::now();
    log_op_start!("history_transition");

    match build_transition(old_text, new_text, layout) {
        Ok(history) => {
            log_op_end!(
                "history_transition",
                duration_ms = started.elapsed().as_millis() as u64,
                { FIELD_STEP_COUNT } = history.len()
            );
            Ok(history)
        }
        Err(err) => {
            log_op_error!(
                "history_transition",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

fn build_first_appearance(text: &str, layout: &RecordLayout) -> Result<History> {
    let new = FileState::parse(text, layout)?;
    let index = build_aggregates(&new, layout)?;
    let target = TargetOrder::new(new.keys());
    let baseline = dangling_references(&new, layout)?.into_iter().collect();

    let mut recorder = Recorder::new(new.skeleton(), layout, baseline)?;
    recorder.record(SKELETON_DESCRIPTION.to_string(), Vec::new())?;

    let mut placed: BTreeSet<String> = BTreeSet::new();
    for (position, group) in plan_insertion_order(&index).iter().enumerate() {
        let keys = members_in_row_order(group, &index);
        let ops: Vec<ChangeOp> = keys
            .iter()
            .filter_map(|key| add_op(&new, key, &target, Some(position), layout))
            .collect();
        if ops.is_empty() {
            continue;
        }
        let description = if ops.len() == 1 {
            ops[0].description().to_string()
        } else {
            group_description(&keys, group.is_cycle)
        };
        placed.extend(keys);
        recorder.record(description, ops)?;
    }

    for key in new.keys() {
        if placed.contains(key) {
            continue;
        }
        let Some(op) = add_op(&new, key, &target, None, layout) else {
            continue;
        };
        let description = if *key == layout.unclassified_key {
            format!("Add unclassified rows ({})", index.unclassified().len())
        } else {
            op.description().to_string()
        };
        recorder.record(description, vec![op])?;
    }

    recorder.finish(text)
}

fn build_transition(old_text: &str, new_text: &str, layout: &RecordLayout) -> Result<History> {
    let old = FileState::parse(old_text, layout)?;
    let new = FileState::parse(new_text, layout)?;
    let ops = diff(&old, &new, layout)?;

    let mut baseline: BTreeSet<DanglingReference> =
        dangling_references(&old, layout)?.into_iter().collect();
    baseline.extend(dangling_references(&new, layout)?);

    let mut recorder = Recorder::new(old, layout, baseline)?;
    for batch in batch_cycle_adds(ops) {
        let description = if batch.len() == 1 {
            batch[0].description().to_string()
        } else {
            let keys: Vec<String> = batch
                .iter()
                .filter_map(ChangeOp::key)
                .map(str::to_string)
                .collect();
            group_description(&keys, true)
        };
        recorder.record(description, batch)?;
    }
    recorder.finish(new_text)
}

/// Split `ops` into steps, keeping consecutive adds of one group together.
fn batch_cycle_adds(ops: Vec<ChangeOp>) -> Vec<Vec<ChangeOp>> {
    let mut batches: Vec<Vec<ChangeOp>> = Vec::new();
    for op in ops {
        let joins = match (&op, batches.last().and_then(|b| b.last())) {
            (
                ChangeOp::Add {
                    group: Some(group), ..
                },
                Some(ChangeOp::Add {
                    group: Some(previous),
                    ..
                }),
            ) => group == previous,
            _ => false,
        };
        match batches.last_mut() {
            Some(batch) if joins => batch.push(op),
            _ => batches.push(vec![op]),
        }
    }
    batches
}

fn add_op(
    state: &FileState,
    key: &str,
    target: &TargetOrder,
    group: Option<usize>,
    layout: &RecordLayout,
) -> Option<ChangeOp> {
    let block = state.block(key)?;
    Some(ChangeOp::Add {
        key: key.to_string(),
        block: block.to_string(),
        target_order: target.clone(),
        group,
        description: format!("Add {} \"{}\"", layout.parent_value, key),
    })
}

/// Applies step batches to a working state and snapshots the result.
struct Recorder<'a> {
    layout: &'a RecordLayout,
    state: FileState,
    tracker: ReferenceTracker,
    baseline: BTreeSet<DanglingReference>,
    steps: Vec<HistoryStep>,
}

impl<'a> Recorder<'a> {
    fn new(
        state: FileState,
        layout: &'a RecordLayout,
        baseline: BTreeSet<DanglingReference>,
    ) -> Result<Self> {
        Ok(Self {
            tracker: ReferenceTracker::new(&state, layout)?,
            layout,
            state,
            baseline,
            steps: Vec::new(),
        })
    }

    fn record(&mut self, description: String, ops: Vec<ChangeOp>) -> Result<()> {
        for op in &ops {
            apply_in_place(&mut self.state, op);
            self.tracker.observe(&self.state, op, self.layout)?;
        }

        let sequence = self.steps.len() + 1;
        let dangling: Vec<DanglingReference> = self
            .tracker
            .dangling(&self.state)
            .into_iter()
            .filter(|d| !self.baseline.contains(d))
            .collect();
        if !dangling.is_empty() {
            let pairs: Vec<String> = dangling
                .iter()
                .map(|d| format!("{} -> {}", d.from, d.target))
                .collect();
            warn!(
                step = sequence,
                references = ?pairs,
                "step leaves references to absent aggregates"
            );
        }

        let text = serialize(&self.state);
        self.steps.push(HistoryStep {
            sequence,
            description,
            keys: ops
                .iter()
                .filter_map(ChangeOp::key)
                .map(str::to_string)
                .collect(),
            ops,
            digest: text_digest(&text),
            text,
            dangling,
        });
        Ok(())
    }

    fn finish(self, expected: &str) -> Result<History> {
        if !self.steps.is_empty() {
            verify_round_trip(expected, &self.state)?;
        }
        let digests: Vec<String> = self.steps.iter().map(|s| s.digest.clone()).collect();
        Ok(History {
            digest: compute_history_digest(&digests)?,
            steps: self.steps,
        })
    }
}
