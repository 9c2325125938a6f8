//! Insertion planner.
//!
//! Turns the topological group order into atomic insertion steps: a single
//! aggregate, or a whole cycle group so mutually dependent aggregates land
//! together.

use crate::aggregate::AggregateIndex;
use crate::core_types::schema::{FIELD_AGGREGATE_COUNT, FIELD_GROUP_COUNT};
use crate::graph::{DependencyGraph, SccGroup};
use crate::{log_op_end, log_op_start};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

/// SCC groups of `index` in insertion order.
pub fn plan_insertion_order(index: &AggregateIndex) -> Vec<SccGroup> {
    let started = Instant::now();
    log_op_start!("plan_insertion_order", { FIELD_AGGREGATE_COUNT } = index.len());

    let groups = DependencyGraph::from_index(index).topological_groups();

    log_op_end!(
        "plan_insertion_order",
        duration_ms = started.elapsed().as_millis() as u64,
        { FIELD_GROUP_COUNT } = groups.len()
    );
    groups
}

/// Group members in source row order.
pub fn members_in_row_order(group: &SccGroup, index: &AggregateIndex) -> Vec<String> {
    let mut members = group.members.clone();
    members.sort_by_key(|key| index.get(key).map(|a| a.seq()).unwrap_or(usize::MAX));
    members
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStep {
    /// 1-based
    pub step: usize,
    pub description: String,
    /// Keys inserted by this step, in row order
    pub keys: Vec<String>,
    pub is_cycle: bool,
    pub attribute_count: usize,
    pub reference_count: usize,
    /// Records carried by this step (parents included)
    pub record_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub steps: Vec<BuildStep>,
}

/// Describe one insertion group the way history steps are labelled.
pub fn group_description(keys: &[String], is_cycle: bool) -> String {
    if is_cycle && keys.len() > 1 {
        format!("Add cycle group: {}", keys.join(" + "))
    } else {
        format!("Add \"{}\"", keys.join(""))
    }
}

/// Plan a from-scratch build of `index`.
///
/// One step per SCC group in insertion order, then a final step for the
/// unclassified records when there are any.
pub fn plan_build(index: &AggregateIndex, unclassified_key: &str) -> BuildPlan {
    let mut steps = Vec::new();

    for group in plan_insertion_order(index) {
        let keys = members_in_row_order(&group, index);
        let (attribute_count, reference_count) = keys
            .iter()
            .filter_map(|k| index.get(k))
            .fold((0, 0), |(a, r), agg| {
                (a + agg.attributes.len(), r + agg.references.len())
            });
        steps.push(BuildStep {
            step: steps.len() + 1,
            description: group_description(&keys, group.is_cycle),
            record_count: keys.len() + attribute_count + reference_count,
            keys,
            is_cycle: group.is_cycle,
            attribute_count,
            reference_count,
        });
    }

    let unclassified = index.unclassified().len();
    if unclassified > 0 {
        steps.push(BuildStep {
            step: steps.len() + 1,
            description: format!("Add unclassified rows ({})", unclassified),
            keys: vec![unclassified_key.to_string()],
            is_cycle: false,
            attribute_count: 0,
            reference_count: 0,
            record_count: unclassified,
        });
    }

    BuildPlan { steps }
}

impl BuildPlan {
    pub fn cycle_steps(&self) -> impl Iterator<Item = &BuildStep> {
        self.steps.iter().filter(|s| s.is_cycle)
    }

    /// Markdown summary of the plan.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let cycles = self.cycle_steps().count();
        let largest = self.cycle_steps().map(|s| s.keys.len()).max().unwrap_or(0);

        let _ = writeln!(out, "# Build Plan\n");
        let _ = writeln!(out, "- Steps: {}", self.steps.len());
        let _ = writeln!(out, "- Cycle steps: {}", cycles);
        let _ = writeln!(out, "- Largest cycle: {}", largest);
        let _ = writeln!(out);
        let _ = writeln!(out, "## Steps\n");
        for step in &self.steps {
            let _ = writeln!(
                out,
                "{}. {} ({} BBIE, {} ASBIE)",
                step.step, step.description, step.attribute_count, step.reference_count
            );
        }
        out
    }
}
