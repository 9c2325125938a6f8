//! Structural diff computation.
//!
//! The entry point is [`diff`], which compares two parsed file states and
//! returns the ordered change operations that rebuild the new state from
//! the old one.
//!
//! Phases run in a fixed order; later phases depend on the earlier ones:
//!
//! 1. `Metadata` (identity sub-block only)
//! 2. `SchemaChange` (column area; removed fields are stripped before any
//!    aggregate comparison)
//! 3. `Remove`, sorted by key
//! 4. `Modify`, in new-file order, comparing against the stripped old text
//! 5. `Add`, in the new file's dependency order; keys the grapher does not
//!    know come last, sorted
//! 6. `Reposition`, found by simulating 1-5 on a scratch copy
//! 7. `FooterChange`

use crate::aggregate::build_aggregates;
use crate::apply::apply_in_place;
use crate::config::RecordLayout;
use crate::core_types::schema::FIELD_OP_COUNT;
use crate::diff::model::{ChangeOp, FieldSpan, TargetOrder};
use crate::diff::schema::{column_delta, field_span, schema_description, short_name};
use crate::errors::Result;
use crate::planner::{members_in_row_order, plan_insertion_order};
use crate::state::FileState;
use crate::{log_op_end, log_op_error, log_op_start};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::debug;

/// Compute the ordered change operations turning `old` into `new`.
///
/// Replaying the result on `old` with [`crate::apply::apply`] reproduces
/// `new` exactly; [`crate::replay::diff_verified`] checks that.
///
/// # Errors
///
/// - `MalformedSchema` if either header has a column definition without an id
/// - `UnbalancedDelimiter` if a block of `new` no longer splits into records
pub fn diff(old: &FileState, new: &FileState, layout: &RecordLayout) -> Result<Vec<ChangeOp>> {
    let started = Instant::now();
    log_op_start!(
        "diff",
        old_aggregates = old.len(),
        new_aggregates = new.len()
    );

    match compute(old, new, layout) {
        Ok(ops) => {
            log_op_end!(
                "diff",
                duration_ms = started.elapsed().as_millis() as u64,
                { FIELD_OP_COUNT } = ops.len()
            );
            Ok(ops)
        }
        Err(err) => {
            log_op_error!(
                "diff",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

fn compute(old: &FileState, new: &FileState, layout: &RecordLayout) -> Result<Vec<ChangeOp>> {
    let target = TargetOrder::new(new.keys());
    let mut ops = Vec::new();

    if let Some(op) = metadata_change(old, new, layout) {
        ops.push(op);
    }

    let removed_fields = match schema_change(old, new, layout)? {
        Some((op, removed)) => {
            ops.push(op);
            removed
        }
        None => Vec::new(),
    };

    let removals = removals(old, new, layout);
    let modifications = modifications(old, new, &removed_fields, &target, layout);
    let additions = additions(old, new, &target, layout)?;
    debug!(
        removed = removals.len(),
        modified = modifications.len(),
        added = additions.len(),
        stripped_fields = removed_fields.len(),
        "aggregate phases computed"
    );
    ops.extend(removals);
    ops.extend(modifications);
    ops.extend(additions);

    let moves = repositions(old, new, &ops, &target, layout);
    debug!(moved = moves.len(), "reposition phase computed");
    ops.extend(moves);

    if old.footer() != new.footer() {
        ops.push(ChangeOp::FooterChange {
            footer: new.footer().to_vec(),
            description: "Update file footer".to_string(),
        });
    }
    Ok(ops)
}

fn metadata_change(old: &FileState, new: &FileState, layout: &RecordLayout) -> Option<ChangeOp> {
    if old.identity() == new.identity() {
        return None;
    }
    let description = match (
        short_name(old.identity(), layout),
        short_name(new.identity(), layout),
    ) {
        (Some(from), Some(to)) => format!("Update metadata ({} -> {})", from, to),
        _ => "Update GenericCode metadata".to_string(),
    };
    Some(ChangeOp::Metadata {
        identity: new.identity().to_vec(),
        description,
    })
}

fn schema_change(
    old: &FileState,
    new: &FileState,
    layout: &RecordLayout,
) -> Result<Option<(ChangeOp, Vec<FieldSpan>)>> {
    if old.column_area() == new.column_area() {
        return Ok(None);
    }
    let (removed, added) = column_delta(old, new, layout)?;
    let spans: Vec<FieldSpan> = removed.iter().map(|f| field_span(f, layout)).collect();
    let op = ChangeOp::SchemaChange {
        column_area: new.column_area().to_vec(),
        removed: spans.clone(),
        description: schema_description(&removed, &added),
        added,
    };
    Ok(Some((op, spans)))
}

/// Old block text with every removed field's value spans excised.
pub fn adjusted_block(block: &str, removed: &[FieldSpan]) -> String {
    removed
        .iter()
        .fold(block.to_string(), |text, span| span.strip(&text))
}

fn removals(old: &FileState, new: &FileState, layout: &RecordLayout) -> Vec<ChangeOp> {
    let gone: BTreeSet<&String> = old.keys().iter().filter(|k| !new.contains(k)).collect();
    gone.into_iter()
        .map(|key| ChangeOp::Remove {
            key: key.clone(),
            description: format!("Remove {} \"{}\"", layout.parent_value, key),
        })
        .collect()
}

fn modifications(
    old: &FileState,
    new: &FileState,
    removed: &[FieldSpan],
    target: &TargetOrder,
    layout: &RecordLayout,
) -> Vec<ChangeOp> {
    let mut ops = Vec::new();
    for key in new.keys() {
        let (Some(before), Some(after)) = (old.block(key), new.block(key)) else {
            continue;
        };
        let changed = if removed.is_empty() {
            before != after
        } else {
            adjusted_block(before, removed) != after
        };
        if changed {
            ops.push(ChangeOp::Modify {
                key: key.clone(),
                block: after.to_string(),
                target_order: target.clone(),
                description: format!("Modify {} \"{}\"", layout.parent_value, key),
            });
        }
    }
    ops
}

fn additions(
    old: &FileState,
    new: &FileState,
    target: &TargetOrder,
    layout: &RecordLayout,
) -> Result<Vec<ChangeOp>> {
    let mut pending: BTreeSet<&str> = new
        .keys()
        .iter()
        .filter(|k| !old.contains(k))
        .map(String::as_str)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let index = build_aggregates(new, layout)?;
    let mut ordered: Vec<(String, Option<usize>)> = Vec::with_capacity(pending.len());
    for (position, group) in plan_insertion_order(&index).iter().enumerate() {
        for key in members_in_row_order(group, &index) {
            if pending.remove(key.as_str()) {
                ordered.push((key, Some(position)));
            }
        }
    }
    // Keys outside the graph (the unclassified group) go last, sorted.
    ordered.extend(pending.into_iter().map(|key| (key.to_string(), None)));

    Ok(ordered
        .into_iter()
        .filter_map(|(key, group)| {
            let block = new.block(&key)?.to_string();
            Some(ChangeOp::Add {
                description: format!("Add {} \"{}\"", layout.parent_value, key),
                key,
                block,
                target_order: target.clone(),
                group,
            })
        })
        .collect())
}

/// Simulate `prior` on a scratch copy of `old`, then move every aggregate
/// whose predecessor differs from the nearest present one in target order.
///
/// Only the immediate predecessor is checked, so the number of moves is not
/// guaranteed minimal for every ordering.
fn repositions(
    old: &FileState,
    new: &FileState,
    prior: &[ChangeOp],
    target: &TargetOrder,
    layout: &RecordLayout,
) -> Vec<ChangeOp> {
    let mut scratch = old.clone();
    for op in prior {
        apply_in_place(&mut scratch, op);
    }

    let mut moves = Vec::new();
    for key in new.keys() {
        if !scratch.contains(key) {
            continue;
        }
        let expected = target.nearest_preceding(key, |k| scratch.contains(k));
        if scratch.predecessor(key) == expected {
            continue;
        }
        let op = ChangeOp::Reposition {
            key: key.clone(),
            target_order: target.clone(),
            description: format!("Move {} \"{}\"", layout.parent_value, key),
        };
        apply_in_place(&mut scratch, &op);
        moves.push(op);
    }
    moves
}
