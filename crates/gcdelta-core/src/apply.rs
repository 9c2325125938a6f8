//! Apply change operations to a file state.
//!
//! `apply()` is a pure function: it never mutates its input and returns a
//! fresh state. Placement of added, modified and moved aggregates is
//! anchored on the target order carried by the op, so each op is
//! self-contained and can be replayed on its own.
//!
//! ## Example
//!
//! ```
//! use gcdelta_core::{apply::apply, ChangeOp, FileState, RecordLayout};
//!
//! let text = "<gc:CodeList>\n<Identification>\n</Identification>\n</gc:CodeList>\n";
//! let state = FileState::parse(text, &RecordLayout::default()).unwrap();
//! let op = ChangeOp::FooterChange {
//!     footer: vec!["</gc:CodeList>\n".to_string()],
//!     description: "Update file footer".to_string(),
//! };
//! let next = apply(&state, &op);
//! assert_eq!(next.footer(), ["</gc:CodeList>\n".to_string()]);
//! ```

use crate::diff::model::{ChangeOp, TargetOrder};
use crate::state::FileState;
use tracing::trace;

/// Apply one op to `state`, returning the resulting state.
///
/// Ops never fail: a `Remove` or `Reposition` of an absent key is a no-op,
/// and an `Add` or `Modify` whose key is not in its target order is
/// appended at the end.
pub fn apply(state: &FileState, op: &ChangeOp) -> FileState {
    let mut next = state.clone();
    apply_in_place(&mut next, op);
    next
}

/// In-place form of [`apply`], for callers working on a scratch copy.
pub fn apply_in_place(state: &mut FileState, op: &ChangeOp) {
    trace!(kind = ?op.kind(), key = op.key().unwrap_or(""), "apply op");
    match op {
        ChangeOp::Metadata { identity, .. } => {
            let rest = state.column_area().to_vec();
            state.header = identity.clone();
            state.identity_end = if identity.is_empty() {
                None
            } else {
                Some(identity.len() - 1)
            };
            state.header.extend(rest);
        }
        ChangeOp::SchemaChange {
            column_area,
            removed,
            ..
        } => {
            let keep = state.identity_end.map_or(0, |end| end + 1);
            state.header.truncate(keep);
            state.header.extend(column_area.iter().cloned());
            if !removed.is_empty() {
                for block in state.blocks.values_mut() {
                    *block = removed.iter().fold(std::mem::take(block), |text, span| {
                        span.strip(&text)
                    });
                }
            }
        }
        ChangeOp::Remove { key, .. } => {
            state.detach(key);
        }
        ChangeOp::Modify {
            key,
            block,
            target_order,
            ..
        }
        | ChangeOp::Add {
            key,
            block,
            target_order,
            ..
        } => place(state, key, block, target_order),
        ChangeOp::Reposition {
            key, target_order, ..
        } => {
            if let Some(block) = state.detach(key) {
                let after = anchor(state, key, target_order);
                state.insert_after(after.as_deref(), key.clone(), block);
            }
        }
        ChangeOp::FooterChange { footer, .. } => {
            state.footer = footer.clone();
        }
    }
}

/// Put `block` under `key`, positioned after its nearest present
/// predecessor in target order.
///
/// A key already sitting right after that predecessor is replaced in place.
fn place(state: &mut FileState, key: &str, block: &str, target: &TargetOrder) {
    if target.position(key).is_none() {
        if let Some(existing) = state.blocks.get_mut(key) {
            *existing = block.to_string();
            return;
        }
        let last = state.order.last().cloned();
        state.insert_after(last.as_deref(), key.to_string(), block.to_string());
        return;
    }

    let after = anchor(state, key, target);
    if state.contains(key) && state.predecessor(key) == after.as_deref() {
        if let Some(existing) = state.blocks.get_mut(key) {
            *existing = block.to_string();
        }
        return;
    }
    state.detach(key);
    state.insert_after(after.as_deref(), key.to_string(), block.to_string());
}

fn anchor(state: &FileState, key: &str, target: &TargetOrder) -> Option<String> {
    target
        .nearest_preceding(key, |k| k != key && state.contains(k))
        .map(str::to_string)
}
