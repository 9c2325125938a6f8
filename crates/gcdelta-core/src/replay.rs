//! Replay and round-trip verification.

use crate::apply::apply_in_place;
use crate::config::RecordLayout;
use crate::core_types::schema::FIELD_OP_COUNT;
use crate::diff::{diff, ChangeOp};
use crate::errors::{DeltaError, Result};
use crate::parser::split_lines;
use crate::serialize::serialize;
use crate::state::FileState;
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

const END_OF_FILE: &str = "<end of file>";

/// Apply `ops` to `old` in order.
pub fn replay(old: &FileState, ops: &[ChangeOp]) -> FileState {
    let mut state = old.clone();
    for op in ops {
        apply_in_place(&mut state, op);
    }
    state
}

/// Check that `state` serializes to exactly `expected`.
///
/// # Errors
///
/// Returns `DeltaError::RoundTripMismatch` with the first differing
/// 1-based line.
pub fn verify_round_trip(expected: &str, state: &FileState) -> Result<()> {
    let actual = serialize(state);
    if actual == expected {
        return Ok(());
    }

    let expected_lines = split_lines(expected);
    let actual_lines = split_lines(&actual);
    let at = expected_lines
        .iter()
        .zip(actual_lines.iter())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected_lines.len().min(actual_lines.len()));

    Err(DeltaError::RoundTripMismatch {
        line: at + 1,
        expected: expected_lines
            .get(at)
            .map_or(END_OF_FILE, |l| l.trim_end_matches(['\r', '\n']))
            .to_string(),
        actual: actual_lines
            .get(at)
            .map_or(END_OF_FILE, |l| l.trim_end_matches(['\r', '\n']))
            .to_string(),
        expected_lines: expected_lines.len(),
        actual_lines: actual_lines.len(),
    })
}

/// Parse both texts, diff them, and prove the ops rebuild `new_text`.
///
/// # Errors
///
/// Propagates parse and diff errors, and returns
/// `DeltaError::RoundTripMismatch` if replaying the ops does not reproduce
/// `new_text` byte for byte.
pub fn diff_verified(
    old_text: &str,
    new_text: &str,
    layout: &RecordLayout,
) -> Result<Vec<ChangeOp>> {
    let old = FileState::parse(old_text, layout)?;
    let new = FileState::parse(new_text, layout)?;
    let ops = diff(&old, &new, layout)?;

    let started = Instant::now();
    log_op_start!("replay", { FIELD_OP_COUNT } = ops.len());
    let rebuilt = replay(&old, &ops);
    match verify_round_trip(new_text, &rebuilt) {
        Ok(()) => {
            log_op_end!("replay", duration_ms = started.elapsed().as_millis() as u64);
            Ok(ops)
        }
        Err(err) => {
            log_op_error!(
                "replay",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}
