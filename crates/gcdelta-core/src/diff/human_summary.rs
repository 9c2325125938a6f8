//! Human-readable summary renderer for change op lists.

use crate::diff::model::{ChangeKind, ChangeOp};
use std::collections::BTreeMap;

/// Render a Markdown summary of an op list.
///
/// Intended for review output next to the structured ops; it carries no
/// information the ops themselves do not.
pub fn render_human_summary(ops: &[ChangeOp]) -> String {
    let mut out = String::new();
    out.push_str("## Structural Diff\n\n");

    if ops.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }

    let mut counts: BTreeMap<ChangeKind, usize> = BTreeMap::new();
    for op in ops {
        *counts.entry(op.kind()).or_default() += 1;
    }

    out.push_str("| Change | Count |\n|---|---|\n");
    for (kind, count) in &counts {
        out.push_str(&format!("| {} | {} |\n", kind_label(*kind), count));
    }
    out.push('\n');

    out.push_str("### Operations\n\n");
    for (i, op) in ops.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, op.description()));
    }
    out
}

fn kind_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Metadata => "Metadata",
        ChangeKind::SchemaChange => "Schema",
        ChangeKind::Remove => "Remove",
        ChangeKind::Modify => "Modify",
        ChangeKind::Add => "Add",
        ChangeKind::Reposition => "Move",
        ChangeKind::FooterChange => "Footer",
    }
}
