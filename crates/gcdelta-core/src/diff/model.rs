//! Change operation types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Ops serialize tagged by `kind`, so an op list renders as a readable JSON
//! array.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregate order of the target file, shared by every op of one diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetOrder(Arc<[String]>);

impl TargetOrder {
    pub fn new(keys: &[String]) -> Self {
        Self(Arc::from(keys))
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| k == key)
    }

    /// Nearest key before `key` in target order accepted by `present`.
    ///
    /// `None` when `key` is first among the present keys or is not part of
    /// the target order at all; use [`TargetOrder::position`] to tell the
    /// two apart.
    pub fn nearest_preceding<F>(&self, key: &str, present: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        let pos = self.position(key)?;
        self.0[..pos]
            .iter()
            .rev()
            .map(String::as_str)
            .find(|&k| present(k))
    }
}

/// Markers bounding one field's value span inside a record block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpan {
    pub field: String,
    /// Text identifying the line that opens the value (`ColumnRef="X"`)
    pub open_marker: String,
    /// Text identifying the line that closes the value (`</Value>`)
    pub close_marker: String,
}

impl FieldSpan {
    /// Remove every value span of this field from `block`.
    ///
    /// A span whose opening line also closes it (or self-closes) removes that
    /// line only; otherwise every line up to and including the first closing
    /// line goes.
    pub fn strip(&self, block: &str) -> String {
        let mut out = String::with_capacity(block.len());
        let mut skipping = false;
        for line in block.split_inclusive('\n') {
            if skipping {
                if line.contains(&self.close_marker) {
                    skipping = false;
                }
                continue;
            }
            if line.contains(&self.open_marker) {
                skipping =
                    !(line.contains(&self.close_marker) || line.trim_end().ends_with("/>"));
                continue;
            }
            out.push_str(line);
        }
        out
    }
}

/// Discriminant of a [`ChangeOp`], in commit-phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Metadata,
    SchemaChange,
    Remove,
    Modify,
    Add,
    Reposition,
    FooterChange,
}

/// One typed, self-contained change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeOp {
    /// Replace the document-identity sub-block of the header
    Metadata {
        identity: Vec<String>,
        description: String,
    },
    /// Replace the column definition area and strip removed fields
    SchemaChange {
        column_area: Vec<String>,
        removed: Vec<FieldSpan>,
        added: Vec<String>,
        description: String,
    },
    Remove {
        key: String,
        description: String,
    },
    Modify {
        key: String,
        block: String,
        target_order: TargetOrder,
        description: String,
    },
    Add {
        key: String,
        block: String,
        target_order: TargetOrder,
        /// Position of the key's SCC group in the insertion plan
        group: Option<usize>,
        description: String,
    },
    Reposition {
        key: String,
        target_order: TargetOrder,
        description: String,
    },
    FooterChange {
        footer: Vec<String>,
        description: String,
    },
}

impl ChangeOp {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeOp::Metadata { .. } => ChangeKind::Metadata,
            ChangeOp::SchemaChange { .. } => ChangeKind::SchemaChange,
            ChangeOp::Remove { .. } => ChangeKind::Remove,
            ChangeOp::Modify { .. } => ChangeKind::Modify,
            ChangeOp::Add { .. } => ChangeKind::Add,
            ChangeOp::Reposition { .. } => ChangeKind::Reposition,
            ChangeOp::FooterChange { .. } => ChangeKind::FooterChange,
        }
    }

    /// One-line human-readable description
    pub fn description(&self) -> &str {
        match self {
            ChangeOp::Metadata { description, .. }
            | ChangeOp::SchemaChange { description, .. }
            | ChangeOp::Remove { description, .. }
            | ChangeOp::Modify { description, .. }
            | ChangeOp::Add { description, .. }
            | ChangeOp::Reposition { description, .. }
            | ChangeOp::FooterChange { description, .. } => description,
        }
    }

    /// Aggregate key the op targets, for aggregate-level ops
    pub fn key(&self) -> Option<&str> {
        match self {
            ChangeOp::Remove { key, .. }
            | ChangeOp::Modify { key, .. }
            | ChangeOp::Add { key, .. }
            | ChangeOp::Reposition { key, .. } => Some(key.as_str()),
            ChangeOp::Metadata { .. }
            | ChangeOp::SchemaChange { .. }
            | ChangeOp::FooterChange { .. } => None,
        }
    }
}
