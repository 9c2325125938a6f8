//! File state: header, ordered aggregate blocks, footer.
//!
//! The aggregate order is an explicit list of keys next to a key→block map,
//! so inserts, removals and moves are list splices. Cloning a state gives
//! an independent scratch copy.

use crate::config::RecordLayout;
use crate::errors::{DeltaError, Result};
use crate::parser::split_blocks;
use crate::record::{Record, RecordKind};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileState {
    pub(crate) header: Vec<String>,
    /// Index of the header line closing the identity sub-block
    pub(crate) identity_end: Option<usize>,
    pub(crate) order: Vec<String>,
    pub(crate) blocks: HashMap<String, String>,
    pub(crate) footer: Vec<String>,
}

/// Parse text into a [`FileState`].
///
/// # Errors
///
/// Returns `MalformedInput`-class errors for unbalanced delimiters, parents
/// without a type-class key, duplicate aggregate keys, unclassified rows
/// split across the file and children separated from their parent by
/// unclassified rows.
pub fn parse(text: &str, layout: &RecordLayout) -> Result<FileState> {
    FileState::parse(text, layout)
}

impl FileState {
    /// Parse text into header, aggregate blocks and footer.
    ///
    /// Records are grouped by a linear scan: a parent opens an aggregate,
    /// children extend the open aggregate, and everything else (including
    /// children with no open aggregate) joins the unclassified pseudo-group.
    /// Unclassified rows leave the open aggregate open, but its block must
    /// stay contiguous: a child that follows them is rejected.
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse(text: &str, layout: &RecordLayout) -> Result<Self> {
        let parsed = split_blocks(text, layout)?;
        let mut state = FileState {
            identity_end: identity_end(&parsed.header, layout),
            header: parsed.header,
            footer: parsed.footer,
            ..FileState::default()
        };

        let unclassified = layout.unclassified_key.as_str();
        let mut current: Option<String> = None;
        let mut last_group: Option<String> = None;

        for block in parsed.records {
            let record = Record::classify(block, layout);
            let line = record.line();
            let group = match (record.kind, current.clone()) {
                (RecordKind::Parent, _) => {
                    if record.key.is_empty() {
                        return Err(DeltaError::MissingTypeClassKey { line });
                    }
                    if record.key == unclassified || state.blocks.contains_key(&record.key) {
                        return Err(DeltaError::DuplicateAggregate {
                            key: record.key,
                            line,
                        });
                    }
                    state.order.push(record.key.clone());
                    state.blocks.insert(record.key.clone(), String::new());
                    current = Some(record.key.clone());
                    record.key.clone()
                }
                (RecordKind::AttributeChild | RecordKind::ReferenceChild, Some(owner)) => {
                    if last_group.as_deref() == Some(unclassified) {
                        return Err(DeltaError::DetachedChild { owner, line });
                    }
                    owner
                }
                (RecordKind::AttributeChild | RecordKind::ReferenceChild, None)
                | (RecordKind::Unclassified, _) => {
                    if state.blocks.contains_key(unclassified) {
                        if last_group.as_deref() != Some(unclassified) {
                            return Err(DeltaError::SplitUnclassifiedGroup { line });
                        }
                    } else {
                        state.order.push(unclassified.to_string());
                        state.blocks.insert(unclassified.to_string(), String::new());
                    }
                    unclassified.to_string()
                }
            };
            if let Some(text) = state.blocks.get_mut(&group) {
                text.push_str(&record.block.text);
            }
            last_group = Some(group);
        }

        debug!(
            aggregate_count = state.order.len(),
            header_lines = state.header.len(),
            footer_lines = state.footer.len(),
            "file state parsed"
        );
        Ok(state)
    }

    /// Header and footer of this state with every aggregate dropped.
    pub fn skeleton(&self) -> Self {
        FileState {
            header: self.header.clone(),
            identity_end: self.identity_end,
            footer: self.footer.clone(),
            ..FileState::default()
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    /// Aggregate keys in stored order
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn block(&self, key: &str) -> Option<&str> {
        self.blocks.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Header lines up to and including the identity closer; empty if none
    pub fn identity(&self) -> &[String] {
        match self.identity_end {
            Some(end) => &self.header[..=end],
            None => &[],
        }
    }

    /// Header lines after the identity sub-block, or the whole header
    pub fn column_area(&self) -> &[String] {
        match self.identity_end {
            Some(end) => &self.header[end + 1..],
            None => &self.header,
        }
    }

    // ----- splicing -----

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    pub(crate) fn predecessor(&self, key: &str) -> Option<&str> {
        match self.position(key) {
            Some(idx) if idx > 0 => Some(self.order[idx - 1].as_str()),
            _ => None,
        }
    }

    pub(crate) fn detach(&mut self, key: &str) -> Option<String> {
        let idx = self.position(key)?;
        self.order.remove(idx);
        self.blocks.remove(key)
    }

    /// Insert `key` right after `after`, or at the front when `after` is None
    pub(crate) fn insert_after(&mut self, after: Option<&str>, key: String, block: String) {
        let idx = match after.and_then(|a| self.position(a)) {
            Some(pos) => pos + 1,
            None if after.is_some() => self.order.len(),
            None => 0,
        };
        self.order.insert(idx, key.clone());
        self.blocks.insert(key, block);
    }
}

/// Index of the first header line closing the identity sub-block.
pub(crate) fn identity_end(header: &[String], layout: &RecordLayout) -> Option<usize> {
    let close = layout.identity_close();
    header.iter().position(|line| line.contains(&close))
}
