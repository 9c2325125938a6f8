//! Record classification.
//!
//! Tags a [`RecordBlock`] with its kind and pulls out the fields the
//! aggregate builder keys on.

use crate::config::{element_text, RecordLayout};
use crate::parser::RecordBlock;
use serde::{Deserialize, Serialize};

/// Record kind decided by the discriminator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Opens an aggregate (`ABIE`)
    Parent,
    /// Simple attribute of the current aggregate (`BBIE`)
    AttributeChild,
    /// Cross-reference to another aggregate (`ASBIE`)
    ReferenceChild,
    /// No usable discriminator; carried outside every aggregate
    Unclassified,
}

impl RecordKind {
    pub fn from_discriminator(value: &str, layout: &RecordLayout) -> Self {
        if value == layout.parent_value {
            RecordKind::Parent
        } else if value == layout.attribute_value {
            RecordKind::AttributeChild
        } else if value == layout.reference_value {
            RecordKind::ReferenceChild
        } else {
            RecordKind::Unclassified
        }
    }
}

/// A record block with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub block: RecordBlock,
    pub kind: RecordKind,
    /// Display name (dictionary entry name)
    pub name: String,
    /// Type-class key
    pub key: String,
    /// Referenced type-class key; empty unless the record is a reference
    pub target: String,
}

impl Record {
    pub fn classify(block: RecordBlock, layout: &RecordLayout) -> Self {
        let discriminator = field_value(&block.text, &layout.discriminator_field, layout);
        let kind = RecordKind::from_discriminator(&discriminator, layout);
        let name = field_value(&block.text, &layout.name_field, layout);
        let key = field_value(&block.text, &layout.key_field, layout);
        let target = match kind {
            RecordKind::ReferenceChild => field_value(&block.text, &layout.target_field, layout),
            _ => String::new(),
        };
        Self {
            block,
            kind,
            name,
            key,
            target,
        }
    }

    pub fn line(&self) -> usize {
        self.block.line
    }
}

/// Value of `field` inside a record's text, or empty when absent.
///
/// The value element starts on the line carrying `ColumnRef="field"`; its
/// text may sit on that line or on any later line up to `</Value>`.
pub fn field_value(text: &str, field: &str, layout: &RecordLayout) -> String {
    let marker = layout.field_marker(field);
    let close = layout.value_close();
    let mut inside = false;

    for line in text.lines() {
        if !inside {
            if !line.contains(&marker) {
                continue;
            }
            inside = true;
        }
        if let Some(value) = element_text(line, &layout.simple_value_tag) {
            return value.to_string();
        }
        if line.contains(&close) {
            break;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> RecordBlock {
        RecordBlock {
            seq: 1,
            line: 1,
            text: text.to_string(),
        }
    }

    const ASBIE: &str = r#"<Row>
  <Value ColumnRef="ComponentType"><SimpleValue>ASBIE</SimpleValue></Value>
  <Value ColumnRef="DictionaryEntryName">
    <SimpleValue>Party. Address</SimpleValue>
  </Value>
  <Value ColumnRef="ObjectClass"><SimpleValue>Party</SimpleValue></Value>
  <Value ColumnRef="AssociatedObjectClass"><SimpleValue>Address</SimpleValue></Value>
</Row>
"#;

    #[test]
    fn test_classify_reference_child() {
        let record = Record::classify(block(ASBIE), &RecordLayout::default());
        assert_eq!(record.kind, RecordKind::ReferenceChild);
        assert_eq!(record.name, "Party. Address");
        assert_eq!(record.key, "Party");
        assert_eq!(record.target, "Address");
    }

    #[test]
    fn test_missing_discriminator_is_unclassified() {
        let text = "<Row>\n<Value ColumnRef=\"DictionaryEntryName\"><SimpleValue>Code. Type</SimpleValue></Value>\n</Row>\n";
        let record = Record::classify(block(text), &RecordLayout::default());
        assert_eq!(record.kind, RecordKind::Unclassified);
        assert!(record.target.is_empty());
    }

    #[test]
    fn test_value_closed_without_simple_value_is_empty() {
        let text = "<Row>\n<Value ColumnRef=\"ObjectClass\">\n</Value>\n<Value ColumnRef=\"Other\"><SimpleValue>x</SimpleValue></Value>\n</Row>\n";
        assert_eq!(field_value(text, "ObjectClass", &RecordLayout::default()), "");
    }

    #[test]
    fn test_unknown_discriminator_is_unclassified() {
        let layout = RecordLayout::default();
        assert_eq!(
            RecordKind::from_discriminator("QDT", &layout),
            RecordKind::Unclassified
        );
        assert_eq!(
            RecordKind::from_discriminator("ABIE", &layout),
            RecordKind::Parent
        );
    }
}
