//! Record layout configuration.
//!
//! Every tag and column name the engine looks for lives here, so the same
//! engine can read GenericCode exports whose column names differ from the
//! UBL defaults. A layout is loaded from TOML; unspecified keys keep their
//! GenericCode defaults.
//!
//! ```toml
//! discriminator_field = "Kind"
//! parent_value = "Class"
//! ```

use crate::errors::{DeltaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tag and column names used to split and classify records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordLayout {
    /// Element name of a record (`Row`)
    pub record_tag: String,
    /// Element wrapping one field value (`Value`)
    pub value_tag: String,
    /// Element holding a field's text (`SimpleValue`)
    pub simple_value_tag: String,
    /// Attribute naming the field a value belongs to (`ColumnRef`)
    pub column_ref_attr: String,

    /// Column whose value decides the record kind
    pub discriminator_field: String,
    pub parent_value: String,
    pub attribute_value: String,
    pub reference_value: String,

    /// Column holding the display name
    pub name_field: String,
    /// Column holding the type-class key
    pub key_field: String,
    /// Column holding the referenced type-class key
    pub target_field: String,

    /// Element closing the document-identity sub-block (`Identification`)
    pub identity_tag: String,
    /// Element naming the document inside the identity block (`ShortName`)
    pub short_name_tag: String,
    /// Element defining one column in the header (`Column`)
    pub column_tag: String,
    /// Attribute carrying a column's id (`Id`)
    pub column_id_attr: String,

    /// Key of the pseudo-group holding unclassified rows
    pub unclassified_key: String,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            record_tag: "Row".to_string(),
            value_tag: "Value".to_string(),
            simple_value_tag: "SimpleValue".to_string(),
            column_ref_attr: "ColumnRef".to_string(),
            discriminator_field: "ComponentType".to_string(),
            parent_value: "ABIE".to_string(),
            attribute_value: "BBIE".to_string(),
            reference_value: "ASBIE".to_string(),
            name_field: "DictionaryEntryName".to_string(),
            key_field: "ObjectClass".to_string(),
            target_field: "AssociatedObjectClass".to_string(),
            identity_tag: "Identification".to_string(),
            short_name_tag: "ShortName".to_string(),
            column_tag: "Column".to_string(),
            column_id_attr: "Id".to_string(),
            unclassified_key: "QDT".to_string(),
        }
    }
}

impl RecordLayout {
    /// Parse a layout from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns `DeltaError::InvalidLayout` if the TOML does not parse or a
    /// marker is empty.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let layout: RecordLayout = toml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout file from disk.
    ///
    /// # Errors
    ///
    /// Returns `DeltaError::Io` if the file cannot be read, or
    /// `DeltaError::InvalidLayout` if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DeltaError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject layouts with empty markers.
    ///
    /// # Errors
    ///
    /// Returns `DeltaError::InvalidLayout` naming the first empty entry.
    pub fn validate(&self) -> Result<()> {
        let entries = [
            ("record_tag", &self.record_tag),
            ("value_tag", &self.value_tag),
            ("simple_value_tag", &self.simple_value_tag),
            ("column_ref_attr", &self.column_ref_attr),
            ("discriminator_field", &self.discriminator_field),
            ("parent_value", &self.parent_value),
            ("attribute_value", &self.attribute_value),
            ("reference_value", &self.reference_value),
            ("name_field", &self.name_field),
            ("key_field", &self.key_field),
            ("target_field", &self.target_field),
            ("identity_tag", &self.identity_tag),
            ("short_name_tag", &self.short_name_tag),
            ("column_tag", &self.column_tag),
            ("column_id_attr", &self.column_id_attr),
            ("unclassified_key", &self.unclassified_key),
        ];
        for (name, value) in entries {
            if value.trim().is_empty() {
                return Err(DeltaError::InvalidLayout {
                    reason: format!("'{}' must not be empty", name),
                });
            }
        }
        Ok(())
    }

    // ----- derived markers -----

    /// True when the trimmed line opens a record (`<Row>` or `<Row ...>`)
    pub fn opens_record(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed
            .strip_prefix('<')
            .and_then(|rest| rest.strip_prefix(self.record_tag.as_str()))
            .map(|rest| rest.starts_with('>') || rest.starts_with(' '))
            .unwrap_or(false)
    }

    /// True when the trimmed line closes a record (`</Row>`)
    pub fn closes_record(&self, line: &str) -> bool {
        line.trim() == format!("</{}>", self.record_tag)
    }

    /// Marker identifying the line that introduces `field`'s value
    pub fn field_marker(&self, field: &str) -> String {
        format!("{}=\"{}\"", self.column_ref_attr, field)
    }

    /// Marker closing one field value (`</Value>`)
    pub fn value_close(&self) -> String {
        format!("</{}>", self.value_tag)
    }

    /// Marker closing the identity sub-block (`</Identification>`)
    pub fn identity_close(&self) -> String {
        format!("</{}>", self.identity_tag)
    }
}

/// Text between `<tag>` and `</tag>` on one line, trimmed
pub(crate) fn element_text<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = line.find(&open)? + open.len();
    let end = line[start..].find(&close)? + start;
    Some(line[start..end].trim())
}

/// Value of `attr="..."` on one line
pub(crate) fn attribute_value<'a>(line: &'a str, attr: &str) -> Option<&'a str> {
    let marker = format!(" {}=\"", attr);
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')? + start;
    Some(&line[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_generic_code() {
        let layout = RecordLayout::default();
        assert_eq!(layout.discriminator_field, "ComponentType");
        assert_eq!(layout.unclassified_key, "QDT");
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let layout = RecordLayout::from_toml_str("parent_value = \"CLASS\"\n").unwrap();
        assert_eq!(layout.parent_value, "CLASS");
        assert_eq!(layout.record_tag, "Row");
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = RecordLayout::from_toml_str("record_tag = \"\"\n").unwrap_err();
        assert!(matches!(err, DeltaError::InvalidLayout { .. }));
    }

    #[test]
    fn test_bad_toml_is_invalid_layout() {
        let err = RecordLayout::from_toml_str("record_tag = [").unwrap_err();
        assert!(matches!(err, DeltaError::InvalidLayout { .. }));
    }

    #[test]
    fn test_record_delimiters() {
        let layout = RecordLayout::default();
        assert!(layout.opens_record("    <Row>\n"));
        assert!(layout.opens_record("<Row xml:id=\"r1\">"));
        assert!(!layout.opens_record("<RowSet>"));
        assert!(layout.closes_record("  </Row>\r\n"));
        assert!(!layout.closes_record("</Row><Row>"));
    }

    #[test]
    fn test_element_and_attribute_helpers() {
        assert_eq!(
            element_text("<SimpleValue> Address </SimpleValue>", "SimpleValue"),
            Some("Address")
        );
        assert_eq!(element_text("<SimpleValue/>", "SimpleValue"), None);
        assert_eq!(
            attribute_value("<Column Id=\"ObjectClass\" Use=\"optional\">", "Id"),
            Some("ObjectClass")
        );
    }
}
