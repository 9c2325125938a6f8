//! Header inspection: identity sub-block and column definitions.

use crate::config::{attribute_value, element_text, RecordLayout};
use crate::diff::model::FieldSpan;
use crate::errors::{DeltaError, Result};
use crate::state::FileState;

/// Column ids defined in the state's column area, in header order.
///
/// A column's open tag may span several lines; its id is read from the
/// text up to the tag's closing `>`.
///
/// # Errors
///
/// Returns `DeltaError::MalformedSchema` with the header line of a column
/// definition that carries no id.
pub fn column_ids(state: &FileState, layout: &RecordLayout) -> Result<Vec<String>> {
    let opener = format!("<{}", layout.column_tag);
    let area = state.column_area();
    let first_line = state.header().len() - area.len() + 1;

    let mut ids = Vec::new();
    for (offset, line) in area.iter().enumerate() {
        let Some(start) = tag_start(line, &opener) else {
            continue;
        };
        let tag = open_tag_text(&area[offset..], start);
        match attribute_value(&tag, &layout.column_id_attr) {
            Some(id) if !id.is_empty() => ids.push(id.to_string()),
            _ => {
                return Err(DeltaError::MalformedSchema {
                    line: first_line + offset,
                    reason: format!(
                        "<{}> definition without an {} attribute",
                        layout.column_tag, layout.column_id_attr
                    ),
                })
            }
        }
    }
    Ok(ids)
}

/// Offset of `opener` in `line` where it names exactly that element
/// (`<Column` but not `<ColumnSet`).
fn tag_start(line: &str, opener: &str) -> Option<usize> {
    line.match_indices(opener).map(|(i, _)| i).find(|&i| {
        matches!(
            line[i + opener.len()..].chars().next(),
            None | Some(' ' | '\t' | '\r' | '\n' | '>' | '/')
        )
    })
}

/// Open tag beginning at `start` in `lines[0]`, through its closing `>`,
/// with line breaks flattened to spaces.
fn open_tag_text(lines: &[String], start: usize) -> String {
    let mut tag = String::new();
    for (i, line) in lines.iter().enumerate() {
        let part = if i == 0 { &line[start..] } else { line.as_str() };
        match part.find('>') {
            Some(end) => {
                tag.push_str(&part[..=end]);
                break;
            }
            None => {
                tag.push_str(part);
                tag.push(' ');
            }
        }
    }
    tag.replace(['\t', '\r', '\n'], " ")
}

/// Document short name inside an identity sub-block.
pub fn short_name(identity: &[String], layout: &RecordLayout) -> Option<String> {
    identity
        .iter()
        .find_map(|line| element_text(line, &layout.short_name_tag))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Value-span markers for a removed field.
pub fn field_span(field: &str, layout: &RecordLayout) -> FieldSpan {
    FieldSpan {
        field: field.to_string(),
        open_marker: layout.field_marker(field),
        close_marker: layout.value_close(),
    }
}

/// Column delta between two states: (removed, added), each in header order.
///
/// # Errors
///
/// Propagates `DeltaError::MalformedSchema` from either side.
pub fn column_delta(
    old: &FileState,
    new: &FileState,
    layout: &RecordLayout,
) -> Result<(Vec<String>, Vec<String>)> {
    let old_ids = column_ids(old, layout)?;
    let new_ids = column_ids(new, layout)?;
    let removed = old_ids
        .iter()
        .filter(|id| !new_ids.contains(id))
        .cloned()
        .collect();
    let added = new_ids
        .iter()
        .filter(|id| !old_ids.contains(id))
        .cloned()
        .collect();
    Ok((removed, added))
}

/// `Update column structure (...)` description.
pub fn schema_description(removed: &[String], added: &[String]) -> String {
    let mut parts = Vec::new();
    if !removed.is_empty() {
        parts.push(format!("remove {}", removed.join(", ")));
    }
    if !added.is_empty() {
        parts.push(format!("add {}", added.join(", ")));
    }
    if parts.is_empty() {
        parts.push("update formatting".to_string());
    }
    format!("Update column structure ({})", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_state(columns: &[&str]) -> FileState {
        let cols: String = columns
            .iter()
            .map(|c| format!("<Column Id=\"{}\" Use=\"optional\">\n</Column>\n", c))
            .collect();
        let text = format!(
            "<gc:CodeList>\n<Identification>\n<ShortName>UBL-2.1</ShortName>\n</Identification>\n<ColumnSet>\n{}</ColumnSet>\n",
            cols
        );
        FileState::parse(&text, &RecordLayout::default()).unwrap()
    }

    #[test]
    fn test_column_ids_in_header_order() {
        let state = header_state(&["ComponentType", "ObjectClass"]);
        let ids = column_ids(&state, &RecordLayout::default()).unwrap();
        assert_eq!(ids, vec!["ComponentType", "ObjectClass"]);
    }

    #[test]
    fn test_column_without_id_reports_header_line() {
        let text = "<gc:CodeList>\n<Identification>\n</Identification>\n<ColumnSet>\n<Column Use=\"required\">\n";
        let state = FileState::parse(text, &RecordLayout::default()).unwrap();
        let err = column_ids(&state, &RecordLayout::default()).unwrap_err();
        assert!(matches!(err, DeltaError::MalformedSchema { line: 5, .. }));
    }

    #[test]
    fn test_column_tag_split_across_lines() {
        let text = "<gc:CodeList>\n<Identification>\n</Identification>\n<ColumnSet>\n<Column\r\n    Use=\"optional\"\r\n    Id=\"Split\">\r\n</Column>\n<Column Id=\"Plain\"/>\n</ColumnSet>\n";
        let state = FileState::parse(text, &RecordLayout::default()).unwrap();
        let ids = column_ids(&state, &RecordLayout::default()).unwrap();
        assert_eq!(ids, vec!["Split", "Plain"]);
    }

    #[test]
    fn test_split_column_tag_without_id_reports_opening_line() {
        let text = "<gc:CodeList>\n<Identification>\n</Identification>\n<ColumnSet>\n<Column\n Use=\"required\">\n<ShortName Id=\"NotAColumn\"/>\n</Column>\n";
        let state = FileState::parse(text, &RecordLayout::default()).unwrap();
        let err = column_ids(&state, &RecordLayout::default()).unwrap_err();
        assert!(matches!(err, DeltaError::MalformedSchema { line: 5, .. }));
    }

    #[test]
    fn test_short_name() {
        let state = header_state(&[]);
        assert_eq!(
            short_name(state.identity(), &RecordLayout::default()),
            Some("UBL-2.1".to_string())
        );
        assert_eq!(short_name(&[], &RecordLayout::default()), None);
    }

    #[test]
    fn test_column_delta_and_description() {
        let old = header_state(&["A", "B", "C"]);
        let new = header_state(&["A", "C", "D"]);
        let (removed, added) = column_delta(&old, &new, &RecordLayout::default()).unwrap();
        assert_eq!(removed, vec!["B"]);
        assert_eq!(added, vec!["D"]);
        assert_eq!(
            schema_description(&removed, &added),
            "Update column structure (remove B; add D)"
        );
        assert_eq!(
            schema_description(&[], &[]),
            "Update column structure (update formatting)"
        );
    }
}
