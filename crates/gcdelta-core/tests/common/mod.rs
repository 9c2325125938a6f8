//! GenericCode text builders shared by the integration tests.

use gcdelta_core::RecordLayout;

#[allow(dead_code)]
pub const DEFAULT_COLUMNS: [&str; 5] = [
    "ComponentType",
    "DictionaryEntryName",
    "ObjectClass",
    "AssociatedObjectClass",
    "Definition",
];

#[allow(dead_code)]
pub const FOOTER: &str = "</SimpleCodeList>\n</gc:CodeList>\n";

#[allow(dead_code)]
pub fn layout() -> RecordLayout {
    RecordLayout::default()
}

/// Header with an identity block naming `short_name` and the given columns
#[allow(dead_code)]
pub fn header_with(short_name: &str, columns: &[&str]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gc:CodeList xmlns:gc=\"http://docs.oasis-open.org/codelist/ns/genericode/1.0/\">\n",
    );
    out.push_str("<Identification>\n");
    out.push_str(&format!("<ShortName>{}</ShortName>\n", short_name));
    out.push_str("<Version>1</Version>\n");
    out.push_str("</Identification>\n");
    out.push_str("<ColumnSet>\n");
    for column in columns {
        out.push_str(&format!(
            "<Column Id=\"{}\" Use=\"optional\">\n<ShortName>{}</ShortName>\n</Column>\n",
            column, column
        ));
    }
    out.push_str("</ColumnSet>\n");
    out.push_str("<SimpleCodeList>\n");
    out
}

#[allow(dead_code)]
pub fn default_header() -> String {
    header_with("UBL-2.1", &DEFAULT_COLUMNS)
}

fn value(column: &str, text: &str) -> String {
    format!(
        "<Value ColumnRef=\"{}\"><SimpleValue>{}</SimpleValue></Value>\n",
        column, text
    )
}

/// Parent row opening aggregate `key`
#[allow(dead_code)]
pub fn abie(key: &str) -> String {
    abie_with_definition(key, &format!("Information about {}.", key))
}

#[allow(dead_code)]
pub fn abie_with_definition(key: &str, definition: &str) -> String {
    format!(
        "<Row>\n{}{}{}{}</Row>\n",
        value("ComponentType", "ABIE"),
        value("DictionaryEntryName", &format!("{}. Details", key)),
        value("ObjectClass", key),
        value("Definition", definition),
    )
}

/// Value whose text runs over several lines, opener and closer on lines
/// of their own
#[allow(dead_code)]
pub fn value_span(column: &str, lines: &[&str]) -> String {
    format!(
        "<Value ColumnRef=\"{}\">\n<SimpleValue>{}</SimpleValue>\n</Value>\n",
        column,
        lines.join("\n")
    )
}

/// Parent row whose key and definition are written as multi-line spans
#[allow(dead_code)]
pub fn abie_spanning(key: &str, definition: &[&str]) -> String {
    format!(
        "<Row>\n{}{}{}{}</Row>\n",
        value("ComponentType", "ABIE"),
        value_span("DictionaryEntryName", &[&format!("{}. Details", key)]),
        value_span("ObjectClass", &[key]),
        value_span("Definition", definition),
    )
}

/// Attribute row of `owner`
#[allow(dead_code)]
pub fn bbie(owner: &str, property: &str) -> String {
    format!(
        "<Row>\n{}{}{}{}</Row>\n",
        value("ComponentType", "BBIE"),
        value(
            "DictionaryEntryName",
            &format!("{}. {}. Text", owner, property)
        ),
        value("ObjectClass", owner),
        value("Definition", &format!("The {} of the {}.", property, owner)),
    )
}

/// Reference row of `owner` pointing at `target`
#[allow(dead_code)]
pub fn asbie(owner: &str, target: &str) -> String {
    format!(
        "<Row>\n{}{}{}{}{}</Row>\n",
        value("ComponentType", "ASBIE"),
        value("DictionaryEntryName", &format!("{}. {}", owner, target)),
        value("ObjectClass", owner),
        value("AssociatedObjectClass", target),
        value("Definition", &format!("Association to {}.", target)),
    )
}

/// Unclassified row (qualified data type)
#[allow(dead_code)]
pub fn qdt(name: &str) -> String {
    format!(
        "<Row>\n{}{}</Row>\n",
        value("ComponentType", "QDT"),
        value("DictionaryEntryName", &format!("{}. Type", name)),
    )
}

/// Complete file: header, rows, default footer
#[allow(dead_code)]
pub fn file(header: &str, rows: &[String]) -> String {
    format!("{}{}{}", header, rows.concat(), FOOTER)
}

/// Remove every `Definition` value from `text`, multi-line spans included
#[allow(dead_code)]
pub fn without_definitions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skipping = false;
    for line in text.split_inclusive('\n') {
        if skipping {
            skipping = !line.contains("</Value>");
            continue;
        }
        if line.contains("ColumnRef=\"Definition\"") {
            skipping = !line.contains("</Value>");
            continue;
        }
        out.push_str(line);
    }
    out
}
