//! Render a file state back to text.

use crate::state::FileState;

/// Concatenate header, aggregate blocks in stored order, then footer.
///
/// Lines keep their original terminators, so a parsed file serializes back
/// byte for byte.
pub fn serialize(state: &FileState) -> String {
    let size = state.header.iter().map(String::len).sum::<usize>()
        + state.blocks.values().map(String::len).sum::<usize>()
        + state.footer.iter().map(String::len).sum::<usize>();
    let mut out = String::with_capacity(size);

    for line in &state.header {
        out.push_str(line);
    }
    for key in &state.order {
        if let Some(block) = state.blocks.get(key) {
            out.push_str(block);
        }
    }
    for line in &state.footer {
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordLayout;

    #[test]
    fn test_parse_then_serialize_is_exact() {
        let text = "<?xml version=\"1.0\"?>\r\n<gc:CodeList>\r\n<Identification>\r\n</Identification>\r\n<SimpleCodeList>\r\n  <!-- first -->\r\n<Row>\r\n<Value ColumnRef=\"ComponentType\"><SimpleValue>ABIE</SimpleValue></Value>\r\n<Value ColumnRef=\"ObjectClass\"><SimpleValue>A</SimpleValue></Value>\r\n</Row>\r\n</SimpleCodeList>\r\n</gc:CodeList>";
        let state = FileState::parse(text, &RecordLayout::default()).unwrap();
        assert_eq!(serialize(&state), text);
    }

    #[test]
    fn test_empty_text() {
        let state = FileState::parse("", &RecordLayout::default()).unwrap();
        assert_eq!(serialize(&state), "");
    }
}
