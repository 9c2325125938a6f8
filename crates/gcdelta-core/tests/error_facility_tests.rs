//! Error facility: parse failures carry lines and map to stable codes.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use gcdelta_core::errors::{DeltaError, ExError, ExErrorKind};
use gcdelta_core::{build_aggregates, FileState, RecordLayout};

#[test]
fn test_unclosed_record_reports_opening_line() {
    // GIVEN a row that never closes
    let text = format!("{}<Row>\n<Value ColumnRef=\"ComponentType\">\n", default_header());
    let opener = text.lines().count() - 1;

    // WHEN parsing
    let err = FileState::parse(&text, &layout()).unwrap_err();

    // THEN the error points at the opener and maps to MalformedInput
    assert!(matches!(err, DeltaError::UnbalancedDelimiter { .. }));
    assert_eq!(err.line(), Some(opener));
    assert_eq!(err.kind(), ExErrorKind::MalformedInput);
}

#[test]
fn test_nested_record_is_rejected() {
    let text = format!("{}<Row>\n<Row>\n</Row>\n</Row>\n{}", default_header(), FOOTER);
    let err = FileState::parse(&text, &layout()).unwrap_err();
    assert!(matches!(err, DeltaError::UnbalancedDelimiter { .. }));
}

#[test]
fn test_duplicate_aggregate_maps_with_key() {
    let text = file(&default_header(), &[abie("Party"), abie("Party")]);

    let err = FileState::parse(&text, &layout()).unwrap_err();
    let ex: ExError = err.into();

    assert_eq!(ex.kind(), ExErrorKind::MalformedInput);
    assert_eq!(ex.code(), "ERR_MALFORMED_INPUT");
    assert_eq!(ex.key(), Some("Party"));
    assert!(ex.line().is_some());
}

#[test]
fn test_reference_row_after_unclassified_rows_is_positioned_error() {
    // GIVEN Order cut off from its reference row by a qualified data type
    let text = file(
        &default_header(),
        &[abie("Order"), qdt("Amount"), asbie("Order", "Party"), abie("Party")],
    );

    // WHEN parsing
    let err = FileState::parse(&text, &layout()).unwrap_err();

    // THEN the reference row is reported with its owner instead of being regrouped
    assert!(matches!(err, DeltaError::DetachedChild { ref owner, line: 35 } if owner == "Order"));
    let ex: ExError = err.into();
    assert_eq!(ex.code(), "ERR_MALFORMED_INPUT");
    assert_eq!(ex.key(), Some("Order"));
}

#[test]
fn test_unclassified_rows_between_aggregates_keep_dependency_order() {
    // GIVEN a qualified data type between Order's rows and Party
    let text = file(
        &default_header(),
        &[abie("Order"), asbie("Order", "Party"), qdt("Amount"), abie("Party")],
    );
    let state = FileState::parse(&text, &layout()).unwrap();

    // WHEN building aggregates
    let index = build_aggregates(&state, &layout()).unwrap();

    // THEN Order keeps its edge to Party
    assert_eq!(state.keys(), ["Order", "QDT", "Party"]);
    assert!(index.get("Order").unwrap().depends_on.contains("Party"));
    assert!(index.unresolved().is_empty());
}

#[test]
fn test_unresolved_reference_is_reported_not_fatal() {
    // GIVEN Party referencing an aggregate nobody defines
    let text = file(&default_header(), &[abie("Party"), asbie("Party", "Ghost")]);
    let state = FileState::parse(&text, &layout()).unwrap();

    // WHEN building aggregates
    let index = build_aggregates(&state, &layout()).unwrap();

    // THEN the reference is recorded and require_resolved fails with its kind
    assert_eq!(index.unresolved().len(), 1);
    let err = index.require_resolved().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnresolvedReference);
    assert_eq!(ExError::from(err).key(), Some("Party"));
}

#[test]
fn test_invalid_layout_toml() {
    let err = RecordLayout::from_toml_str("record_tag = 3").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidLayout);

    let err = RecordLayout::from_toml_str("record_tag = \"\"").unwrap_err();
    assert!(matches!(err, DeltaError::InvalidLayout { .. }));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::MalformedInput, "ERR_MALFORMED_INPUT"),
        (ExErrorKind::UnresolvedReference, "ERR_UNRESOLVED_REFERENCE"),
        (ExErrorKind::RoundTripMismatch, "ERR_ROUND_TRIP_MISMATCH"),
        (ExErrorKind::InvalidLayout, "ERR_INVALID_LAYOUT"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_display_includes_code_op_and_line() {
    let ex = ExError::new(ExErrorKind::MalformedInput)
        .with_op("parse")
        .with_message("record is not closed")
        .with_line(12);

    let rendered = ex.to_string();
    assert!(rendered.starts_with("[ERR_MALFORMED_INPUT]"));
    assert!(rendered.contains("in operation 'parse'"));
    assert!(rendered.contains("(line: 12)"));
}
