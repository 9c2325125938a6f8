//! History builder: first-appearance and transition step sequences.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use gcdelta_core::digest::text_digest;
use gcdelta_core::history::SKELETON_DESCRIPTION;
use gcdelta_core::{build_aggregates, first_appearance, plan_build, transition, FileState};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn order_file() -> String {
    file(
        &default_header(),
        &[
            abie("Order"),
            bbie("Order", "Code"),
            asbie("Order", "OrderLine"),
            asbie("Order", "Party"),
            abie("OrderLine"),
            asbie("OrderLine", "OrderLine.SubLine"),
            abie("OrderLine.SubLine"),
            asbie("OrderLine.SubLine", "OrderLine"),
            abie("Party"),
            bbie("Party", "Name"),
            qdt("Amount"),
            qdt("Code"),
        ],
    )
}

// ---------------------------------------------------------------------------
// First appearance
// ---------------------------------------------------------------------------

#[test]
fn test_first_appearance_steps_follow_the_plan() {
    // GIVEN a file with a leaf, a cycle, a root and unclassified rows
    let text = order_file();

    // WHEN building its first-appearance history
    let history = first_appearance(&text, &layout()).unwrap();

    // THEN skeleton, leaf, cycle group, root, unclassified rows
    let descriptions: Vec<&str> = history.descriptions().collect();
    assert_eq!(
        descriptions,
        vec![
            SKELETON_DESCRIPTION,
            "Add cycle group: OrderLine + OrderLine.SubLine",
            "Add ABIE \"Party\"",
            "Add ABIE \"Order\"",
            "Add unclassified rows (2)",
        ]
    );
    assert_eq!(history.final_text(), Some(text.as_str()));
}

#[test]
fn test_first_appearance_matches_build_plan() {
    // GIVEN the same file
    let text = order_file();
    let state = FileState::parse(&text, &layout()).unwrap();
    let plan = plan_build(&build_aggregates(&state, &layout()).unwrap(), "QDT");

    // WHEN building its history
    let history = first_appearance(&text, &layout()).unwrap();

    // THEN every plan step is one history step after the skeleton
    assert_eq!(history.len(), plan.steps.len() + 1);
    for (step, planned) in history.steps.iter().skip(1).zip(&plan.steps) {
        assert_eq!(step.keys, planned.keys);
    }
}

#[test]
fn test_step_digests_hash_step_text() {
    let history = first_appearance(&order_file(), &layout()).unwrap();

    for (i, step) in history.steps.iter().enumerate() {
        assert_eq!(step.sequence, i + 1);
        assert_eq!(step.digest, text_digest(&step.text));
        assert!(step.dangling.is_empty());
    }
    assert_eq!(history.digest.len(), 64);
}

#[test]
fn test_history_is_deterministic() {
    let a = first_appearance(&order_file(), &layout()).unwrap();
    let b = first_appearance(&order_file(), &layout()).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

#[test]
fn test_transition_merges_cycle_adds_into_one_step() {
    // GIVEN an old file without the OrderLine cycle
    let old_text = file(&default_header(), &[abie("Party")]);
    let new_text = file(
        &default_header(),
        &[
            abie("Party"),
            abie("OrderLine"),
            asbie("OrderLine", "OrderLine.SubLine"),
            abie("OrderLine.SubLine"),
            asbie("OrderLine.SubLine", "OrderLine"),
        ],
    );

    // WHEN building the transition
    let history = transition(&old_text, &new_text, &layout()).unwrap();

    // THEN the cycle arrives in a single valid step
    assert_eq!(history.len(), 1);
    assert_eq!(
        history.steps[0].description,
        "Add cycle group: OrderLine + OrderLine.SubLine"
    );
    assert_eq!(history.steps[0].ops.len(), 2);
    assert_eq!(history.invalid_steps().count(), 0);
    assert_eq!(history.final_text(), Some(new_text.as_str()));
}

#[test]
fn test_transition_of_identical_files_is_empty() {
    let text = order_file();
    let history = transition(&text, &text, &layout()).unwrap();
    assert!(history.is_empty());
}

#[test]
fn test_transition_flags_transient_dangling_reference() {
    // GIVEN Party stops referencing Address, which is removed
    let old_text = file(
        &default_header(),
        &[abie("Party"), asbie("Party", "Address"), abie("Address")],
    );
    let new_text = file(&default_header(), &[abie("Party")]);

    // WHEN building the transition
    let history = transition(&old_text, &new_text, &layout()).unwrap();

    // THEN the Remove step is flagged and the Modify step repairs it
    let descriptions: Vec<&str> = history.descriptions().collect();
    assert_eq!(
        descriptions,
        vec!["Remove ABIE \"Address\"", "Modify ABIE \"Party\""]
    );
    assert_eq!(history.steps[0].dangling.len(), 1);
    assert_eq!(history.steps[0].dangling[0].from, "Party");
    assert_eq!(history.steps[0].dangling[0].target, "Address");
    assert!(history.steps[1].dangling.is_empty());
}

#[test]
fn test_manifest_json_omits_snapshot_text() {
    let history = first_appearance(&order_file(), &layout()).unwrap();
    let json = serde_json::to_value(&history).unwrap();
    let first = &json["steps"][0];
    assert_eq!(first["sequence"], 1);
    assert!(first.get("text").is_none());
    assert!(first.get("dangling").is_none());
}
