//! Property-based tests for diff, patch and text reconciliation
//!
//!  - Replaying diff(a, b) on a copy of a yields b
//!  - diff(a, a) is empty
//!  - Replaying reconcile(s, t) on s yields t
//!  - No map key is both written and unset in one diff
//!  - Applying the same changes to two copies gives identical results
//!  - Applying a diff to a document keeps its root container

use docpatch_core::{Map, Value};
use docpatch_diff::{apply, diff, reconcile, text, ChangeRecord};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

/// Generate strategies for prop-testing

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        (-1000.0f64..1000.0).prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        "[a-c😀]{0,5}".prop_map(|s| Value::text("r", &s)),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::from),
            prop::collection::btree_map("[a-d]", inner, 0..5)
                .prop_map(|entries| Value::from(entries.into_iter().collect::<Map>())),
        ]
    })
}

fn doc_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-e]", value_strategy(), 0..6)
        .prop_map(|entries| Value::from(entries.into_iter().collect::<Map>()))
}

// ============================================================================
// Structural diff
// ============================================================================

proptest! {
    #[test]
    fn replaying_diff_reaches_target(a in value_strategy(), b in value_strategy()) {
        let mut live = a.clone();
        apply(&mut live, &diff(&a, &b)).unwrap();
        prop_assert_eq!(live, b);
    }

    #[test]
    fn replaying_diff_between_documents(a in doc_strategy(), b in doc_strategy()) {
        let mut live = a.clone();
        apply(&mut live, &diff(&a, &b)).unwrap();
        prop_assert_eq!(live, b);
    }

    #[test]
    fn applying_is_deterministic(a in doc_strategy(), b in doc_strategy()) {
        let changes = diff(&a, &b);
        let mut left = a.clone();
        let mut right = a.clone();
        apply(&mut left, &changes).unwrap();
        apply(&mut right, &changes).unwrap();
        prop_assert_eq!(&left, &right);
        prop_assert_eq!(
            serde_json::to_string(&left).unwrap(),
            serde_json::to_string(&right).unwrap()
        );
    }

    #[test]
    fn diff_against_self_is_empty(a in value_strategy()) {
        prop_assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn no_key_is_both_set_and_unset(a in doc_strategy(), b in doc_strategy()) {
        let changes = diff(&a, &b);
        let written: HashSet<_> = changes
            .iter()
            .filter(|c| matches!(c, ChangeRecord::Set { .. }))
            .map(|c| c.path().clone())
            .collect();
        for change in &changes {
            if let ChangeRecord::Unset { path } = change {
                prop_assert!(!written.contains(path));
            }
        }
    }
}

#[test]
fn applying_a_diff_keeps_the_root_container() {
    let mut live = Value::from(json!({"a": 1}));
    if let Some(map) = live.as_map_mut() {
        map.insert("note".to_string(), Value::text("r", "keep"));
    }
    let target = Value::from(json!({"a": 1, "b": 2, "note": "keep"}));
    let root_before: *const Map = live.as_map().unwrap();
    let note_before = live.get("note").unwrap().as_text().unwrap().position_to_id(0);

    let changes = diff(&live, &target);
    assert!(matches!(&changes[..], [ChangeRecord::Set { .. }]));
    assert_eq!(changes[0].to_string(), "set /b = 2");
    apply(&mut live, &changes).unwrap();

    assert!(std::ptr::eq(root_before, live.as_map().unwrap()));
    assert_eq!(live, target);
    let note = live.get("note").unwrap().as_text().expect("note stays text");
    assert_eq!(note.position_to_id(0), note_before);
}

// ============================================================================
// Text reconciliation
// ============================================================================

proptest! {
    #[test]
    fn replaying_reconcile_reaches_target(old in "[a-cé😀 ]{0,16}", new in "[a-cé😀 ]{0,16}") {
        let mut chars: Vec<char> = old.chars().collect();
        text::apply(&mut chars, &reconcile(&old, &new)).unwrap();
        prop_assert_eq!(chars.into_iter().collect::<String>(), new);
    }

    #[test]
    fn reconcile_covers_both_strings(old in "[a-z]{0,16}", new in "[a-z]{0,16}") {
        let ops = reconcile(&old, &new);
        let consumed: usize = ops
            .iter()
            .filter(|op| !matches!(op, docpatch_diff::EditOp::Insert(_)))
            .map(|op| op.len())
            .sum();
        let produced: usize = ops
            .iter()
            .filter(|op| !matches!(op, docpatch_diff::EditOp::Delete(_)))
            .map(|op| op.len())
            .sum();
        prop_assert_eq!(consumed, old.chars().count());
        prop_assert_eq!(produced, new.chars().count());
    }
}
