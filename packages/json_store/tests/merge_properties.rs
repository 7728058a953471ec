use docfs_json_store::{merge_patch, Error};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-e]", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]", value(), 0..5).prop_map(|map| map.into_iter().collect())
}

/// Patches whose values may also be `null`.
fn object_patch() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]", prop_oneof![Just(Value::Null), value()], 0..5)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    /// An empty patch leaves any object untouched.
    #[test]
    fn prop_empty_patch_is_identity(existing in object()) {
        let merged = merge_patch(Value::Object(existing.clone()), Value::Object(Map::new())).unwrap();
        prop_assert_eq!(merged, Value::Object(existing));
    }

    /// Arrays concatenate in order.
    #[test]
    fn prop_arrays_concatenate(
        existing in prop::collection::vec(value(), 0..6),
        patch in prop::collection::vec(value(), 0..6),
    ) {
        let merged = merge_patch(Value::from(existing.clone()), Value::from(patch.clone())).unwrap();
        let mut expected = existing;
        expected.extend(patch);
        prop_assert_eq!(merged, Value::from(expected));
    }

    /// Null keys vanish, scalar and array keys are taken from the patch, untouched keys survive.
    #[test]
    fn prop_object_merge_key_rules(existing in object(), patch in object_patch()) {
        let merged = merge_patch(Value::Object(existing.clone()), Value::Object(patch.clone())).unwrap();
        let merged = merged.as_object().unwrap();

        for (key, value) in &patch {
            match value {
                Value::Null => prop_assert!(!merged.contains_key(key)),
                Value::Object(_) => prop_assert!(merged[key].is_object()),
                other => prop_assert_eq!(&merged[key], other),
            }
        }
        for (key, value) in &existing {
            if !patch.contains_key(key) {
                prop_assert_eq!(&merged[key], value);
            }
        }
    }

    /// Mismatched shapes never merge.
    #[test]
    fn prop_scalars_never_merge(existing in scalar(), patch in value()) {
        let result = merge_patch(existing, patch);
        let is_unmergeable = matches!(result, Err(Error::UnmergeableTypes { .. }));
        prop_assert!(is_unmergeable);
    }
}
