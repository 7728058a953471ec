use bytes::Bytes;
use serde_json::value::Value as JsonValue;
use serde_json::Map;

use docfs_store::{Backend, DocPath, Error};

/// The name of a value's JSON type, as used in error messages.
pub fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Deep-merge `patch` into `existing`.
///
/// Objects merge key by key: a `null` in the patch removes the key, two objects recurse and
/// anything else is replaced by the patch value.  Arrays concatenate.  Every other pairing fails
/// with [`Error::UnmergeableTypes`].
pub fn merge_patch(existing: JsonValue, patch: JsonValue) -> Result<JsonValue, Error> {
    match (existing, patch) {
        (JsonValue::Object(existing), JsonValue::Object(patch)) => {
            Ok(JsonValue::Object(merge_objects(existing, patch)))
        }
        (JsonValue::Array(mut existing), JsonValue::Array(patch)) => {
            existing.extend(patch);
            Ok(JsonValue::Array(existing))
        }
        (existing, patch) => Err(Error::UnmergeableTypes {
            existing: kind_name(&existing),
            patch: kind_name(&patch),
        }),
    }
}

fn merge_objects(
    mut existing: Map<String, JsonValue>,
    patch: Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    for (key, value) in patch {
        match value {
            JsonValue::Null => {
                existing.remove(&key);
            }
            JsonValue::Object(inner_patch) => {
                let merged = match existing.remove(&key) {
                    Some(JsonValue::Object(inner)) => merge_objects(inner, inner_patch),
                    _ => inner_patch,
                };
                existing.insert(key, JsonValue::Object(merged));
            }
            value => {
                existing.insert(key, value);
            }
        }
    }
    existing
}

/// Decode a stored document.
pub fn decode(path: &DocPath, data: &[u8]) -> Result<JsonValue, Error> {
    serde_json::from_slice(data).map_err(|error| Error::Decode {
        path: path.to_string(),
        message: error.to_string(),
    })
}

/// Serialize a document in its compact form.
pub fn encode(value: &JsonValue) -> Result<Bytes, Error> {
    let data = serde_json::to_vec(value).map_err(|error| Error::Io(error.into()))?;
    Ok(Bytes::from(data))
}

/// Read `path`, merge `patch` into it and write the result back, returning the merged document.
///
/// The three steps are independent backend calls.  A writer that lands between the read and the
/// write has its update overwritten.
pub fn patch_document<B: Backend + ?Sized>(
    backend: &B,
    path: &DocPath,
    patch: &JsonValue,
) -> Result<JsonValue, Error> {
    let existing = decode(path, &backend.get(path)?)?;
    let merged = merge_patch(existing, patch.clone())?;
    backend.write(path, encode(&merged)?)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::MemoryBackend;

    #[test]
    fn null_deletes_and_new_keys_are_added() {
        let merged = merge_patch(json!({"x": 1, "y": 2}), json!({"y": null, "z": 3})).unwrap();
        assert_eq!(merged, json!({"x": 1, "z": 3}));
    }

    #[test]
    fn arrays_concatenate() {
        let merged = merge_patch(json!([1, 2]), json!([3])).unwrap();
        assert_eq!(merged, json!([1, 2, 3]));

        let merged = merge_patch(json!([1]), json!([1])).unwrap();
        assert_eq!(merged, json!([1, 1]));
    }

    #[test]
    fn object_with_array_is_unmergeable() {
        let err = merge_patch(json!({"x": 1}), json!([1])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnmergeableTypes {
                existing: "object",
                patch: "array"
            }
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn encode_is_compact_and_decodes_back() {
        let path = DocPath::parse("doc.json").unwrap();
        let value = json!({"name": "Alice", "tags": ["a", "b"]});

        let data = encode(&value).unwrap();
        assert_eq!(&data[..], br#"{"name":"Alice","tags":["a","b"]}"#);
        assert_eq!(decode(&path, &data).unwrap(), value);
    }

    #[test]
    fn scalars_are_unmergeable() {
        for (existing, patch) in [
            (json!(1), json!(2)),
            (json!("a"), json!({"a": 1})),
            (json!([1]), json!(null)),
            (json!(true), json!([true])),
        ] {
            assert!(matches!(
                merge_patch(existing, patch),
                Err(Error::UnmergeableTypes { .. })
            ));
        }
    }

    #[test]
    fn nested_objects_merge_deeply() {
        let existing = json!({
            "name": "alice",
            "address": {"city": "Paris", "zip": "75001", "geo": {"lat": 1, "lon": 2}},
            "tags": ["a"],
        });
        let patch = json!({
            "address": {"zip": null, "geo": {"lat": 3}},
            "tags": ["b"],
        });

        assert_eq!(
            merge_patch(existing, patch).unwrap(),
            json!({
                "name": "alice",
                "address": {"city": "Paris", "geo": {"lat": 3, "lon": 2}},
                // Arrays inside objects are replaced, not concatenated.
                "tags": ["b"],
            })
        );
    }

    #[test]
    fn patch_replaces_across_shapes() {
        let merged = merge_patch(
            json!({"a": {"deep": true}, "b": 1, "gone": null}),
            json!({"a": 5, "b": {"now": "object"}, "missing": null}),
        )
        .unwrap();
        assert_eq!(
            merged,
            json!({"a": 5, "b": {"now": "object"}, "gone": null})
        );
    }

    #[test]
    fn patch_document_writes_merged_result() {
        let backend = MemoryBackend::default();
        let path = DocPath::parse("people/bob.json").unwrap();
        backend
            .write(&path, Bytes::from_static(br#"{"age":30,"city":"Oslo"}"#))
            .unwrap();

        let merged = patch_document(&backend, &path, &json!({"age": 31, "city": null})).unwrap();

        assert_eq!(merged, json!({"age": 31}));
        assert_eq!(
            decode(&path, &backend.get(&path).unwrap()).unwrap(),
            json!({"age": 31})
        );
    }

    #[test]
    fn patch_document_leaves_document_alone_on_failure() {
        let backend = MemoryBackend::default();
        let path = DocPath::parse("list.json").unwrap();
        backend.write(&path, Bytes::from_static(b"[1]")).unwrap();

        let err = patch_document(&backend, &path, &json!({"x": 1})).unwrap_err();
        assert!(matches!(err, Error::UnmergeableTypes { .. }));
        assert_eq!(backend.get(&path).unwrap(), Bytes::from_static(b"[1]"));

        let missing = DocPath::parse("missing.json").unwrap();
        assert!(patch_document(&backend, &missing, &json!({}))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn undecodable_documents_are_internal_errors() {
        let path = DocPath::parse("broken.json").unwrap();
        let err = decode(&path, b"{not json").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.kind(), docfs_store::ErrorKind::Internal);
    }
}
