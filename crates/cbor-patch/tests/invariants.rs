//! Cross-cutting properties of the engine.

use cbor_patch::{
    equal, find_children, from_json, get_value, to_json, Node, Patch, PatchOptions, PathValue,
    Path,
};

const DOCS: &[&str] = &[
    r#"{"foo": "bar"}"#,
    r#"{"z":"1","a":["baz"],"y":3,"b":true,"x":null}"#,
    r#"[1, [2, [3, {"deep": null}]], {"k": "v"}]"#,
    r#"{"n": {"m": {"o": [0, 1.5, "2", false]}}}"#,
    "[]",
    "{}",
];

#[test]
fn round_trip_stability() {
    for text in DOCS {
        let encoded = from_json(text).unwrap();
        let node = Node::new(&encoded);
        assert!(equal(&node.marshal(), &encoded), "{text}");
        // a full traversal materializes every container without changing
        // the canonical form
        let mut node = Node::new(&encoded);
        let probe = [PathValue::new(
            Path::from_pointer("/no-such-key").unwrap(),
            Vec::new(),
        )];
        let _ = node.find_children(&probe, &PatchOptions::default());
        assert_eq!(node.marshal(), encoded, "{text}");
    }
}

#[test]
fn equality_is_an_equivalence_relation() {
    let encoded: Vec<Vec<u8>> = DOCS.iter().map(|d| from_json(d).unwrap()).collect();
    for a in &encoded {
        assert!(equal(a, a));
        for b in &encoded {
            assert_eq!(equal(a, b), equal(b, a));
            for c in &encoded {
                if equal(a, b) && equal(b, c) {
                    assert!(equal(a, c));
                }
            }
        }
    }
}

#[test]
fn patch_application_is_deterministic() {
    let doc = from_json(r#"{"a": [1, 2], "b": {"c": "d"}}"#).unwrap();
    let patch = Patch::from_json(
        r#"[
            {"op": "add", "path": "/b/e", "value": [null, {"x": 1}]},
            {"op": "move", "from": "/a/0", "path": "/a/-"},
            {"op": "copy", "from": "/b", "path": "/snapshot"}
        ]"#,
    )
    .unwrap();
    let first = patch.apply(&doc).unwrap();
    let second = patch.apply(&doc).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_round_trips_get_value() {
    let doc = from_json(r#"{"a": {"b": [1, null, "x"]}, "c": null}"#).unwrap();
    for path in ["/a", "/a/b", "/a/b/0", "/a/b/1", "/a/b/2", "/c"] {
        let path = Path::from_pointer(path).unwrap();
        let value = get_value(&doc, &path).unwrap();
        let mut patch = Patch::default();
        patch.0.push(
            cbor_patch::Operation::new(cbor_patch::OpCode::Test, path).with_value(value),
        );
        assert!(patch.apply(&doc).is_ok());
    }
}

#[test]
fn add_then_remove_cancels_on_fresh_map_keys() {
    let doc = from_json(r#"{"a": 1, "b": {"c": 2}}"#).unwrap();
    for (path, value) in [("/new", "true"), ("/b/new", r#"[1,2]"#)] {
        let patch = Patch::from_json(&format!(
            r#"[{{"op": "add", "path": "{path}", "value": {value}}},
                {{"op": "remove", "path": "{path}"}}]"#
        ))
        .unwrap();
        let out = patch.apply(&doc).unwrap();
        assert!(equal(&out, &doc), "{path}");
    }
}

#[test]
fn replace_root_with_itself_is_identity() {
    for text in [r#"{"a": [1, {"b": null}]}"#, "[1, 2, [3]]"] {
        let doc = from_json(text).unwrap();
        let patch = Patch::new(vec![cbor_patch::Operation::new(
            cbor_patch::OpCode::Replace,
            Path::root(),
        )
        .with_value(doc.clone())]);
        let out = patch.apply(&doc).unwrap();
        assert!(equal(&out, &doc), "{text}");
    }
}

#[test]
fn copy_is_deeply_independent() {
    let doc = from_json(r#"{"src": {"list": [1]}}"#).unwrap();
    // copy, then mutate the copy and the source separately
    let patch = Patch::from_json(
        r#"[
            {"op": "copy", "from": "/src", "path": "/dst"},
            {"op": "add", "path": "/dst/list/-", "value": 2},
            {"op": "add", "path": "/src/list/-", "value": 3}
        ]"#,
    )
    .unwrap();
    let out = patch.apply(&doc).unwrap();
    let expected = from_json(r#"{"src": {"list": [1, 3]}, "dst": {"list": [1, 2]}}"#).unwrap();
    assert!(equal(&out, &expected));
}

#[test]
fn find_children_results_are_sound() {
    let doc = from_json(
        r#"{"items": [{"kind": "a", "id": 1}, {"kind": "a", "id": 2}, {"kind": "b", "id": 3}]}"#,
    )
    .unwrap();
    let predicates = [
        PathValue::new(Path::from_pointer("/kind").unwrap(), from_json(r#""a""#).unwrap()),
        PathValue::new(Path::from_pointer("/id").unwrap(), from_json("2").unwrap()),
    ];
    let found = find_children(&doc, &predicates).unwrap();
    assert_eq!(found.len(), 1);
    for result in &found {
        // the reported value is what the path resolves to
        assert!(equal(&get_value(&doc, &result.path).unwrap(), &result.value));
        // and every predicate holds beneath it
        for predicate in &predicates {
            let mut sub = result.path.clone();
            for key in &predicate.path {
                sub.push(key.clone());
            }
            let resolved = get_value(&doc, &sub).unwrap();
            assert!(equal(&resolved, &predicate.value));
        }
    }
}

#[test]
fn pointer_escape_round_trip() {
    for key in ["plain", "sl/ash", "til~de", "both~/", "", "1a"] {
        let escaped = key.replace('~', "~0").replace('/', "~1");
        let path = Path::from_pointer(&format!("/{escaped}")).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(
            path.keys()[0],
            cbor_patch::EncodedKey::from_text(key)
        );
        assert_eq!(path.to_pointer().unwrap(), format!("/{escaped}"));
    }
}

#[test]
fn serialization_reflects_canonical_key_order() {
    // JSON insertion order differs; canonical CBOR sorts by encoded key bytes
    let a = from_json(r#"{"z": 1, "aa": 2, "b": 3}"#).unwrap();
    let b = from_json(r#"{"aa": 2, "b": 3, "z": 1}"#).unwrap();
    assert_eq!(a, b);
    assert_eq!(to_json(&a).unwrap(), to_json(&b).unwrap());
}
