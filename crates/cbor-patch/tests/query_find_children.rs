//! Query surface: value lookup and conjunctive subtree search.

use cbor_patch::{equal, find_children, from_json, get_value, Path, PathValue};

fn doc(s: &str) -> Vec<u8> {
    from_json(s).unwrap()
}

fn pointer(s: &str) -> Path {
    Path::from_pointer(s).unwrap()
}

fn pv(path: &str, value_json: &str) -> PathValue {
    PathValue::new(pointer(path), doc(value_json))
}

#[test]
fn get_value_table() {
    let cases: &[(&str, &str, &str)] = &[
        (r#"{ "baz": "qux" }"#, "/baz", r#""qux""#),
        (r#"{ "baz": "qux", "foo": [ "a", 2, "c" ] }"#, "/foo/0", r#""a""#),
        (r#"{ "baz": "qux", "foo": [ "a", 2, "c" ] }"#, "/foo/1", "2"),
        (
            r#"{ "baz": "qux", "foo": [ "a", 2, "c", {"baz": null} ] }"#,
            "/foo/3/baz",
            "null",
        ),
        (
            r#"{ "baz": "qux", "foo": [ "a", 2, "c", {"baz": null}, null ] }"#,
            "/foo/4",
            "null",
        ),
        (r#"{ "foo": {} }"#, "/foo", "{}"),
        (r#"{ "foo": [ ] }"#, "/foo", "[]"),
        (r#"{ "foo": null }"#, "/foo", "null"),
        (r#"{ "baz/foo": "qux" }"#, "/baz~1foo", r#""qux""#),
    ];
    for (i, (doc_json, path, expected)) in cases.iter().enumerate() {
        let got = get_value(&doc(doc_json), &pointer(path))
            .unwrap_or_else(|e| panic!("case {i}: {e}"));
        assert!(
            equal(&got, &doc(expected)),
            "case {i}: expected {expected}"
        );
    }

    assert!(get_value(
        &doc(r#"{ "baz": "qux", "foo": [ "a", 2, "c" ] }"#),
        &pointer("/fooo")
    )
    .is_err());
}

#[test]
fn find_children_matches_root() {
    let d = doc(r#"{ "baz": "qux" }"#);
    let found = find_children(&d, &[pv("/baz", r#""qux""#)]).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].path.is_empty());
    assert!(equal(&found[0].value, &d));
}

#[test]
fn find_children_matches_nested_array() {
    let d = doc(r#"{ "baz": "qux", "foo": [ "a", 2, "c" ] }"#);
    let found = find_children(&d, &[pv("/1", "2")]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, pointer("/foo"));
    assert!(equal(&found[0].value, &doc(r#"[ "a", 2, "c" ]"#)));
}

#[test]
fn find_children_empty_and_null_expectations() {
    // empty containers match by equality
    let d = doc(r#"{ "foo": {} }"#);
    assert_eq!(find_children(&d, &[pv("/foo", "{}")]).unwrap().len(), 1);
    let d = doc(r#"{ "foo": [] }"#);
    assert_eq!(find_children(&d, &[pv("/foo", "[]")]).unwrap().len(), 1);

    // a null value matches an explicit null and an empty expectation
    let d = doc(r#"{ "foo": null }"#);
    assert_eq!(find_children(&d, &[pv("/foo", "null")]).unwrap().len(), 1);
    let empty = PathValue::new(pointer("/foo"), Vec::new());
    assert_eq!(find_children(&d, &[empty]).unwrap().len(), 1);

    // no match at all
    let d = doc(r#"{ "baz": "qux", "foo": [ "a", 2, "c" ] }"#);
    assert!(find_children(&d, &[pv("/fooo", "null")])
        .unwrap()
        .is_empty());
}

#[test]
fn find_children_escaped_key() {
    let d = doc(r#"{ "baz/foo": [ "qux" ] }"#);
    let found = find_children(&d, &[pv("/0", r#""qux""#)]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, pointer("/baz~1foo"));
}

#[test]
fn find_children_conjunction_scenario() {
    let d = doc(r#"["root", ["object", { "id": "id1" }], ["object", { "id": "id2" }]]"#);

    // the first predicate alone selects both tagged arrays
    let found = find_children(&d, &[pv("/0", r#""object""#)]).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].path, pointer("/1"));
    assert_eq!(found[1].path, pointer("/2"));

    // the second predicate narrows to the one carrying id1
    let found = find_children(&d, &[pv("/0", r#""object""#), pv("/1/id", r#""id1""#)]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, pointer("/1"));
    assert!(equal(&found[0].value, &doc(r#"["object", { "id": "id1" }]"#)));

    // predicate order matters: a first predicate with no matches ends the
    // search even if the other one would match
    let found = find_children(&d, &[pv("/1/id", r#""id0""#), pv("/0", r#""object""#)]).unwrap();
    assert!(found.is_empty());
}

#[test]
fn find_children_results_satisfy_get_value() {
    let d = doc(r#"{"a": {"id": 1, "sub": {"id": 1}}, "b": {"id": 2}}"#);
    let found = find_children(&d, &[pv("/id", "1")]).unwrap();
    assert_eq!(found.len(), 2);
    for result in &found {
        let via_path = get_value(&d, &result.path).unwrap();
        assert!(equal(&via_path, &result.value));
    }
}
