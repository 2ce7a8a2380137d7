//! Apply a patch, read a value back, and run a subtree query.
//!
//! Run:  cargo run --example patch -p cbor-patch

use cbor_patch::{find_children, from_json, get_value, to_json, Patch, Path, PathValue};

fn main() -> Result<(), cbor_patch::PatchError> {
    let doc = from_json(r#"{"baz": "qux", "foo": "bar"}"#)?;
    let patch = Patch::from_json(
        r#"[
            {"op": "replace", "path": "/baz", "value": "boo"},
            {"op": "add", "path": "/hello", "value": ["world"]},
            {"op": "remove", "path": "/foo"}
        ]"#,
    )?;

    let patched = patch.apply(&doc)?;
    println!("patched document: {}", to_json(&patched)?);

    let hello = get_value(&patched, &Path::from_pointer("/hello/0")?)?;
    println!("value at /hello/0: {}", to_json(&hello)?);

    let library = from_json(
        r#"["root", ["book", {"id": "b1"}], ["book", {"id": "b2"}], ["shelf", {"id": "s1"}]]"#,
    )?;
    let books = find_children(
        &library,
        &[PathValue::new(
            Path::from_pointer("/0")?,
            from_json(r#""book""#)?,
        )],
    )?;
    for book in &books {
        println!("found {} = {}", book.path, to_json(&book.value)?);
    }
    Ok(())
}
