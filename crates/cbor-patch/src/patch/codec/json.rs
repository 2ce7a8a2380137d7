//! The JSON surface for patches: arrays of `{"op", "path", "from", "value"}`
//! objects with JSON Pointer paths.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::error::PatchError;
use crate::json;
use crate::patch::types::{OpCode, Operation, Patch};
use crate::path::Path;

#[derive(Debug, Deserialize)]
struct JsonOperation {
    op: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    from: Option<String>,
    // `"value": null` must stay distinct from an absent "value"
    #[serde(default, deserialize_with = "present")]
    value: Option<JsonValue>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl Patch {
    /// Decodes a JSON patch document.
    pub fn from_json(text: &str) -> Result<Patch, PatchError> {
        let raw: Vec<JsonOperation> = serde_json::from_str(text)
            .map_err(|e| PatchError::InvalidOperation(e.to_string()))?;
        let mut ops = Vec::with_capacity(raw.len());
        for entry in raw {
            let op = OpCode::from_name(&entry.op)?;
            let mut operation =
                Operation::new(op, Path::from_pointer(entry.path.as_deref().unwrap_or(""))?);
            if let Some(from) = &entry.from {
                operation = operation.with_from(Path::from_pointer(from)?);
            }
            if let Some(value) = &entry.value {
                operation = operation.with_value(json::value_to_cbor(value));
            }
            operation.validate()?;
            ops.push(operation);
        }
        Ok(Patch(ops))
    }

    /// Encodes the patch as a `serde_json::Value`.
    ///
    /// Fails with `InvalidPath` when a path carries keys the JSON Pointer
    /// surface cannot address (byte strings).
    pub fn to_json_value(&self) -> Result<JsonValue, PatchError> {
        let mut out = Vec::with_capacity(self.len());
        for op in self {
            let mut entry = serde_json::Map::new();
            entry.insert("op".to_string(), JsonValue::String(op.op.name().to_string()));
            entry.insert("path".to_string(), JsonValue::String(op.path.to_pointer()?));
            if let Some(from) = &op.from {
                entry.insert("from".to_string(), JsonValue::String(from.to_pointer()?));
            }
            if let Some(value) = &op.value {
                entry.insert("value".to_string(), json::bytes_to_value(value)?);
            }
            out.push(JsonValue::Object(entry));
        }
        Ok(JsonValue::Array(out))
    }

    /// Encodes the patch as JSON text.
    pub fn to_json(&self) -> Result<String, PatchError> {
        serde_json::to_string(&self.to_json_value()?).map_err(|_| PatchError::UnknownType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbor::RAW_NULL;

    #[test]
    fn decode_standard_patch() {
        let patch = Patch::from_json(
            r#"[
                {"op": "add", "path": "/foo", "value": 1},
                {"op": "remove", "path": "/bar"},
                {"op": "move", "path": "/a", "from": "/b"},
                {"op": "test", "path": "/t", "value": [1, 2]}
            ]"#,
        )
        .unwrap();
        assert_eq!(patch.len(), 4);
        assert_eq!(patch.0[0].op, OpCode::Add);
        assert_eq!(patch.0[0].value.as_deref(), Some([0x01].as_slice()));
        assert_eq!(patch.0[1].op, OpCode::Remove);
        assert_eq!(
            patch.0[2].from.as_ref().unwrap(),
            &Path::from_pointer("/b").unwrap()
        );
        assert_eq!(patch.0[3].value.as_deref(), Some([0x82, 0x01, 0x02].as_slice()));
    }

    #[test]
    fn null_value_is_present_absent_value_is_not() {
        let patch = Patch::from_json(
            r#"[
                {"op": "add", "path": "/a", "value": null},
                {"op": "test", "path": "/b"}
            ]"#,
        )
        .unwrap();
        assert_eq!(patch.0[0].value.as_deref(), Some(RAW_NULL));
        assert_eq!(patch.0[1].value, None);
    }

    #[test]
    fn decode_rejects_bad_operations() {
        assert!(Patch::from_json(r#"[{"op": "patch", "path": "/a"}]"#).is_err());
        // add without value violates the validity table
        assert!(matches!(
            Patch::from_json(r#"[{"op": "add", "path": "/a"}]"#),
            Err(PatchError::InvalidOperation(_))
        ));
        // move without from
        assert!(Patch::from_json(r#"[{"op": "move", "path": "/a"}]"#).is_err());
        // relative pointer
        assert!(matches!(
            Patch::from_json(r#"[{"op": "remove", "path": "a"}]"#),
            Err(PatchError::InvalidPath(_))
        ));
    }

    #[test]
    fn json_roundtrip() {
        let text = r#"[{"op":"copy","path":"/a/-","from":"/b/1"},{"op":"replace","path":"/x","value":{"k":[1,2]}}]"#;
        let patch = Patch::from_json(text).unwrap();
        let round = Patch::from_json(&patch.to_json().unwrap()).unwrap();
        assert_eq!(patch, round);
    }
}
