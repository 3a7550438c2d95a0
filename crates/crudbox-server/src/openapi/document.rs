//! Loosely-typed view over a parsed OpenAPI document.
//!
//! Only local references (`#/...`) are followed; anything else is left as-is.

use serde_json::Value as JsonValue;
use serde_yaml::Value;

/// Longest `$ref` chain followed before giving up.
const MAX_REF_CHAIN: usize = 16;

pub(super) struct Document<'a> {
    root: &'a Value,
}

impl<'a> Document<'a> {
    pub(super) fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow `$ref` chains until a concrete node is reached.
    ///
    /// An unresolvable or cyclic chain returns the last node reached.
    pub(super) fn resolve(&self, mut value: &'a Value) -> &'a Value {
        for _ in 0..MAX_REF_CHAIN {
            let Some(target) = reference(value).and_then(|r| self.lookup(r)) else {
                break;
            };
            value = target;
        }
        value
    }

    /// Look up a local JSON pointer such as `#/components/schemas/User`.
    pub(super) fn lookup(&self, pointer: &str) -> Option<&'a Value> {
        let path = pointer.strip_prefix('#')?;
        let mut node = self.root;
        for token in path.split('/').skip(1) {
            let token = token.replace("~1", "/").replace("~0", "~");
            node = match node {
                Value::Mapping(map) => map
                    .iter()
                    .find(|(k, _)| key_str(k).as_deref() == Some(token.as_str()))
                    .map(|(_, v)| v)?,
                Value::Sequence(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

/// The `$ref` target of a node, if it is a reference object.
pub(super) fn reference(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// Mapping keys as text; YAML allows bare numbers such as `200:`.
pub(super) fn key_str(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => key_str(&tagged.value),
        _ => None,
    }
}

/// Convert a YAML node to JSON, stringifying non-string keys.
pub(super) fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Sequence(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Mapping(map) => JsonValue::Object(
            map.iter()
                .filter_map(|(k, v)| Some((key_str(k)?, to_json(v))))
                .collect(),
        ),
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_lookup_and_resolve() {
        let root = parse(
            r#"
components:
  schemas:
    User: {type: object}
    Alias: {$ref: '#/components/schemas/User'}
    "a/b": {type: string}
"#,
        );
        let doc = Document::new(&root);
        let alias = doc.lookup("#/components/schemas/Alias").unwrap();
        assert_eq!(doc.resolve(alias).get("type").and_then(Value::as_str), Some("object"));
        assert!(doc.lookup("#/components/schemas/a~1b").is_some());
        assert!(doc.lookup("#/components/schemas/Missing").is_none());
        assert!(doc.lookup("other.yaml#/User").is_none());
    }

    #[test]
    fn test_cyclic_refs_terminate() {
        let root = parse(
            r#"
a: {$ref: '#/b'}
b: {$ref: '#/a'}
"#,
        );
        let doc = Document::new(&root);
        let start = doc.lookup("#/a").unwrap();
        assert!(reference(doc.resolve(start)).is_some());
    }

    #[test]
    fn test_to_json_stringifies_numeric_keys() {
        let json = to_json(&parse("200: {ok: true}\nlist: [1, 2.5, x]"));
        assert_eq!(json["200"]["ok"], true);
        assert_eq!(json["list"], serde_json::json!([1, 2.5, "x"]));
    }
}
