//! Placeholder values synthesised from JSON schemas.

use super::document::{key_str, reference, to_json, Document};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;

/// Deepest schema nesting explored.
const MAX_DEPTH: usize = 24;

/// Approximate compact size one placeholder may reach. Pretty-printed it
/// stays below the default response body limit.
const MAX_PLACEHOLDER_BYTES: usize = 256 * 1024;

/// Build a representative value for `schema`.
///
/// Precedence: `example`, `default`, first `enum` entry, then a value shaped
/// by `type`. Unknown or cyclic schemas produce `null`. The size budget is
/// shared by every `$ref` expansion; once it is spent the remaining nodes
/// become `null`.
pub(super) fn placeholder(doc: &Document<'_>, schema: &Value) -> JsonValue {
    Builder::new(doc, MAX_PLACEHOLDER_BYTES).build(schema, 0)
}

struct Builder<'d, 'a> {
    doc: &'d Document<'a>,
    /// `$ref` targets currently being expanded.
    active: Vec<String>,
    remaining: usize,
}

impl<'d, 'a> Builder<'d, 'a> {
    fn new(doc: &'d Document<'a>, budget: usize) -> Self {
        Self {
            doc,
            active: Vec::new(),
            remaining: budget,
        }
    }

    /// Take `cost` from the budget. An overdraft empties it.
    fn charge(&mut self, cost: usize) -> bool {
        match self.remaining.checked_sub(cost) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => {
                self.remaining = 0;
                false
            }
        }
    }

    /// Literal values from the document are charged by their size.
    fn literal(&mut self, value: &Value) -> JsonValue {
        let value = to_json(value);
        if self.charge(approximate_size(&value)) {
            value
        } else {
            JsonValue::Null
        }
    }

    fn build(&mut self, schema: &Value, depth: usize) -> JsonValue {
        if depth > MAX_DEPTH || !self.charge(1) {
            return JsonValue::Null;
        }

        if let Some(target) = reference(schema) {
            if self.active.iter().any(|r| r == target) {
                return JsonValue::Null;
            }
            let Some(resolved) = self.doc.lookup(target) else {
                return JsonValue::Null;
            };
            self.active.push(target.to_string());
            let value = self.build(resolved, depth + 1);
            self.active.pop();
            return value;
        }

        if let Some(example) = schema.get("example") {
            return self.literal(example);
        }
        if let Some(default) = schema.get("default") {
            return self.literal(default);
        }
        if let Some(first) = schema
            .get("enum")
            .and_then(Value::as_sequence)
            .and_then(|values| values.first())
        {
            return self.literal(first);
        }

        if let Some(parts) = schema.get("allOf").and_then(Value::as_sequence) {
            let mut merged = Map::new();
            let mut scalar = JsonValue::Null;
            for part in parts {
                match self.build(part, depth + 1) {
                    JsonValue::Object(fields) => merged.extend(fields),
                    JsonValue::Null => {}
                    other => scalar = other,
                }
            }
            return if merged.is_empty() {
                scalar
            } else {
                JsonValue::Object(merged)
            };
        }
        for combinator in ["oneOf", "anyOf"] {
            if let Some(first) = schema
                .get(combinator)
                .and_then(Value::as_sequence)
                .and_then(|options| options.first())
            {
                return self.build(first, depth + 1);
            }
        }

        match schema_type(schema) {
            Some("object") => self.object(schema, depth),
            Some("array") => self.array(schema, depth),
            Some("integer") | Some("number") => JsonValue::from(0),
            Some("boolean") => JsonValue::Bool(false),
            Some("string") => {
                let sample = string_sample(schema);
                if self.charge(sample.len() + 2) {
                    JsonValue::String(sample.to_string())
                } else {
                    JsonValue::Null
                }
            }
            Some(_) => JsonValue::Null,
            // Untyped schemas are inferred from their keywords
            None if schema.get("properties").is_some() => self.object(schema, depth),
            None if schema.get("items").is_some() => self.array(schema, depth),
            None => JsonValue::Null,
        }
    }

    fn object(&mut self, schema: &Value, depth: usize) -> JsonValue {
        let mut fields = Map::new();
        if let Some(properties) = schema.get("properties").and_then(Value::as_mapping) {
            for (name, property) in properties {
                let Some(name) = key_str(name) else {
                    continue;
                };
                if !self.charge(name.len() + 4) {
                    break;
                }
                let value = self.build(property, depth + 1);
                fields.insert(name, value);
            }
        }
        JsonValue::Object(fields)
    }

    fn array(&mut self, schema: &Value, depth: usize) -> JsonValue {
        let item = schema
            .get("items")
            .map(|items| self.build(items, depth + 1))
            .unwrap_or(JsonValue::Null);
        if item.is_null() {
            JsonValue::Array(Vec::new())
        } else {
            JsonValue::Array(vec![item])
        }
    }
}

/// Rough length of `value` once serialized.
fn approximate_size(value: &JsonValue) -> usize {
    match value {
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => 8,
        JsonValue::String(s) => s.len() + 2,
        JsonValue::Array(items) => {
            items.iter().map(|v| approximate_size(v) + 1).sum::<usize>() + 2
        }
        JsonValue::Object(fields) => {
            fields
                .iter()
                .map(|(k, v)| k.len() + 4 + approximate_size(v))
                .sum::<usize>()
                + 2
        }
    }
}

/// `type` may be a single name or, in OpenAPI 3.1, a list including "null".
fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(name) => Some(name.as_str()),
        Value::Sequence(names) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null"),
        _ => None,
    }
}

fn string_sample(schema: &Value) -> &'static str {
    match schema.get("format").and_then(Value::as_str) {
        Some("date-time") => "2024-01-01T00:00:00Z",
        Some("date") => "2024-01-01",
        Some("uuid") => "00000000-0000-0000-0000-000000000000",
        Some("email") => "user@example.com",
        Some("uri") | Some("url") => "https://example.com",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn placeholder_for(yaml: &str, pointer: &str) -> JsonValue {
        let root: Value = serde_yaml::from_str(yaml).unwrap();
        let doc = Document::new(&root);
        let schema = doc.lookup(pointer).unwrap();
        placeholder(&doc, schema)
    }

    #[test]
    fn test_typed_placeholders() {
        let value = placeholder_for(
            r#"
s:
  type: object
  properties:
    id: {type: integer}
    name: {type: string}
    active: {type: boolean}
    created: {type: string, format: date-time}
    tags: {type: array, items: {type: string}}
    role: {type: string, enum: [admin, user]}
    score: {type: number, default: 4.5}
"#,
            "#/s",
        );
        assert_eq!(
            value,
            json!({
                "id": 0,
                "name": "",
                "active": false,
                "created": "2024-01-01T00:00:00Z",
                "tags": [""],
                "role": "admin",
                "score": 4.5
            })
        );
    }

    #[test]
    fn test_example_wins_over_type() {
        let value = placeholder_for("s: {type: object, example: {id: 7}}", "#/s");
        assert_eq!(value, json!({"id": 7}));
    }

    #[test]
    fn test_refs_and_combinators() {
        let yaml = r#"
components:
  schemas:
    Base:
      type: object
      properties:
        id: {type: string, format: uuid}
    Named:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          properties:
            name: {type: string, example: Ada}
    Either:
      oneOf:
        - {type: integer}
        - {type: string}
"#;
        assert_eq!(
            placeholder_for(yaml, "#/components/schemas/Named"),
            json!({"id": "00000000-0000-0000-0000-000000000000", "name": "Ada"})
        );
        assert_eq!(placeholder_for(yaml, "#/components/schemas/Either"), json!(0));
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let yaml = r#"
components:
  schemas:
    Node:
      type: object
      properties:
        value: {type: integer}
        next: {$ref: '#/components/schemas/Node'}
"#;
        let root: Value = serde_yaml::from_str(yaml).unwrap();
        let doc = Document::new(&root);
        let schema: Value = serde_yaml::from_str("$ref: '#/components/schemas/Node'").unwrap();
        assert_eq!(placeholder(&doc, &schema), json!({"value": 0, "next": null}));
    }

    /// Seven schemas whose eight properties all point at the next one.
    fn fan_out_document() -> String {
        let mut yaml = String::from("components:\n  schemas:\n");
        for level in 0..7 {
            yaml.push_str(&format!("    S{level}:\n      type: object\n      properties:\n"));
            for field in 0..8 {
                yaml.push_str(&format!(
                    "        field{field}: {{$ref: '#/components/schemas/S{}'}}\n",
                    level + 1
                ));
            }
        }
        yaml.push_str("    S7: {type: string, format: date-time}\n");
        yaml
    }

    #[test]
    fn test_shared_refs_are_budgeted() {
        let root: Value = serde_yaml::from_str(&fan_out_document()).unwrap();
        let doc = Document::new(&root);
        let schema: Value = serde_yaml::from_str("$ref: '#/components/schemas/S0'").unwrap();

        let value = placeholder(&doc, &schema);
        let rendered = serde_json::to_string(&value).unwrap();
        assert!(rendered.len() < 2 * MAX_PLACEHOLDER_BYTES, "{} bytes", rendered.len());

        // The first branch is built in full before the budget runs out
        let mut leaf = &value;
        for _ in 0..7 {
            leaf = &leaf["field0"];
        }
        assert_eq!(leaf, &json!("2024-01-01T00:00:00Z"));
        assert!(value["field7"]["field7"].is_null());
    }

    #[test]
    fn test_large_example_spends_budget() {
        let root: Value = serde_yaml::from_str("s: {}").unwrap();
        let doc = Document::new(&root);
        let schema: Value = serde_yaml::from_str(
            "type: object\nproperties:\n  a: {example: abcdefgh}\n  b: {type: integer}",
        )
        .unwrap();
        assert_eq!(
            Builder::new(&doc, 1024).build(&schema, 0),
            json!({"a": "abcdefgh", "b": 0})
        );
        assert_eq!(
            Builder::new(&doc, 12).build(&schema, 0),
            json!({"a": null})
        );
    }

    #[test]
    fn test_nullable_type_list() {
        assert_eq!(placeholder_for("s: {type: [string, 'null']}", "#/s"), json!(""));
        assert_eq!(placeholder_for("s: {}", "#/s"), JsonValue::Null);
    }
}
