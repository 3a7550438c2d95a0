//! Operation extraction.

use super::document::{key_str, to_json, Document};
use super::example::placeholder;
use super::{OperationRecord, ParseError};
use crate::model::{normalize_path, HttpMethod, DEFAULT_STATUS};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Verb order within a path item.
const METHOD_ORDER: [HttpMethod; 8] = [
    HttpMethod::Get,
    HttpMethod::Put,
    HttpMethod::Post,
    HttpMethod::Delete,
    HttpMethod::Options,
    HttpMethod::Head,
    HttpMethod::Patch,
    HttpMethod::Trace,
];

const JSON_MEDIA_TYPE: &str = "application/json";
const EMPTY_BODY: &str = "{}";

/// Parse an OpenAPI (or Swagger 2.0) document into operation records.
///
/// Paths keep declaration order; verbs within a path follow a fixed order.
/// Only syntactically invalid input fails. Missing details fall back to
/// status 200, an empty JSON object body and a JSON content type.
pub fn extract(document: &[u8]) -> Result<Vec<OperationRecord>, ParseError> {
    let root: Value =
        serde_yaml::from_slice(document).map_err(|e| ParseError::Syntax(e.to_string()))?;
    if !root.is_mapping() {
        return Err(ParseError::NotAMapping);
    }

    let doc = Document::new(&root);
    let Some(paths) = root.get("paths").and_then(Value::as_mapping) else {
        debug!("Document declares no paths");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for (raw_path, item) in paths {
        let Some(raw_path) = key_str(raw_path) else {
            continue;
        };
        let Some(item) = doc.resolve(item).as_mapping() else {
            continue;
        };
        let path = normalize_path(&raw_path);

        for method in METHOD_ORDER {
            for operation in verbs(item, method) {
                records.push(build_record(&doc, method, path.clone(), operation));
            }
        }
    }

    debug!("Extracted {} operations", records.len());
    Ok(records)
}

/// Every key of a path item naming `method`, in any case and in
/// declaration order. `get` next to `GET` yields both operations.
fn verbs(item: &Mapping, method: HttpMethod) -> impl Iterator<Item = &Value> {
    item.iter()
        .filter(move |(k, _)| {
            key_str(k).is_some_and(|k| k.eq_ignore_ascii_case(method.as_str()))
        })
        .map(|(_, v)| v)
}

fn build_record<'a>(
    doc: &Document<'a>,
    method: HttpMethod,
    path: String,
    operation: &'a Value,
) -> OperationRecord {
    let (response_status, response) = match select_response(doc, operation) {
        Some((status, response)) => (status, Some(response)),
        None => (DEFAULT_STATUS, None),
    };

    let (media_type, example) = response
        .map(|r| response_example(doc, r))
        .unwrap_or((None, None));

    let response_body = example
        .filter(|v| !v.is_null())
        .map(|v| render_body(media_type.as_deref(), v))
        .unwrap_or_else(|| EMPTY_BODY.to_string());

    let response_headers = response_headers(doc, response, media_type.as_deref());

    OperationRecord {
        method,
        path,
        response_status,
        response_body,
        response_headers,
    }
}

/// Lowest numeric 2xx response, else a `2XX` range response.
fn select_response<'a>(doc: &Document<'a>, operation: &'a Value) -> Option<(u16, &'a Value)> {
    let responses = doc.resolve(operation).get("responses")?.as_mapping()?;

    let mut best: Option<(u16, &Value)> = None;
    let mut range = None;
    for (code, response) in responses {
        let Some(code) = key_str(code) else {
            continue;
        };
        match code.parse::<u16>() {
            Ok(status) if (200..300).contains(&status) => {
                if best.map_or(true, |(current, _)| status < current) {
                    best = Some((status, response));
                }
            }
            Ok(_) => {}
            Err(_) if code.eq_ignore_ascii_case("2XX") => range = Some((DEFAULT_STATUS, response)),
            Err(_) => {}
        }
    }

    best.or(range)
        .map(|(status, response)| (status, doc.resolve(response)))
}

/// Choose the media type and the example value a response provides.
fn response_example<'a>(
    doc: &Document<'a>,
    response: &'a Value,
) -> (Option<String>, Option<JsonValue>) {
    if let Some((media_type, media)) = response
        .get("content")
        .and_then(Value::as_mapping)
        .and_then(preferred_media)
    {
        return (Some(media_type), media_example(doc, doc.resolve(media)));
    }

    // Swagger 2.0 keeps examples keyed by mime type and the schema on the response
    if let Some((media_type, example)) = response
        .get("examples")
        .and_then(Value::as_mapping)
        .and_then(preferred_media)
    {
        return (Some(media_type), Some(to_json(example)));
    }
    let schema = response.get("schema").map(|s| placeholder(doc, s));
    (None, schema)
}

fn media_example<'a>(doc: &Document<'a>, media: &'a Value) -> Option<JsonValue> {
    if let Some(example) = media.get("example") {
        return Some(to_json(example));
    }
    let named = media
        .get("examples")
        .and_then(Value::as_mapping)
        .and_then(|examples| examples.values().next())
        .map(|example| doc.resolve(example))
        .and_then(|example| example.get("value"));
    if let Some(value) = named {
        return Some(to_json(value));
    }
    media.get("schema").map(|schema| placeholder(doc, schema))
}

/// `application/json`, then any `+json` type, then the first declared.
fn preferred_media(content: &Mapping) -> Option<(String, &Value)> {
    let entries: Vec<(String, &Value)> = content
        .iter()
        .filter_map(|(k, v)| Some((key_str(k)?, v)))
        .collect();

    let position = entries
        .iter()
        .position(|(media_type, _)| essence(media_type) == JSON_MEDIA_TYPE)
        .or_else(|| {
            entries
                .iter()
                .position(|(media_type, _)| essence(media_type).ends_with("+json"))
        })
        .unwrap_or(0);
    entries.into_iter().nth(position)
}

/// Media type without parameters, lower-cased.
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase()
}

fn is_json_media(media_type: Option<&str>) -> bool {
    media_type.map_or(true, |m| {
        let m = essence(m);
        m == JSON_MEDIA_TYPE || m.ends_with("+json")
    })
}

fn render_body(media_type: Option<&str>, value: JsonValue) -> String {
    match value {
        JsonValue::String(text) if !is_json_media(media_type) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| EMPTY_BODY.to_string()),
    }
}

fn response_headers<'a>(
    doc: &Document<'a>,
    response: Option<&'a Value>,
    media_type: Option<&str>,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    let declared = response
        .and_then(|r| r.get("headers"))
        .and_then(Value::as_mapping);
    for (name, header) in declared.into_iter().flatten() {
        let Some(name) = key_str(name) else {
            continue;
        };
        let header = doc.resolve(header);
        let schema = header.get("schema").map(|s| doc.resolve(s));
        let value = header
            .get("example")
            .or_else(|| schema.and_then(|s| s.get("example")))
            .or_else(|| schema.and_then(|s| s.get("default")))
            // Swagger 2.0 headers carry the default directly
            .or_else(|| header.get("default"));
        if let Some(value) = value.and_then(header_text) {
            headers.insert(name, value);
        }
    }

    if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
        headers.insert(
            "Content-Type".to_string(),
            media_type.unwrap_or(JSON_MEDIA_TYPE).to_string(),
        );
    }
    headers
}

fn header_text(value: &Value) -> Option<String> {
    let text = match to_json(value) {
        JsonValue::Null => return None,
        JsonValue::String(s) => s,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
