//! Domain types shared by the store, the matcher, the mock listener and the
//! OpenAPI import path.
//!
//! Projects and endpoints are the only persisted entities. Endpoint response
//! headers are kept as serialized JSON text; they are validated here, at the
//! boundary, and passed through untouched everywhere else.

use chrono::{DateTime, Utc};
use hyper::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Status used when a draft does not specify one.
pub const DEFAULT_STATUS: u16 = 200;

/// Longest accepted project name.
pub const MAX_PROJECT_NAME_LEN: usize = 255;

// ============================================================================
// Validation errors
// ============================================================================

/// Rejections raised before anything reaches the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("Response status {0} is outside 100-599")]
    StatusOutOfRange(u16),
    #[error("Invalid response headers: {0}")]
    InvalidHeaders(String),
    #[error("Response body is {size} bytes, limit is {limit}")]
    BodyTooLarge { size: usize, limit: usize },
    #[error("Invalid project name: {0}")]
    InvalidProjectName(&'static str),
}

// ============================================================================
// HTTP method
// ============================================================================

/// Standard HTTP verbs an endpoint can be declared for.
///
/// Parsing is case-insensitive; the canonical form is upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
        HttpMethod::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| ValidationError::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Route key
// ============================================================================

/// The (method, path) pair that must be unique within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub method: HttpMethod,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

// ============================================================================
// Persisted entities
// ============================================================================

/// A mock namespace addressed by its short public code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Immutable once assigned and unique across all projects.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A declarative mock response for one (method, path) of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    pub project_id: Uuid,
    pub method: HttpMethod,
    pub path: String,
    pub response_status: u16,
    pub response_body: String,
    /// Serialized JSON object of header name to value, or empty.
    pub response_headers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Endpoint {
    /// Build a fresh endpoint from a validated definition.
    pub fn create(project_id: Uuid, def: NewEndpoint, actor: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            method: def.method,
            path: def.path,
            response_status: def.response_status,
            response_body: def.response_body,
            response_headers: def.response_headers,
            created_by: actor.map(str::to_string),
            updated_by: actor.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn route(&self) -> RouteKey {
        RouteKey::new(self.method, self.path.clone())
    }

    pub fn is_route(&self, method: HttpMethod, path: &str) -> bool {
        self.method == method && self.path == path
    }

    /// Decode the stored header mapping.
    pub fn header_map(&self) -> Result<BTreeMap<String, String>, serde_json::Error> {
        decode_headers(&self.response_headers)
    }
}

// ============================================================================
// Drafts and validated definitions
// ============================================================================

/// Raw endpoint definition as supplied by a caller, before validation.
///
/// `response_headers` accepts either serialized JSON text or a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointDraft {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub response_body: String,
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub response_headers: String,
}

impl EndpointDraft {
    /// Validate and normalise into a definition the store accepts.
    pub fn validate(&self, max_body_bytes: usize) -> Result<NewEndpoint, ValidationError> {
        let method: HttpMethod = self.method.parse()?;
        let path = validate_path(&self.path)?;
        let response_status = validate_status(self.response_status.unwrap_or(DEFAULT_STATUS))?;
        validate_body(&self.response_body, max_body_bytes)?;
        let response_headers = validate_headers(&self.response_headers)?;

        Ok(NewEndpoint {
            method,
            path,
            response_status,
            response_body: self.response_body.clone(),
            response_headers,
        })
    }
}

/// A validated endpoint definition with a normalised path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub response_status: u16,
    pub response_body: String,
    pub response_headers: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EndpointPatch {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_headers")]
    pub response_headers: Option<String>,
}

impl EndpointPatch {
    /// Apply onto a copy of `current`, validating every changed field.
    pub fn apply(
        &self,
        current: &Endpoint,
        max_body_bytes: usize,
        actor: Option<&str>,
    ) -> Result<Endpoint, ValidationError> {
        let mut updated = current.clone();
        if let Some(method) = &self.method {
            updated.method = method.parse()?;
        }
        if let Some(path) = &self.path {
            updated.path = validate_path(path)?;
        }
        if let Some(status) = self.response_status {
            updated.response_status = validate_status(status)?;
        }
        if let Some(body) = &self.response_body {
            validate_body(body, max_body_bytes)?;
            updated.response_body = body.clone();
        }
        if let Some(headers) = &self.response_headers {
            updated.response_headers = validate_headers(headers)?;
        }
        if actor.is_some() {
            updated.updated_by = actor.map(str::to_string);
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }

    pub fn changes_route(&self, current: &Endpoint) -> bool {
        self.method.is_some() || self.path.as_deref().is_some_and(|p| p != current.path)
    }
}

// ============================================================================
// Field validation
// ============================================================================

/// Collapse repeated slashes and drop a trailing slash (except for the root).
///
/// Applied identically to stored paths, imported paths and request paths so
/// that they compare on equal terms.
pub fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    out.push('/');
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

pub fn validate_path(raw: &str) -> Result<String, ValidationError> {
    let invalid = |reason| ValidationError::InvalidPath {
        path: raw.to_string(),
        reason,
    };
    if !raw.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if raw.contains('?') || raw.contains('#') {
        return Err(invalid("must not contain a query string or fragment"));
    }
    Ok(normalize_path(raw))
}

pub fn validate_status(status: u16) -> Result<u16, ValidationError> {
    if (100..=599).contains(&status) {
        Ok(status)
    } else {
        Err(ValidationError::StatusOutOfRange(status))
    }
}

fn validate_body(body: &str, limit: usize) -> Result<(), ValidationError> {
    if body.len() > limit {
        return Err(ValidationError::BodyTooLarge {
            size: body.len(),
            limit,
        });
    }
    Ok(())
}

/// Check that headers are empty or a JSON object of valid HTTP header
/// names to string values. Returns the text unchanged (trimmed to empty if
/// blank).
pub fn validate_headers(raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    let map = decode_headers(raw).map_err(|e| ValidationError::InvalidHeaders(e.to_string()))?;
    for (name, value) in &map {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ValidationError::InvalidHeaders(format!("bad header name '{name}'")))?;
        HeaderValue::from_str(value).map_err(|_| {
            ValidationError::InvalidHeaders(format!("bad value for header '{name}'"))
        })?;
    }
    Ok(raw.to_string())
}

/// Decode serialized header text; blank text is an empty mapping.
pub fn decode_headers(raw: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(raw)
}

pub fn validate_project_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidProjectName("must not be empty"));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(ValidationError::InvalidProjectName("longer than 255 characters"));
    }
    Ok(name.to_string())
}

// ============================================================================
// Header field deserialization
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum HeadersInput {
    Text(String),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl HeadersInput {
    fn into_text(self) -> String {
        match self {
            HeadersInput::Text(text) => text,
            HeadersInput::Map(map) if map.is_empty() => String::new(),
            HeadersInput::Map(map) => serde_json::Value::Object(map).to_string(),
        }
    }
}

fn deserialize_headers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<HeadersInput>::deserialize(deserializer)?
        .map(HeadersInput::into_text)
        .unwrap_or_default())
}

fn deserialize_optional_headers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<HeadersInput>::deserialize(deserializer)?.map(HeadersInput::into_text))
}
