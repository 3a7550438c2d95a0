//! OpenAPI document extraction.
//!
//! Turns an uploaded OpenAPI 3.x (or Swagger 2.0) document into a flat,
//! ordered list of operation records with default responses. No schema
//! validation is performed beyond what is needed to find operations.

mod document;
mod example;
mod extract;


pub use extract::extract;

use crate::model::{EndpointDraft, HttpMethod, RouteKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Content types accepted for document uploads.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/yaml",
    "application/x-yaml",
    "text/yaml",
    "text/x-yaml",
    "application/json",
    "application/vnd.oai.openapi",
    "application/vnd.oai.openapi+json",
    "text/plain",
    "application/octet-stream",
];

/// Whether an upload with this content type may be handed to [`extract`].
///
/// A missing content type is accepted.
pub fn is_accepted_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    essence.is_empty() || ACCEPTED_CONTENT_TYPES.contains(&essence.as_str())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Document is not valid YAML or JSON: {0}")]
    Syntax(String),
    #[error("Document root must be a mapping")]
    NotAMapping,
}

/// One operation found in a document, with its proposed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub method: HttpMethod,
    /// Normalised path template, e.g. `/users/{id}`
    pub path: String,
    pub response_status: u16,
    pub response_body: String,
    pub response_headers: BTreeMap<String, String>,
}

impl OperationRecord {
    pub fn route(&self) -> RouteKey {
        RouteKey::new(self.method, self.path.clone())
    }

    /// The endpoint definition a commit would create for this operation.
    pub fn to_draft(&self) -> EndpointDraft {
        let response_headers = if self.response_headers.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&self.response_headers).unwrap_or_default()
        };
        EndpointDraft {
            method: self.method.to_string(),
            path: self.path.clone(),
            response_status: Some(self.response_status),
            response_body: self.response_body.clone(),
            response_headers,
        }
    }
}
