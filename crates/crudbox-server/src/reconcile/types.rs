//! Preview and commit result types.

use crate::model::{Endpoint, EndpointDraft};
use crate::openapi::OperationRecord;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const REASON_EXISTING: &str = "endpoint already defined";
pub const REASON_DUPLICATE_IN_FILE: &str = "duplicate of an earlier operation in this file";
pub const REASON_ALREADY_EXISTS: &str = "endpoint already exists";
pub const REASON_DUPLICATE_IN_REQUEST: &str = "duplicate of an earlier operation in this request";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),
    #[error(transparent)]
    Store(StoreError),
}

impl ImportError {
    pub(super) fn from_store(project_id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::ProjectMissing(_) => ImportError::ProjectNotFound(project_id),
            other => ImportError::Store(other),
        }
    }
}

/// How an extracted operation relates to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    New,
    Existing,
    Duplicate,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::New => "new",
            Classification::Existing => "existing",
            Classification::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedOperation {
    #[serde(flatten)]
    pub operation: OperationRecord,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Advisory classification of a document against a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub total_count: usize,
    pub new_count: usize,
    pub existing_count: usize,
    pub duplicate_count: usize,
    pub operations: Vec<ClassifiedOperation>,
}

impl ImportPreview {
    /// Drafts for the operations classified `new`, in document order.
    pub fn new_drafts(&self) -> Vec<EndpointDraft> {
        self.operations
            .iter()
            .filter(|op| op.classification == Classification::New)
            .map(|op| op.operation.to_draft())
            .collect()
    }
}

/// A commit candidate identified by what the caller sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef {
    pub method: String,
    pub path: String,
}

impl From<&EndpointDraft> for EndpointRef {
    fn from(draft: &EndpointDraft) -> Self {
        Self {
            method: draft.method.clone(),
            path: draft.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEndpoint {
    pub method: String,
    pub path: String,
    pub reason: String,
}

/// Per-item outcome of a best-effort bulk create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub created: Vec<Endpoint>,
    pub skipped: Vec<SkippedEndpoint>,
    /// Candidates left unprocessed after a store failure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_attempted: Vec<EndpointRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl CommitResult {
    /// Everything was created.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failure.is_none()
    }
}
