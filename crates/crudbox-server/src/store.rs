//! Durable keyed storage for projects and their endpoints.
//!
//! The store carries no business logic. It does own the two uniqueness
//! guarantees everything else relies on: project codes are globally unique
//! and (method, path) is unique within a project. Both are checked inside
//! the store's own write scope, so concurrent writers cannot both succeed.

mod inmemory;
mod snapshot;

pub use inmemory::InMemoryStore;
pub use snapshot::{Snapshot, SnapshotFile};

use crate::model::{Endpoint, Project, RouteKey};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Immutable view of a project's endpoints in creation order.
pub type EndpointSnapshot = Arc<Vec<Endpoint>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{route} already exists in project {project_id}")]
    RouteConflict { project_id: Uuid, route: RouteKey },
    #[error("Project code '{0}' is already taken")]
    CodeConflict(String),
    #[error("Project {0} not found")]
    ProjectMissing(Uuid),
    #[error("Endpoint {0} not found")]
    EndpointMissing(Uuid),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Conflicts are ordinary outcomes; everything else is a failure of the
    /// request or of the store itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::RouteConflict { .. } | StoreError::CodeConflict(_)
        )
    }
}

/// Backend-agnostic storage contract.
///
/// Synchronous on purpose: every implementation is expected to answer from
/// memory or a local file, and callers hold per-project locks around writes.
pub trait EndpointStore: Send + Sync {
    /// Insert a project; fails with `CodeConflict` if its code is taken.
    fn insert_project(&self, project: Project) -> Result<Project, StoreError>;

    fn project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    fn project_by_code(&self, code: &str) -> Result<Option<Project>, StoreError>;

    /// All projects in creation order.
    fn projects(&self) -> Result<Vec<Project>, StoreError>;

    /// Remove a project together with all of its endpoints.
    fn remove_project(&self, id: Uuid) -> Result<Project, StoreError>;

    /// Consistent snapshot of a project's endpoints in creation order.
    fn endpoints(&self, project_id: Uuid) -> Result<EndpointSnapshot, StoreError>;

    /// Append an endpoint; fails with `RouteConflict` if the project already
    /// has one for the same (method, path).
    fn insert_endpoint(&self, endpoint: Endpoint) -> Result<Endpoint, StoreError>;

    /// Replace an endpoint in place, keeping its creation position.
    fn replace_endpoint(&self, endpoint: Endpoint) -> Result<Endpoint, StoreError>;

    fn remove_endpoint(&self, project_id: Uuid, endpoint_id: Uuid)
        -> Result<Endpoint, StoreError>;
}
