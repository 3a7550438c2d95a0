//! ProjectManager - project and endpoint lifecycle on top of the store.
//!
//! Validation happens here, before anything reaches the store. Endpoint
//! writes run inside the project's lock shared with import commits.

use crate::analysis::log_introduced_warnings;
use crate::locks::ProjectLocks;
use crate::metrics;
use crate::model::{
    validate_project_name, Endpoint, EndpointDraft, EndpointPatch, Project, RouteKey,
    ValidationError,
};
use crate::store::{EndpointSnapshot, EndpointStore, StoreError};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Codes tried before giving up on allocation.
const MAX_CODE_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),
    #[error("Endpoint {0} not found")]
    EndpointNotFound(Uuid),
    #[error("{0} already exists in this project")]
    RouteConflict(RouteKey),
    #[error("Could not allocate a unique project code")]
    CodeExhausted,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectMissing(id) => ManagerError::ProjectNotFound(id),
            StoreError::EndpointMissing(id) => ManagerError::EndpointNotFound(id),
            StoreError::RouteConflict { route, .. } => ManagerError::RouteConflict(route),
            other => ManagerError::Store(other),
        }
    }
}

/// Manages projects and their endpoints
pub struct ProjectManager {
    store: Arc<dyn EndpointStore>,
    locks: Arc<ProjectLocks>,
    code_length: usize,
    max_body_bytes: usize,
}

impl ProjectManager {
    pub fn new(
        store: Arc<dyn EndpointStore>,
        locks: Arc<ProjectLocks>,
        code_length: usize,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            locks,
            code_length,
            max_body_bytes,
        }
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Create a project with a freshly allocated public code.
    pub fn create_project(&self, name: &str, actor: Option<&str>) -> Result<Project, ManagerError> {
        let name = validate_project_name(name)?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(self.code_length);
            if self.store.project_by_code(&code)?.is_some() {
                continue;
            }
            let now = Utc::now();
            let project = Project {
                id: Uuid::new_v4(),
                name: name.clone(),
                code,
                created_by: actor.map(str::to_string),
                created_at: now,
                updated_at: now,
            };
            match self.store.insert_project(project) {
                Ok(project) => {
                    info!(project = %project.id, code = %project.code, "Project created");
                    self.refresh_project_gauge();
                    return Ok(project);
                }
                Err(StoreError::CodeConflict(code)) => {
                    debug!(code = %code, "Project code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!("Gave up allocating a project code after {} attempts", MAX_CODE_ATTEMPTS);
        Err(ManagerError::CodeExhausted)
    }

    pub fn projects(&self) -> Result<Vec<Project>, ManagerError> {
        Ok(self.store.projects()?)
    }

    pub fn project(&self, id: Uuid) -> Result<Project, ManagerError> {
        self.store
            .project(id)?
            .ok_or(ManagerError::ProjectNotFound(id))
    }

    /// Delete a project and every endpoint it owns.
    pub fn delete_project(&self, id: Uuid) -> Result<Project, ManagerError> {
        let project = self.locks.with(id, || self.store.remove_project(id))?;
        self.locks.forget(id);
        info!(project = %id, code = %project.code, "Project deleted");
        self.refresh_project_gauge();
        Ok(project)
    }

    fn refresh_project_gauge(&self) {
        if let Ok(projects) = self.store.projects() {
            metrics::set_projects_total(projects.len());
        }
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    pub fn endpoints(&self, project_id: Uuid) -> Result<EndpointSnapshot, ManagerError> {
        Ok(self.store.endpoints(project_id)?)
    }

    pub fn endpoint(&self, project_id: Uuid, endpoint_id: Uuid) -> Result<Endpoint, ManagerError> {
        self.endpoints(project_id)?
            .iter()
            .find(|e| e.id == endpoint_id)
            .cloned()
            .ok_or(ManagerError::EndpointNotFound(endpoint_id))
    }

    pub fn create_endpoint(
        &self,
        project_id: Uuid,
        draft: &EndpointDraft,
        actor: Option<&str>,
    ) -> Result<Endpoint, ManagerError> {
        let def = draft.validate(self.max_body_bytes)?;

        let endpoint = self.locks.with(project_id, || {
            self.store
                .insert_endpoint(Endpoint::create(project_id, def, actor))
        })?;

        info!(
            project = %project_id,
            method = %endpoint.method,
            path = %endpoint.path,
            "Endpoint created"
        );
        self.log_warnings(project_id, endpoint.id);
        Ok(endpoint)
    }

    /// Apply a partial update. Keeping the same (method, path) never
    /// conflicts with the endpoint itself.
    pub fn update_endpoint(
        &self,
        project_id: Uuid,
        endpoint_id: Uuid,
        patch: &EndpointPatch,
        actor: Option<&str>,
    ) -> Result<Endpoint, ManagerError> {
        let (updated, moved) = self.locks.with(project_id, || {
            let current = self.endpoint(project_id, endpoint_id)?;
            let updated = patch.apply(&current, self.max_body_bytes, actor)?;
            let moved = patch.changes_route(&current);
            Ok::<_, ManagerError>((self.store.replace_endpoint(updated)?, moved))
        })?;

        info!(
            project = %project_id,
            endpoint = %endpoint_id,
            method = %updated.method,
            path = %updated.path,
            "Endpoint updated"
        );
        if moved {
            self.log_warnings(project_id, updated.id);
        }
        Ok(updated)
    }

    pub fn delete_endpoint(&self, project_id: Uuid, endpoint_id: Uuid) -> Result<Endpoint, ManagerError> {
        let removed = self
            .locks
            .with(project_id, || self.store.remove_endpoint(project_id, endpoint_id))?;
        info!(
            project = %project_id,
            method = %removed.method,
            path = %removed.path,
            "Endpoint deleted"
        );
        Ok(removed)
    }

    fn log_warnings(&self, project_id: Uuid, endpoint_id: Uuid) {
        if let Ok(endpoints) = self.store.endpoints(project_id) {
            log_introduced_warnings(&endpoints, &HashSet::from([endpoint_id]));
        }
    }
}

/// Random code over `[a-zA-Z0-9]`.
pub fn generate_code(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn manager() -> ProjectManager {
        ProjectManager::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ProjectLocks::new()),
            5,
            1024,
        )
    }

    fn draft(method: &str, path: &str) -> EndpointDraft {
        EndpointDraft {
            method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_code() {
        let code = generate_code(5);
        assert_eq!(code.len(), 5);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(generate_code(12).len(), 12);
    }

    #[test]
    fn test_create_project() {
        let manager = manager();
        let project = manager.create_project("  Demo API ", Some("alice")).unwrap();
        assert_eq!(project.name, "Demo API");
        assert_eq!(project.code.len(), 5);
        assert_eq!(project.created_by.as_deref(), Some("alice"));
        assert_eq!(manager.project(project.id).unwrap(), project);

        assert!(matches!(
            manager.create_project("   ", None),
            Err(ManagerError::Validation(ValidationError::InvalidProjectName(_)))
        ));
    }

    #[test]
    fn test_codes_are_unique() {
        let manager = manager();
        let codes: HashSet<String> = (0..50)
            .map(|i| manager.create_project(&format!("p{i}"), None).unwrap().code)
            .collect();
        assert_eq!(codes.len(), 50);
    }

    #[test]
    fn test_endpoint_crud() {
        let manager = manager();
        let project = manager.create_project("crud", None).unwrap();

        let created = manager
            .create_endpoint(project.id, &draft("get", "/users/"), Some("alice"))
            .unwrap();
        assert_eq!(created.path, "/users");
        assert_eq!(created.response_status, 200);

        let conflict = manager.create_endpoint(project.id, &draft("GET", "/users"), None);
        assert!(matches!(conflict, Err(ManagerError::RouteConflict(_))));

        let patch = EndpointPatch {
            response_status: Some(202),
            ..Default::default()
        };
        let updated = manager
            .update_endpoint(project.id, created.id, &patch, Some("bob"))
            .unwrap();
        assert_eq!(updated.response_status, 202);
        assert_eq!(updated.updated_by.as_deref(), Some("bob"));

        manager.delete_endpoint(project.id, created.id).unwrap();
        assert!(matches!(
            manager.endpoint(project.id, created.id),
            Err(ManagerError::EndpointNotFound(_))
        ));
    }

    #[test]
    fn test_update_cannot_steal_route() {
        let manager = manager();
        let project = manager.create_project("steal", None).unwrap();
        let a = manager.create_endpoint(project.id, &draft("GET", "/a"), None).unwrap();
        manager.create_endpoint(project.id, &draft("GET", "/b"), None).unwrap();

        let patch = EndpointPatch {
            path: Some("/b".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            manager.update_endpoint(project.id, a.id, &patch, None),
            Err(ManagerError::RouteConflict(_))
        ));

        let bad = EndpointPatch {
            response_status: Some(42),
            ..Default::default()
        };
        assert!(matches!(
            manager.update_endpoint(project.id, a.id, &bad, None),
            Err(ManagerError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_project_cascades() {
        let manager = manager();
        let project = manager.create_project("gone", None).unwrap();
        manager.create_endpoint(project.id, &draft("GET", "/a"), None).unwrap();

        manager.delete_project(project.id).unwrap();
        assert!(matches!(
            manager.project(project.id),
            Err(ManagerError::ProjectNotFound(_))
        ));
        assert!(matches!(
            manager.endpoints(project.id),
            Err(ManagerError::ProjectNotFound(_))
        ));
        assert!(matches!(
            manager.delete_project(project.id),
            Err(ManagerError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_body_limit_is_enforced() {
        let manager = manager();
        let project = manager.create_project("limits", None).unwrap();
        let mut big = draft("POST", "/upload");
        big.response_body = "x".repeat(2048);
        assert!(matches!(
            manager.create_endpoint(project.id, &big, None),
            Err(ManagerError::Validation(ValidationError::BodyTooLarge { .. }))
        ));
    }
}
