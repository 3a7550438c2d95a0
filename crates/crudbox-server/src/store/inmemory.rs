use super::snapshot::{Snapshot, SnapshotFile};
use super::{EndpointSnapshot, EndpointStore, StoreError};
use crate::model::{Endpoint, Project};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct StoreState {
    /// Creation order
    projects: Vec<Project>,
    /// Copy-on-write so readers can hold a snapshot without the lock
    endpoints: HashMap<Uuid, EndpointSnapshot>,
}

impl StoreState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = StoreState::default();
        for project in snapshot.projects {
            state.endpoints.insert(project.id, Arc::new(Vec::new()));
            state.projects.push(project);
        }
        for endpoint in snapshot.endpoints {
            match state.endpoints.get_mut(&endpoint.project_id) {
                Some(list) => Arc::make_mut(list).push(endpoint),
                None => warn!(
                    endpoint = %endpoint.id,
                    project = %endpoint.project_id,
                    "Dropping snapshot endpoint of unknown project"
                ),
            }
        }
        state
    }

    fn to_snapshot(&self) -> Snapshot {
        let endpoints = self
            .projects
            .iter()
            .filter_map(|p| self.endpoints.get(&p.id))
            .flat_map(|list| list.iter().cloned())
            .collect();
        Snapshot::new(self.projects.clone(), endpoints)
    }

    fn endpoints_mut(&mut self, project_id: Uuid) -> Result<&mut Vec<Endpoint>, StoreError> {
        self.endpoints
            .get_mut(&project_id)
            .map(Arc::make_mut)
            .ok_or(StoreError::ProjectMissing(project_id))
    }
}

/// In-memory store with optional JSON snapshot durability.
///
/// Useful for tests, development and single-instance deployments. When a
/// snapshot file is configured every mutation is written through before it
/// is acknowledged; a failed write discards the mutation. The disk write
/// happens outside the state lock, so readers only wait for the final swap.
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    snapshot: Option<SnapshotFile>,
    /// Held by snapshot writers from clone to swap
    persist: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot: None,
            persist: Mutex::new(()),
        }
    }

    /// Open a store backed by `file`, loading its current contents.
    pub fn with_snapshot(file: SnapshotFile) -> Result<Self, StoreError> {
        let state = file
            .load()?
            .map(StoreState::from_snapshot)
            .unwrap_or_default();
        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some(file),
            persist: Mutex::new(()),
        })
    }

    /// Apply a mutation and persist the result.
    ///
    /// With a snapshot the mutation runs on a copy of the state. The copy is
    /// written to disk and only then swapped in under the write lock.
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let Some(file) = &self.snapshot else {
            return apply(&mut self.state.write());
        };

        let _writer = self.persist.lock();
        // Endpoint lists are shared, only the project vector is copied
        let mut next = self.state.read().clone();
        let value = apply(&mut next)?;
        if let Err(e) = file.save(&next.to_snapshot()) {
            error!("Snapshot write failed, discarding mutation: {}", e);
            return Err(e);
        }
        *self.state.write() = next;
        Ok(value)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointStore for InMemoryStore {
    fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        self.mutate(|state| {
            if state.projects.iter().any(|p| p.code == project.code) {
                return Err(StoreError::CodeConflict(project.code.clone()));
            }
            state.endpoints.insert(project.id, Arc::new(Vec::new()));
            state.projects.push(project.clone());
            Ok(project)
        })
    }

    fn project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let state = self.state.read();
        Ok(state.projects.iter().find(|p| p.id == id).cloned())
    }

    fn project_by_code(&self, code: &str) -> Result<Option<Project>, StoreError> {
        let state = self.state.read();
        Ok(state.projects.iter().find(|p| p.code == code).cloned())
    }

    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.state.read().projects.clone())
    }

    fn remove_project(&self, id: Uuid) -> Result<Project, StoreError> {
        self.mutate(|state| {
            let index = state
                .projects
                .iter()
                .position(|p| p.id == id)
                .ok_or(StoreError::ProjectMissing(id))?;
            state.endpoints.remove(&id);
            Ok(state.projects.remove(index))
        })
    }

    fn endpoints(&self, project_id: Uuid) -> Result<EndpointSnapshot, StoreError> {
        let state = self.state.read();
        state
            .endpoints
            .get(&project_id)
            .cloned()
            .ok_or(StoreError::ProjectMissing(project_id))
    }

    fn insert_endpoint(&self, endpoint: Endpoint) -> Result<Endpoint, StoreError> {
        self.mutate(|state| {
            let list = state.endpoints_mut(endpoint.project_id)?;
            if list.iter().any(|e| e.is_route(endpoint.method, &endpoint.path)) {
                return Err(StoreError::RouteConflict {
                    project_id: endpoint.project_id,
                    route: endpoint.route(),
                });
            }
            list.push(endpoint.clone());
            Ok(endpoint)
        })
    }

    fn replace_endpoint(&self, endpoint: Endpoint) -> Result<Endpoint, StoreError> {
        self.mutate(|state| {
            let list = state.endpoints_mut(endpoint.project_id)?;
            let index = list
                .iter()
                .position(|e| e.id == endpoint.id)
                .ok_or(StoreError::EndpointMissing(endpoint.id))?;
            let taken = list
                .iter()
                .any(|e| e.id != endpoint.id && e.is_route(endpoint.method, &endpoint.path));
            if taken {
                return Err(StoreError::RouteConflict {
                    project_id: endpoint.project_id,
                    route: endpoint.route(),
                });
            }
            list[index] = endpoint.clone();
            Ok(endpoint)
        })
    }

    fn remove_endpoint(
        &self,
        project_id: Uuid,
        endpoint_id: Uuid,
    ) -> Result<Endpoint, StoreError> {
        self.mutate(|state| {
            let list = state.endpoints_mut(project_id)?;
            let index = list
                .iter()
                .position(|e| e.id == endpoint_id)
                .ok_or(StoreError::EndpointMissing(endpoint_id))?;
            Ok(list.remove(index))
        })
    }
}
