//! Wiring: one store shared by the admin API and the mock listener.

use crate::admin_api::{AdminApiServer, AdminState};
use crate::analysis::analyze_endpoints;
use crate::config::Config;
use crate::locks::ProjectLocks;
use crate::manager::ProjectManager;
use crate::metrics;
use crate::reconcile::Reconciler;
use crate::serving::{MockEngine, MockServer};
use crate::store::{EndpointStore, InMemoryStore, SnapshotFile};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Both listeners bound and ready to accept
pub struct App {
    admin: AdminApiServer,
    mock: MockServer,
}

impl App {
    /// Open the store and bind both listeners.
    pub async fn bind(config: &Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let store = open_store(config)?;
        let locks = Arc::new(ProjectLocks::new());

        let state = Arc::new(AdminState {
            manager: Arc::new(ProjectManager::new(
                Arc::clone(&store),
                Arc::clone(&locks),
                config.projects.code_length,
                config.limits.max_response_body_bytes,
            )),
            reconciler: Arc::new(Reconciler::new(
                Arc::clone(&store),
                locks,
                config.limits.max_response_body_bytes,
            )),
            max_document_bytes: config.limits.max_document_bytes,
        });
        let engine = Arc::new(MockEngine::new(store));

        let admin = AdminApiServer::bind(config.admin.socket_addr(), state)
            .await
            .with_context(|| format!("failed to bind admin API on {}", config.admin.socket_addr()))?;
        let mock = MockServer::bind(config.mock.socket_addr(), engine)
            .await
            .with_context(|| format!("failed to bind mock listener on {}", config.mock.socket_addr()))?;

        Ok(Self { admin, mock })
    }

    pub fn admin_addr(&self) -> std::io::Result<SocketAddr> {
        self.admin.local_addr()
    }

    pub fn mock_addr(&self) -> std::io::Result<SocketAddr> {
        self.mock.local_addr()
    }

    /// Serve until either listener fails.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        tokio::select! {
            result = self.admin.run() => result,
            result = self.mock.run() => result,
        }
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn EndpointStore>, anyhow::Error> {
    let store = match &config.store.snapshot_path {
        Some(path) => {
            let store = InMemoryStore::with_snapshot(SnapshotFile::new(path))
                .with_context(|| format!("failed to load snapshot {}", path.display()))?;
            info!(path = %path.display(), "Using snapshot store");
            store
        }
        None => InMemoryStore::new(),
    };

    let projects = store.projects()?;
    metrics::set_projects_total(projects.len());
    for project in &projects {
        let endpoints = store.endpoints(project.id)?;
        for warning in analyze_endpoints(&endpoints) {
            warn!(project = %project.id, code = %project.code, "Loaded route warning: {}", warning.message);
        }
    }

    Ok(Arc::new(store))
}
