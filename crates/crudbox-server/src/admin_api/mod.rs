//! Admin REST API for crudbox project and endpoint management.
//!
//! This module provides a JSON REST API for:
//! - Creating, listing, and deleting projects
//! - Managing endpoints within a project
//! - Uploading OpenAPI documents for preview and committing the result
//! - Health and metrics endpoints
//!
//! The API listens on a configurable port (default: 2525).

mod handlers;
mod router;
mod server;
pub(crate) mod types;

pub use router::route_request;
pub use server::AdminApiServer;

use crate::manager::ProjectManager;
use crate::reconcile::Reconciler;
use std::sync::Arc;

/// Everything the admin handlers need, shared across connections.
pub struct AdminState {
    pub manager: Arc<ProjectManager>,
    pub reconciler: Arc<Reconciler>,
    /// Upper bound for any request body, OpenAPI documents included
    pub max_document_bytes: usize,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::locks::ProjectLocks;
    use crate::store::{EndpointStore, InMemoryStore};

    pub(crate) fn state() -> AdminState {
        let store: Arc<dyn EndpointStore> = Arc::new(InMemoryStore::new());
        let locks = Arc::new(ProjectLocks::new());
        AdminState {
            manager: Arc::new(ProjectManager::new(
                Arc::clone(&store),
                Arc::clone(&locks),
                5,
                64 * 1024,
            )),
            reconciler: Arc::new(Reconciler::new(store, locks, 64 * 1024)),
            max_document_bytes: 64 * 1024,
        }
    }
}
