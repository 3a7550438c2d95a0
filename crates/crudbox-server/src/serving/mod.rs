//! Mock serving engine.
//!
//! Resolves a (project code, method, path) triple against the stored
//! endpoints and hands back the configured response verbatim. Serving never
//! writes to the store.

mod handler;
mod server;

pub use handler::handle_mock_request;
pub use server::MockServer;

use crate::matcher::best_match;
use crate::model::{normalize_path, HttpMethod};
use crate::store::{EndpointStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Response exactly as stored on the matched endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub endpoint_id: Uuid,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Result of resolving one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum ServeOutcome {
    Rendered(RenderedResponse),
    ProjectNotFound,
    RouteNotFound,
}

impl ServeOutcome {
    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ServeOutcome::Rendered(_) => "matched",
            ServeOutcome::ProjectNotFound => "project_not_found",
            ServeOutcome::RouteNotFound => "route_not_found",
        }
    }
}

/// Read-only resolver over an endpoint store.
pub struct MockEngine {
    store: Arc<dyn EndpointStore>,
}

impl MockEngine {
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self { store }
    }

    /// Resolve a request. Absence is an `Ok` outcome; only store failures
    /// are errors.
    pub fn serve(&self, code: &str, method: &str, path: &str) -> Result<ServeOutcome, StoreError> {
        let Some(project) = self.store.project_by_code(code)? else {
            debug!(code = %code, "Unknown project code");
            return Ok(ServeOutcome::ProjectNotFound);
        };

        // Non-standard verbs can never have been stored
        let Ok(method) = method.parse::<HttpMethod>() else {
            debug!(code = %code, method = %method, "Unsupported method");
            return Ok(ServeOutcome::RouteNotFound);
        };

        let path = normalize_path(path);
        let snapshot = match self.store.endpoints(project.id) {
            Ok(snapshot) => snapshot,
            // Deleted between the two reads
            Err(StoreError::ProjectMissing(_)) => return Ok(ServeOutcome::ProjectNotFound),
            Err(e) => return Err(e),
        };

        let Some(endpoint) = best_match(&snapshot, method, &path) else {
            debug!(code = %code, method = %method, path = %path, "No route matched");
            return Ok(ServeOutcome::RouteNotFound);
        };

        let headers = endpoint.header_map().unwrap_or_else(|e| {
            warn!(
                endpoint = %endpoint.id,
                "Stored response headers are not a string map, serving without them: {}", e
            );
            BTreeMap::new()
        });

        Ok(ServeOutcome::Rendered(RenderedResponse {
            endpoint_id: endpoint.id,
            status: endpoint.response_status,
            headers,
            body: endpoint.response_body.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Endpoint, EndpointDraft, Project};
    use crate::store::InMemoryStore;
    use chrono::Utc;

    pub(super) fn setup() -> (Arc<InMemoryStore>, Project) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let project = store
            .insert_project(Project {
                id: Uuid::new_v4(),
                name: "demo".to_string(),
                code: "ABC12".to_string(),
                created_by: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        (store, project)
    }

    pub(super) fn add(store: &InMemoryStore, project: &Project, draft: EndpointDraft) -> Endpoint {
        let def = draft.validate(usize::MAX).unwrap();
        store
            .insert_endpoint(Endpoint::create(project.id, def, None))
            .unwrap()
    }

    #[test]
    fn test_serves_stored_response() {
        let (store, project) = setup();
        add(
            &store,
            &project,
            EndpointDraft {
                method: "GET".to_string(),
                path: "/users".to_string(),
                response_body: r#"{"users":[]}"#.to_string(),
                ..Default::default()
            },
        );
        let engine = MockEngine::new(store);

        match engine.serve("ABC12", "GET", "/users").unwrap() {
            ServeOutcome::Rendered(response) => {
                assert_eq!(response.status, 200);
                assert_eq!(response.body, r#"{"users":[]}"#);
                assert!(response.headers.is_empty());
            }
            other => panic!("expected a rendered response, got {other:?}"),
        }
        assert_eq!(
            engine.serve("ABC12", "GET", "/unknown").unwrap(),
            ServeOutcome::RouteNotFound
        );
    }

    #[test]
    fn test_unknown_code_is_project_not_found() {
        let (store, _) = setup();
        let engine = MockEngine::new(store);
        assert_eq!(
            engine.serve("ZZZZZ", "GET", "/users").unwrap(),
            ServeOutcome::ProjectNotFound
        );
    }

    #[test]
    fn test_method_and_trailing_slash_are_normalised() {
        let (store, project) = setup();
        add(
            &store,
            &project,
            EndpointDraft {
                method: "POST".to_string(),
                path: "/orders".to_string(),
                response_status: Some(201),
                response_headers: r#"{"Location":"/orders/1"}"#.to_string(),
                ..Default::default()
            },
        );
        let engine = MockEngine::new(store);

        let ServeOutcome::Rendered(response) = engine.serve("ABC12", "post", "/orders/").unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(response.status, 201);
        assert_eq!(response.headers.get("Location").map(String::as_str), Some("/orders/1"));

        assert_eq!(
            engine.serve("ABC12", "PROPFIND", "/orders").unwrap(),
            ServeOutcome::RouteNotFound
        );
    }

    #[test]
    fn test_parameterised_route() {
        let (store, project) = setup();
        add(
            &store,
            &project,
            EndpointDraft {
                method: "GET".to_string(),
                path: "/users/{id}".to_string(),
                response_body: "one user".to_string(),
                ..Default::default()
            },
        );
        let engine = MockEngine::new(store);
        assert!(matches!(
            engine.serve("ABC12", "GET", "/users/42").unwrap(),
            ServeOutcome::Rendered(r) if r.body == "one user"
        ));
    }

    #[test]
    fn test_encoded_slash_stays_one_segment() {
        let (store, project) = setup();
        add(
            &store,
            &project,
            EndpointDraft {
                method: "GET".to_string(),
                path: "/files/{name}".to_string(),
                response_body: "file".to_string(),
                ..Default::default()
            },
        );
        let engine = MockEngine::new(store);
        assert!(matches!(
            engine.serve("ABC12", "GET", "/files/a%2Fb").unwrap(),
            ServeOutcome::Rendered(r) if r.body == "file"
        ));
        assert_eq!(
            engine.serve("ABC12", "GET", "/files/a/b").unwrap(),
            ServeOutcome::RouteNotFound
        );
    }
}
