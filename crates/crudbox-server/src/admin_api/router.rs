//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{endpoints, imports, projects, system};
use crate::admin_api::types::{error_response, get_base_url, not_found};
use crate::admin_api::AdminState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Parsed route for project-specific endpoints
#[derive(Debug, PartialEq, Eq)]
enum ProjectRoute {
    /// GET/DELETE /projects/:id
    Root,
    /// GET/POST /projects/:id/endpoints
    Endpoints,
    /// GET/PUT/DELETE /projects/:id/endpoints/:endpoint_id
    EndpointById(Uuid),
    /// POST /projects/:id/imports/openapi
    ImportOpenApi,
    /// POST /projects/:id/imports/commit
    ImportCommit,
}

impl ProjectRoute {
    /// Parse route from path segments after `/projects/:id`
    fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            [] | [""] => Some(ProjectRoute::Root),
            ["endpoints"] => Some(ProjectRoute::Endpoints),
            ["endpoints", id] => id.parse().ok().map(ProjectRoute::EndpointById),
            ["imports", "openapi"] => Some(ProjectRoute::ImportOpenApi),
            ["imports", "commit"] => Some(ProjectRoute::ImportCommit),
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    state: Arc<AdminState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let base_url = get_base_url(&req);

    debug!("Admin API: {} {}", method, path);

    let response = route_by_path(&method, &path, req, &base_url, &state).await;
    Ok(response)
}

/// Route based on path
async fn route_by_path<B>(
    method: &Method,
    path: &str,
    req: Request<B>,
    base_url: &str,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // Fast path for common routes
    match (method, path) {
        (&Method::GET, "/") => return system::handle_root(base_url),
        (&Method::GET, "/health") => return system::handle_health(),
        (&Method::GET, "/metrics") => return system::handle_metrics(state),
        _ => {}
    }

    // Project collection routes
    if path == "/projects" || path == "/projects/" {
        return match *method {
            Method::GET => projects::handle_list(state),
            Method::POST => projects::handle_create(req, state).await,
            _ => not_found(),
        };
    }

    // Individual project routes
    if let Some(rest) = path.strip_prefix("/projects/") {
        return route_project(method, rest, req, state).await;
    }

    not_found()
}

/// Route project-specific requests
async fn route_project<B>(
    method: &Method,
    path: &str,
    req: Request<B>,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // Parse: id/remaining/path
    let segments: Vec<&str> = path.split('/').collect();

    let project_id: Uuid = match segments[0].parse() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid project id"),
    };

    let route = match ProjectRoute::parse(&segments[1..]) {
        Some(r) => r,
        None => return not_found(),
    };

    match (method, route) {
        // /projects/:id
        (&Method::GET, ProjectRoute::Root) => projects::handle_get(project_id, state),
        (&Method::DELETE, ProjectRoute::Root) => projects::handle_delete(project_id, state),

        // /projects/:id/endpoints
        (&Method::GET, ProjectRoute::Endpoints) => endpoints::handle_list(project_id, state),
        (&Method::POST, ProjectRoute::Endpoints) => {
            endpoints::handle_create(project_id, req, state).await
        }

        // /projects/:id/endpoints/:endpoint_id
        (&Method::GET, ProjectRoute::EndpointById(endpoint_id)) => {
            endpoints::handle_get(project_id, endpoint_id, state)
        }
        (&Method::PUT, ProjectRoute::EndpointById(endpoint_id)) => {
            endpoints::handle_update(project_id, endpoint_id, req, state).await
        }
        (&Method::DELETE, ProjectRoute::EndpointById(endpoint_id)) => {
            endpoints::handle_delete(project_id, endpoint_id, state)
        }

        // /projects/:id/imports/*
        (&Method::POST, ProjectRoute::ImportOpenApi) => {
            imports::handle_upload(project_id, req, state).await
        }
        (&Method::POST, ProjectRoute::ImportCommit) => {
            imports::handle_commit(project_id, req, state).await
        }

        _ => not_found(),
    }
}
