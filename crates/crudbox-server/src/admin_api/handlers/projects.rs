//! Project management handlers.

use crate::admin_api::types::{
    caller, json_body, json_response, manager_error_response, CreateProjectRequest,
    ListProjectsResponse, ProjectResponse,
};
use crate::admin_api::AdminState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use uuid::Uuid;

/// GET /projects - List projects in creation order
pub fn handle_list(state: &AdminState) -> Response<Full<Bytes>> {
    match state.manager.projects() {
        Ok(projects) => json_response(StatusCode::OK, &ListProjectsResponse { projects }),
        Err(e) => manager_error_response(&e),
    }
}

/// POST /projects - Create a project with a fresh code
pub async fn handle_create<B>(req: Request<B>, state: &AdminState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = caller(&req);
    let create: CreateProjectRequest = match json_body(req, state.max_document_bytes).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.manager.create_project(&create.name, actor.as_deref()) {
        Ok(project) => json_response(StatusCode::CREATED, &ProjectResponse { project }),
        Err(e) => manager_error_response(&e),
    }
}

/// GET /projects/:id
pub fn handle_get(id: Uuid, state: &AdminState) -> Response<Full<Bytes>> {
    match state.manager.project(id) {
        Ok(project) => json_response(StatusCode::OK, &ProjectResponse { project }),
        Err(e) => manager_error_response(&e),
    }
}

/// DELETE /projects/:id - Delete a project and all its endpoints
pub fn handle_delete(id: Uuid, state: &AdminState) -> Response<Full<Bytes>> {
    match state.manager.delete_project(id) {
        Ok(project) => json_response(StatusCode::OK, &ProjectResponse { project }),
        Err(e) => manager_error_response(&e),
    }
}
