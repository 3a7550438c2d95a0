//! Endpoint management handlers.

use crate::admin_api::types::{
    caller, json_body, json_response, manager_error_response, EndpointResponse,
    ListEndpointsResponse,
};
use crate::admin_api::AdminState;
use crate::analysis::analyze_endpoints;
use crate::model::{EndpointDraft, EndpointPatch};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use uuid::Uuid;

/// GET /projects/:id/endpoints - Endpoints plus route warnings
pub fn handle_list(project_id: Uuid, state: &AdminState) -> Response<Full<Bytes>> {
    match state.manager.endpoints(project_id) {
        Ok(endpoints) => {
            let warnings = analyze_endpoints(&endpoints);
            json_response(
                StatusCode::OK,
                &ListEndpointsResponse {
                    endpoints: endpoints.to_vec(),
                    warnings,
                },
            )
        }
        Err(e) => manager_error_response(&e),
    }
}

/// POST /projects/:id/endpoints
pub async fn handle_create<B>(
    project_id: Uuid,
    req: Request<B>,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = caller(&req);
    let draft: EndpointDraft = match json_body(req, state.max_document_bytes).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match state
        .manager
        .create_endpoint(project_id, &draft, actor.as_deref())
    {
        Ok(endpoint) => json_response(StatusCode::CREATED, &EndpointResponse { endpoint }),
        Err(e) => manager_error_response(&e),
    }
}

/// GET /projects/:id/endpoints/:endpoint_id
pub fn handle_get(project_id: Uuid, endpoint_id: Uuid, state: &AdminState) -> Response<Full<Bytes>> {
    match state.manager.endpoint(project_id, endpoint_id) {
        Ok(endpoint) => json_response(StatusCode::OK, &EndpointResponse { endpoint }),
        Err(e) => manager_error_response(&e),
    }
}

/// PUT /projects/:id/endpoints/:endpoint_id - Partial update
pub async fn handle_update<B>(
    project_id: Uuid,
    endpoint_id: Uuid,
    req: Request<B>,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = caller(&req);
    let patch: EndpointPatch = match json_body(req, state.max_document_bytes).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match state
        .manager
        .update_endpoint(project_id, endpoint_id, &patch, actor.as_deref())
    {
        Ok(endpoint) => json_response(StatusCode::OK, &EndpointResponse { endpoint }),
        Err(e) => manager_error_response(&e),
    }
}

/// DELETE /projects/:id/endpoints/:endpoint_id
pub fn handle_delete(
    project_id: Uuid,
    endpoint_id: Uuid,
    state: &AdminState,
) -> Response<Full<Bytes>> {
    match state.manager.delete_endpoint(project_id, endpoint_id) {
        Ok(endpoint) => json_response(StatusCode::OK, &EndpointResponse { endpoint }),
        Err(e) => manager_error_response(&e),
    }
}
