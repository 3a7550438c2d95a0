//! OpenAPI import handlers: upload for preview, then commit.

use crate::admin_api::types::{
    body_error_response, caller, collect_body, error_response, import_error_response, json_body,
    json_response, manager_error_response, CommitRequest, CommitResponse, ErrorDetail,
    PreviewResponse,
};
use crate::admin_api::AdminState;
use crate::openapi::{extract, is_accepted_content_type};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};
use uuid::Uuid;

/// POST /projects/:id/imports/openapi - Classify a document's operations
pub async fn handle_upload<B>(
    project_id: Uuid,
    req: Request<B>,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or("<invalid>").to_string());
    if !is_accepted_content_type(content_type.as_deref()) {
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            &format!(
                "Unsupported content type '{}' for an OpenAPI document",
                content_type.unwrap_or_default()
            ),
        );
    }

    if let Err(e) = state.manager.project(project_id) {
        return manager_error_response(&e);
    }

    let body = match collect_body(req, state.max_document_bytes).await {
        Ok(b) => b,
        Err(e) => return body_error_response(&e),
    };

    let operations = match extract(&body) {
        Ok(ops) => ops,
        Err(e) => {
            info!(project = %project_id, "Rejected OpenAPI upload: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid OpenAPI document: {e}"),
            );
        }
    };

    match state.reconciler.preview(project_id, operations) {
        Ok(preview) => json_response(StatusCode::OK, &PreviewResponse { preview }),
        Err(e) => import_error_response(&e),
    }
}

/// POST /projects/:id/imports/commit - Create the confirmed candidates
pub async fn handle_commit<B>(
    project_id: Uuid,
    req: Request<B>,
    state: &AdminState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = caller(&req);
    let commit: CommitRequest = match json_body(req, state.max_document_bytes).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if commit.endpoints.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No endpoints provided");
    }

    match state
        .reconciler
        .commit(project_id, &commit.endpoints, actor.as_deref())
    {
        Ok(result) => match result.failure.clone() {
            None => json_response(
                StatusCode::OK,
                &CommitResponse {
                    result,
                    errors: None,
                },
            ),
            Some(failure) => {
                warn!(
                    project = %project_id,
                    not_attempted = result.not_attempted.len(),
                    "Import commit cut short"
                );
                let status = StatusCode::SERVICE_UNAVAILABLE;
                json_response(
                    status,
                    &CommitResponse {
                        result,
                        errors: Some(vec![ErrorDetail::new(status, failure)]),
                    },
                )
            }
        },
        Err(e) => import_error_response(&e),
    }
}
