//! Request/response types and response helpers for the Admin API.

use crate::analysis::RouteWarning;
use crate::manager::ManagerError;
use crate::model::{Endpoint, EndpointDraft, Project};
use crate::reconcile::{CommitResult, ImportError, ImportPreview};
use crate::store::StoreError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Header carrying the authenticated caller, set by the layer in front of us.
pub const USER_HEADER: &str = "x-crudbox-user";

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Candidates the caller confirmed from a preview
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub endpoints: Vec<EndpointDraft>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct EndpointResponse {
    pub endpoint: Endpoint,
}

/// Endpoints in creation order with any route problems found among them
#[derive(Debug, Serialize)]
pub struct ListEndpointsResponse {
    pub endpoints: Vec<Endpoint>,
    pub warnings: Vec<RouteWarning>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub preview: ImportPreview,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub result: CommitResult,
    /// Present when a store failure cut the batch short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_str().to_string(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Request helpers
// =============================================================================

/// Extract base URL from request headers for links
pub fn get_base_url<B>(req: &Request<B>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:2525".to_string()
}

/// The caller identity forwarded by the authentication layer, if any.
pub fn caller<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Request body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("Failed to read request body: {0}")]
    Read(String),
}

/// Collect request body into bytes, refusing anything over `limit`.
pub async fn collect_body<B>(req: Request<B>, limit: usize) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(BodyError::TooLarge(limit)),
        Err(e) => Err(BodyError::Read(e.to_string())),
    }
}

/// Collect and decode a JSON request body.
pub async fn json_body<T, B>(req: Request<B>, limit: usize) -> Result<T, Response<Full<Bytes>>>
where
    T: for<'de> Deserialize<'de>,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = collect_body(req, limit)
        .await
        .map_err(|e| body_error_response(&e))?;
    serde_json::from_slice(&body).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("Invalid request JSON: {e}"),
        )
    })
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail::new(status, message)],
    };
    json_response(status, &error)
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

pub fn body_error_response(err: &BodyError) -> Response<Full<Bytes>> {
    match err {
        BodyError::TooLarge(_) => error_response(StatusCode::PAYLOAD_TOO_LARGE, &err.to_string()),
        BodyError::Read(_) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn store_error_response(err: &StoreError) -> Response<Full<Bytes>> {
    if err.is_conflict() {
        return error_response(StatusCode::CONFLICT, &err.to_string());
    }
    match err {
        StoreError::ProjectMissing(_) | StoreError::EndpointMissing(_) => {
            error_response(StatusCode::NOT_FOUND, &err.to_string())
        }
        _ => {
            error!("Store failure: {}", err);
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
    }
}

/// Map a management failure onto its HTTP status.
pub fn manager_error_response(err: &ManagerError) -> Response<Full<Bytes>> {
    let status = match err {
        ManagerError::Validation(_) => StatusCode::BAD_REQUEST,
        ManagerError::ProjectNotFound(_) | ManagerError::EndpointNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ManagerError::RouteConflict(_) => StatusCode::CONFLICT,
        ManagerError::CodeExhausted => {
            error!("{}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        ManagerError::Store(e) => return store_error_response(e),
    };
    error_response(status, &err.to_string())
}

pub fn import_error_response(err: &ImportError) -> Response<Full<Bytes>> {
    match err {
        ImportError::ProjectNotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        ImportError::Store(e) => store_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, RouteKey, ValidationError};
    use uuid::Uuid;

    #[test]
    fn test_error_response_format() {
        let resp = error_response(StatusCode::BAD_REQUEST, "Test error");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_not_found_response() {
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_caller_header() {
        let req = Request::builder()
            .header("X-Crudbox-User", " alice ")
            .body(())
            .unwrap();
        assert_eq!(caller(&req).as_deref(), Some("alice"));

        let blank = Request::builder()
            .header("X-Crudbox-User", "  ")
            .body(())
            .unwrap();
        assert_eq!(caller(&blank), None);
        assert_eq!(caller(&Request::new(())), None);
    }

    #[test]
    fn test_manager_error_statuses() {
        let cases = [
            (
                ManagerError::Validation(ValidationError::StatusOutOfRange(42)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ManagerError::ProjectNotFound(Uuid::new_v4()),
                StatusCode::NOT_FOUND,
            ),
            (
                ManagerError::RouteConflict(RouteKey::new(HttpMethod::Get, "/a")),
                StatusCode::CONFLICT,
            ),
            (ManagerError::CodeExhausted, StatusCode::SERVICE_UNAVAILABLE),
            (
                ManagerError::Store(StoreError::Unavailable("disk full".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(manager_error_response(&err).status(), status, "{err}");
        }
    }

    #[tokio::test]
    async fn test_collect_body_limit() {
        let req = Request::new(Full::new(Bytes::from_static(b"0123456789")));
        assert_eq!(collect_body(req, 64).await.unwrap().len(), 10);

        let req = Request::new(Full::new(Bytes::from_static(b"0123456789")));
        assert!(matches!(
            collect_body(req, 4).await,
            Err(BodyError::TooLarge(4))
        ));
    }
}
