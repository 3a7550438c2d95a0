//! HTTP glue between hyper and the mock engine.

use super::{MockEngine, RenderedResponse, ServeOutcome};
use crate::admin_api::types::{build_response, error_response, not_found};
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Handle a request on the mock listener.
///
/// The request body is never read; matching uses only method and path.
pub async fn handle_mock_request<B>(
    req: Request<B>,
    engine: Arc<MockEngine>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().as_str();
    let raw_path = req.uri().path();

    let (outcome, response) = match split_mock_path(raw_path) {
        None => ("project_not_found", not_found()),
        Some((code, path)) => match engine.serve(code, method, &path) {
            Ok(outcome) => {
                let label = outcome.label();
                match outcome {
                    ServeOutcome::Rendered(rendered) => (label, render(rendered)),
                    ServeOutcome::ProjectNotFound => {
                        info!(code = %code, method = %method, path = %path, outcome = label, "Mock request for unknown project");
                        (label, not_found())
                    }
                    ServeOutcome::RouteNotFound => {
                        info!(code = %code, method = %method, path = %path, outcome = label, "Mock request matched no route");
                        (label, not_found())
                    }
                }
            }
            Err(e) => {
                error!(code = %code, method = %method, path = %path, "Store failure while serving: {}", e);
                (
                    "error",
                    error_response(StatusCode::SERVICE_UNAVAILABLE, "Store unavailable"),
                )
            }
        },
    };

    metrics::record_mock_request(outcome, started.elapsed().as_secs_f64() * 1000.0);
    Ok(response)
}

/// Split `/{code}/{path...}` into the project code and the decoded path.
///
/// `/{code}` alone addresses the project root `/`. Segments are decoded one
/// at a time; a decoded `/` is kept as `%2F` so segment boundaries survive.
pub fn split_mock_path(raw: &str) -> Option<(&str, String)> {
    let trimmed = raw.strip_prefix('/').unwrap_or(raw);
    let (code, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    if code.is_empty() {
        return None;
    }
    let segments: Vec<String> = rest.split('/').map(decode_segment).collect();
    Some((code, format!("/{}", segments.join("/"))))
}

fn decode_segment(segment: &str) -> String {
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    if decoded.contains('/') {
        decoded.replace('/', "%2F")
    } else {
        decoded.into_owned()
    }
}

fn render(rendered: RenderedResponse) -> Response<Full<Bytes>> {
    // Stored statuses are validated to 100..=599
    let status = StatusCode::from_u16(rendered.status).unwrap_or(StatusCode::OK);
    let mut response = build_response(status, rendered.body);
    let headers = response.headers_mut();

    for (name, value) in &rendered.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(
                endpoint = %rendered.endpoint_id,
                header = %name,
                "Skipping invalid stored header"
            ),
        }
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn test_split_mock_path() {
        assert_eq!(split_mock_path("/ABC12/users"), Some(("ABC12", "/users".to_string())));
        assert_eq!(split_mock_path("/ABC12"), Some(("ABC12", "/".to_string())));
        assert_eq!(split_mock_path("/ABC12/"), Some(("ABC12", "/".to_string())));
        assert_eq!(
            split_mock_path("/ABC12/files/a%20b"),
            Some(("ABC12", "/files/a b".to_string()))
        );
        assert_eq!(split_mock_path("/"), None);
        assert_eq!(split_mock_path(""), None);
    }

    #[test]
    fn test_split_keeps_encoded_slash_in_segment() {
        assert_eq!(
            split_mock_path("/ABC12/files/a%2Fb"),
            Some(("ABC12", "/files/a%2Fb".to_string()))
        );
        assert_eq!(
            split_mock_path("/ABC12/files/a%2fb/raw"),
            Some(("ABC12", "/files/a%2Fb/raw".to_string()))
        );
    }

    #[tokio::test]
    async fn test_encoded_slash_matches_parameter() {
        let (store, project) = crate::serving::tests::setup();
        crate::serving::tests::add(
            &store,
            &project,
            crate::model::EndpointDraft {
                method: "GET".to_string(),
                path: "/files/{name}".to_string(),
                response_body: "file".to_string(),
                ..Default::default()
            },
        );
        let engine = Arc::new(MockEngine::new(store));

        let req = Request::get("/ABC12/files/a%2Fb").body(()).unwrap();
        let response = handle_mock_request(req, engine.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::get("/ABC12/files/a/b").body(()).unwrap();
        let response = handle_mock_request(req, engine).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn rendered(headers: &[(&str, &str)]) -> RenderedResponse {
        RenderedResponse {
            endpoint_id: Uuid::nil(),
            status: 201,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            body: "created".to_string(),
        }
    }

    #[test]
    fn test_render_defaults_content_type() {
        let response = render(rendered(&[("X-Trace", "abc")]));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-trace"], "abc");
    }

    #[test]
    fn test_render_keeps_declared_content_type() {
        let response = render(rendered(&[("content-type", "text/plain")]));
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }
}
