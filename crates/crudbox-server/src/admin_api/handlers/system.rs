//! System handlers: root links, health, metrics.

use crate::admin_api::types::*;
use crate::admin_api::AdminState;
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET / - Links to the collections
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "_links": {
            "projects": {"href": format!("{}/projects", base_url)},
            "health": {"href": format!("{}/health", base_url)},
            "metrics": {"href": format!("{}/metrics", base_url)}
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics(state: &AdminState) -> Response<Full<Bytes>> {
    if let Ok(projects) = state.manager.projects() {
        metrics::set_projects_total(projects.len());
    }
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics::collect_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin_api::tests::state;
    use http_body_util::BodyExt;

    #[test]
    fn test_handle_root() {
        let resp = handle_root("http://localhost:2525");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_handle_health() {
        let resp = handle_health();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handle_metrics() {
        let state = state();
        state.manager.create_project("metrics", None).unwrap();
        let resp = handle_metrics(&state);
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("crudbox_projects_total"));
    }
}
