//! Route resolution for a project's endpoints.
//!
//! Rules, in order:
//! 1. An endpoint whose method and path equal the request exactly wins.
//! 2. Otherwise parameterised patterns are tried segment by segment.
//! 3. Among several matching patterns the one with more literal segments
//!    wins; remaining ties go to the earliest-created endpoint.
//!
//! Absence is a normal outcome and is returned as `None`.

mod pattern;

pub use pattern::{PathPattern, Segment};

use crate::model::{Endpoint, HttpMethod};

/// Find the best endpoint for a concrete request path.
///
/// `endpoints` must be in creation order.
pub fn best_match<'a>(
    endpoints: &'a [Endpoint],
    method: HttpMethod,
    path: &str,
) -> Option<&'a Endpoint> {
    if let Some(exact) = find_exact(endpoints, method, path) {
        return Some(exact);
    }

    let mut best: Option<(&Endpoint, usize)> = None;
    for endpoint in endpoints.iter().filter(|e| e.method == method) {
        let pattern = PathPattern::compile(&endpoint.path);
        if !pattern.is_parameterized() || !pattern.matches(path) {
            continue;
        }
        let specificity = pattern.literal_count();
        // Strictly greater keeps the earliest endpoint on ties
        if best.map_or(true, |(_, current)| specificity > current) {
            best = Some((endpoint, specificity));
        }
    }
    best.map(|(endpoint, _)| endpoint)
}

/// Find an endpoint declared for exactly this (method, path) pattern.
pub fn find_exact<'a>(
    endpoints: &'a [Endpoint],
    method: HttpMethod,
    path: &str,
) -> Option<&'a Endpoint> {
    endpoints.iter().find(|e| e.is_route(method, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointDraft, NewEndpoint};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn endpoint(method: &str, path: &str, body: &str) -> Endpoint {
        let def: NewEndpoint = EndpointDraft {
            method: method.to_string(),
            path: path.to_string(),
            response_body: body.to_string(),
            ..Default::default()
        }
        .validate(usize::MAX)
        .unwrap();
        Endpoint::create(Uuid::nil(), def, None)
    }

    fn body_of(found: Option<&Endpoint>) -> Option<&str> {
        found.map(|e| e.response_body.as_str())
    }

    #[test]
    fn test_exact_match() {
        let endpoints = vec![endpoint("GET", "/users", "list"), endpoint("POST", "/users", "create")];
        assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, "/users")), Some("list"));
        assert_eq!(body_of(best_match(&endpoints, HttpMethod::Post, "/users")), Some("create"));
        assert!(best_match(&endpoints, HttpMethod::Delete, "/users").is_none());
        assert!(best_match(&endpoints, HttpMethod::Get, "/unknown").is_none());
    }

    #[test]
    fn test_literal_outranks_parameterised() {
        let endpoints = vec![endpoint("GET", "/users/{id}", "param"), endpoint("GET", "/users/me", "me")];
        assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, "/users/me")), Some("me"));
        assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, "/users/42")), Some("param"));
    }

    #[test]
    fn test_more_literal_segments_win() {
        let endpoints = vec![
            endpoint("GET", "/{a}/{b}/posts", "one-literal"),
            endpoint("GET", "/users/{id}/posts", "two-literals"),
        ];
        assert_eq!(
            body_of(best_match(&endpoints, HttpMethod::Get, "/users/7/posts")),
            Some("two-literals")
        );
        assert_eq!(
            body_of(best_match(&endpoints, HttpMethod::Get, "/teams/7/posts")),
            Some("one-literal")
        );
    }

    #[test]
    fn test_tie_goes_to_earliest_created() {
        let endpoints = vec![
            endpoint("GET", "/users/{id}", "first"),
            endpoint("GET", "/users/{userId}", "second"),
        ];
        assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, "/users/1")), Some("first"));
    }

    #[test]
    fn test_segment_count_must_match() {
        let endpoints = vec![endpoint("GET", "/files/{name}", "file")];
        assert!(best_match(&endpoints, HttpMethod::Get, "/files/a/b").is_none());
        assert!(best_match(&endpoints, HttpMethod::Get, "/files").is_none());
    }

    #[test]
    fn test_find_exact_compares_patterns_literally() {
        let endpoints = vec![endpoint("GET", "/users/{userId}", "x")];
        assert!(find_exact(&endpoints, HttpMethod::Get, "/users/{userId}").is_some());
        assert!(find_exact(&endpoints, HttpMethod::Get, "/users/{id}").is_none());
        assert!(find_exact(&endpoints, HttpMethod::Get, "/users/1").is_none());
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,8}"
    }

    proptest! {
        #[test]
        fn prop_created_endpoint_is_resolvable(segments in prop::collection::vec(segment(), 1..5)) {
            let path = format!("/{}", segments.join("/"));
            let endpoints = vec![endpoint("GET", "/noise/{x}", "noise"), endpoint("GET", &path, "target")];
            prop_assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, &path)), Some("target"));
        }

        #[test]
        fn prop_literal_outranks_any_parameterised_pattern(
            segments in prop::collection::vec(segment(), 1..5),
            mask in prop::collection::vec(any::<bool>(), 5),
        ) {
            let concrete = format!("/{}", segments.join("/"));
            let templated: Vec<String> = segments
                .iter()
                .enumerate()
                .map(|(i, s)| if mask[i] { format!("{{p{i}}}") } else { s.clone() })
                .collect();
            let pattern = format!("/{}", templated.join("/"));
            // Parameterised first so creation order alone cannot explain the result
            let endpoints = vec![endpoint("GET", &pattern, "pattern"), endpoint("GET", &concrete, "literal")];
            prop_assert_eq!(body_of(best_match(&endpoints, HttpMethod::Get, &concrete)), Some("literal"));
        }
    }
}
