//! Route analysis for a project's endpoint set.
//!
//! The store keeps (method, path) unique for everything written through it,
//! but data loaded from older snapshots may still contain repeats. Nothing is
//! dropped here; problems are reported so they can be shown next to the
//! endpoint listing.
//!
//! - Duplicate routes (the later endpoint is never served)
//! - Overlapping parameterised patterns (resolved by creation order)

use crate::matcher::PathPattern;
use crate::model::{Endpoint, RouteKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

/// A problem found in an endpoint set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteWarning {
    pub warning_type: WarningType,
    /// Human-readable message
    pub message: String,
    /// The endpoint that loses
    pub endpoint_id: Uuid,
    /// The earlier endpoint it collides with
    pub conflicts_with: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningType {
    /// Same method and path as an earlier endpoint
    DuplicateRoute,
    /// Parameterised pattern that ties with an earlier one on some path
    OverlappingPattern,
}

/// Analyze endpoints (in creation order) for duplicates and ambiguous overlaps.
pub fn analyze_endpoints(endpoints: &[Endpoint]) -> Vec<RouteWarning> {
    let mut warnings = Vec::new();
    let mut first_seen: HashMap<RouteKey, &Endpoint> = HashMap::new();
    let mut patterns: Vec<(&Endpoint, PathPattern)> = Vec::new();

    for endpoint in endpoints {
        let route = endpoint.route();
        if let Some(earlier) = first_seen.get(&route) {
            warnings.push(RouteWarning {
                warning_type: WarningType::DuplicateRoute,
                message: format!("{route} is declared more than once; only the first is served"),
                endpoint_id: endpoint.id,
                conflicts_with: earlier.id,
            });
            continue;
        }
        first_seen.insert(route, endpoint);

        let pattern = PathPattern::compile(&endpoint.path);
        if !pattern.is_parameterized() {
            continue;
        }
        let tie = patterns.iter().find(|(earlier, earlier_pattern)| {
            earlier.method == endpoint.method
                && earlier_pattern.literal_count() == pattern.literal_count()
                && earlier_pattern.overlaps(&pattern)
        });
        if let Some((earlier, _)) = tie {
            warnings.push(RouteWarning {
                warning_type: WarningType::OverlappingPattern,
                message: format!(
                    "{} {} overlaps {} {}; the earlier endpoint wins",
                    endpoint.method, endpoint.path, earlier.method, earlier.path
                ),
                endpoint_id: endpoint.id,
                conflicts_with: earlier.id,
            });
        }
        patterns.push((endpoint, pattern));
    }

    warnings
}

/// Log the warnings that involve freshly written endpoints.
pub fn log_introduced_warnings(endpoints: &[Endpoint], introduced: &HashSet<Uuid>) {
    for warning in analyze_endpoints(endpoints)
        .iter()
        .filter(|w| introduced.contains(&w.endpoint_id) || introduced.contains(&w.conflicts_with))
    {
        warn!(
            endpoint = %warning.endpoint_id,
            conflicts_with = %warning.conflicts_with,
            "{}",
            warning.message
        );
    }
}
