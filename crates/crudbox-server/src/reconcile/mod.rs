//! OpenAPI import reconciliation.
//!
//! Preview classifies extracted operations against the project's current
//! endpoints without writing anything. Commit re-checks every candidate
//! against the store at commit time, inside the project's lock, and creates
//! only those still new. One stale or invalid item never aborts the batch;
//! only a store failure does, and the result then says what was left
//! unprocessed.

mod types;


pub use types::{
    Classification, ClassifiedOperation, CommitResult, EndpointRef, ImportError, ImportPreview,
    SkippedEndpoint, REASON_ALREADY_EXISTS, REASON_DUPLICATE_IN_FILE,
    REASON_DUPLICATE_IN_REQUEST, REASON_EXISTING,
};

use crate::analysis::log_introduced_warnings;
use crate::locks::ProjectLocks;
use crate::matcher::find_exact;
use crate::metrics;
use crate::model::{Endpoint, EndpointDraft, RouteKey};
use crate::openapi::OperationRecord;
use crate::store::EndpointStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

pub struct Reconciler {
    store: Arc<dyn EndpointStore>,
    locks: Arc<ProjectLocks>,
    max_body_bytes: usize,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn EndpointStore>,
        locks: Arc<ProjectLocks>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            locks,
            max_body_bytes,
        }
    }

    /// Classify operations in order: `existing` if the project already has the
    /// exact (method, path) pattern, else `duplicate` if an earlier operation
    /// in the batch had it, else `new`.
    pub fn preview(
        &self,
        project_id: Uuid,
        operations: Vec<OperationRecord>,
    ) -> Result<ImportPreview, ImportError> {
        let snapshot = self
            .store
            .endpoints(project_id)
            .map_err(|e| ImportError::from_store(project_id, e))?;

        let mut preview = ImportPreview {
            total_count: operations.len(),
            ..Default::default()
        };
        let mut seen: HashSet<RouteKey> = HashSet::new();

        for operation in operations {
            let route = operation.route();
            let (classification, reason) =
                if find_exact(&snapshot, route.method, &route.path).is_some() {
                    preview.existing_count += 1;
                    (Classification::Existing, Some(REASON_EXISTING))
                } else if seen.contains(&route) {
                    preview.duplicate_count += 1;
                    (Classification::Duplicate, Some(REASON_DUPLICATE_IN_FILE))
                } else {
                    preview.new_count += 1;
                    (Classification::New, None)
                };
            seen.insert(route);

            preview.operations.push(ClassifiedOperation {
                operation,
                classification,
                reason: reason.map(str::to_string),
            });
        }

        metrics::record_import_classification("new", preview.new_count);
        metrics::record_import_classification("existing", preview.existing_count);
        metrics::record_import_classification("duplicate", preview.duplicate_count);
        debug!(
            project = %project_id,
            total = preview.total_count,
            new = preview.new_count,
            existing = preview.existing_count,
            duplicate = preview.duplicate_count,
            "Import preview"
        );
        Ok(preview)
    }

    /// Create every candidate that is still new, in input order.
    pub fn commit(
        &self,
        project_id: Uuid,
        drafts: &[EndpointDraft],
        actor: Option<&str>,
    ) -> Result<CommitResult, ImportError> {
        let result = self
            .locks
            .with(project_id, || self.commit_locked(project_id, drafts, actor))?;

        metrics::record_commit("created", result.created.len());
        metrics::record_commit("skipped", result.skipped.len());
        metrics::record_commit("not_attempted", result.not_attempted.len());
        info!(
            project = %project_id,
            created = result.created.len(),
            skipped = result.skipped.len(),
            not_attempted = result.not_attempted.len(),
            "Import committed"
        );
        Ok(result)
    }

    fn commit_locked(
        &self,
        project_id: Uuid,
        drafts: &[EndpointDraft],
        actor: Option<&str>,
    ) -> Result<CommitResult, ImportError> {
        let snapshot = self
            .store
            .endpoints(project_id)
            .map_err(|e| ImportError::from_store(project_id, e))?;

        let mut taken: HashSet<RouteKey> = snapshot.iter().map(Endpoint::route).collect();
        let mut created_here: HashSet<RouteKey> = HashSet::new();
        let mut result = CommitResult::default();

        for (index, draft) in drafts.iter().enumerate() {
            let def = match draft.validate(self.max_body_bytes) {
                Ok(def) => def,
                Err(e) => {
                    skip(&mut result, &draft.method, &draft.path, e.to_string());
                    continue;
                }
            };

            let route = RouteKey::new(def.method, def.path.clone());
            let method = route.method.to_string();
            if taken.contains(&route) {
                let reason = if created_here.contains(&route) {
                    REASON_DUPLICATE_IN_REQUEST
                } else {
                    REASON_ALREADY_EXISTS
                };
                skip(&mut result, &method, &route.path, reason.to_string());
                continue;
            }

            match self
                .store
                .insert_endpoint(Endpoint::create(project_id, def, actor))
            {
                Ok(endpoint) => {
                    taken.insert(route.clone());
                    created_here.insert(route);
                    result.created.push(endpoint);
                }
                // Another writer got there first
                Err(e) if e.is_conflict() => {
                    skip(&mut result, &method, &route.path, REASON_ALREADY_EXISTS.to_string());
                    taken.insert(route);
                }
                Err(e) => {
                    error!(project = %project_id, "Import commit aborted: {}", e);
                    result.failure = Some(e.to_string());
                    result.not_attempted = drafts[index..].iter().map(EndpointRef::from).collect();
                    break;
                }
            }
        }

        if !result.created.is_empty() {
            if let Ok(current) = self.store.endpoints(project_id) {
                let introduced = result.created.iter().map(|e| e.id).collect();
                log_introduced_warnings(&current, &introduced);
            }
        }
        Ok(result)
    }
}

fn skip(result: &mut CommitResult, method: &str, path: &str, reason: String) {
    info!(method = %method, path = %path, reason = %reason, "Skipping import item");
    result.skipped.push(SkippedEndpoint {
        method: method.to_string(),
        path: path.to_string(),
        reason,
    });
}
