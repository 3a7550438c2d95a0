//! Per-project write serialisation.
//!
//! Every endpoint write path (single create/update, import commit, project
//! delete) runs inside the project's scope, so a commit's re-validation sees
//! a view no other writer can change underneath it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the project's lock.
    pub fn with<T>(&self, project_id: Uuid, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(project_id).or_default())
        };
        let _guard = lock.lock();
        f()
    }

    /// Drop the lock entry of a deleted project.
    pub fn forget(&self, project_id: Uuid) {
        self.locks.lock().remove(&project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_project_is_serialised() {
        let locks = Arc::new(ProjectLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let project = Uuid::new_v4();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with(project, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_returns_closure_value() {
        let locks = ProjectLocks::new();
        let id = Uuid::new_v4();
        assert_eq!(locks.with(id, || 42), 42);
        locks.forget(id);
        assert_eq!(locks.with(id, || "again"), "again");
    }
}
