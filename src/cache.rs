use std::sync::atomic::{AtomicU64, Ordering};

/// Stand-in for a rendered-dashboard cache: a version stamp the task
/// handlers bump after every successful write. The read path folds the
/// stamp into an ETag, so a stale cached payload revalidates instead of
/// being served again.
#[derive(Debug, Default)]
pub struct DashboardCache {
    version: AtomicU64,
}

impl DashboardCache {
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Called by the action layer after any successful write.
    pub fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// ETag for one owner's task list. The owner id keeps caches on shared
    /// machines from validating against another user's payload.
    pub fn etag(&self, owner_id: &str) -> String {
        format!("\"{}-{}\"", self.version(), owner_id)
    }
}
