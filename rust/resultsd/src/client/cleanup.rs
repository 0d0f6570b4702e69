use super::ResultsClient;
use crate::store::DbPath;
use serde::Serialize;
use tracing::info;

/// Paths wiped by [`ResultsClient::cleanup_data`].
pub const CLEANUP_PATHS: [&str; 6] = [
    "teachers",
    "students",
    "marks",
    "departmentData",
    "classSubjects",
    "test",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

impl ResultsClient {
    /// Deletes every cleanup path on its own thread. One failed deletion does
    /// not stop the others; it is only counted.
    pub fn cleanup_data(&self) -> CleanupReport {
        let outcomes: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = CLEANUP_PATHS
                .iter()
                .map(|raw| scope.spawn(move || self.remove_path(raw)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(false))
                .collect()
        });

        let successful = outcomes.iter().filter(|ok| **ok).count();
        let report = CleanupReport {
            successful,
            failed: outcomes.len() - successful,
            total: outcomes.len(),
        };
        info!(
            successful = report.successful,
            failed = report.failed,
            "cleanup finished"
        );
        report
    }

    fn remove_path(&self, raw: &str) -> bool {
        match DbPath::parse(raw) {
            Ok(path) => self.guarded("remove", &path, |s| s.remove(&path)).is_ok(),
            Err(_) => false,
        }
    }
}
