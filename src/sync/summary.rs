use crate::flow::ItemFailure;
use crate::folder::FolderFailure;
use tracing::{info, warn};

/// Counts and failures of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub started_at: String,
    pub finished_at: String,
    pub flows_added: usize,
    pub flows_modified: usize,
    pub flows_deleted: usize,
    /// Folders whose membership was updated or that were created
    pub folders_touched: Vec<String>,
    pub empty_folders_removed: Vec<String>,
    /// `(path or folder, error)` for every item that failed
    pub failures: Vec<(String, String)>,
}

impl SyncSummary {
    pub(crate) fn started(at: String) -> Self {
        Self {
            started_at: at,
            ..Default::default()
        }
    }

    pub(crate) fn finish(&mut self, at: String) {
        self.finished_at = at;
    }

    pub(crate) fn record_flow_failures(&mut self, failures: Vec<ItemFailure>) {
        self.failures
            .extend(failures.into_iter().map(|f| (f.path, f.error.to_string())));
    }

    pub(crate) fn record_folder_failures(&mut self, failures: Vec<FolderFailure>) {
        self.failures
            .extend(failures.into_iter().map(|f| (f.folder, f.error.to_string())));
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Emit the end-of-run report
    pub fn log(&self) {
        info!(
            flows_added = self.flows_added,
            flows_modified = self.flows_modified,
            flows_deleted = self.flows_deleted,
            folders_touched = self.folders_touched.len(),
            empty_folders_removed = self.empty_folders_removed.len(),
            failures = self.failures.len(),
            "Sync summary"
        );
        for folder in &self.empty_folders_removed {
            info!(%folder, "Removed empty folder");
        }
        for (item, error) in &self.failures {
            warn!(%item, %error, "Not synced");
        }
    }
}
