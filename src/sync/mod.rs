//! End-to-end sync run.
//!
//! Sequence: detect changes, add, modify and delete flows, reconcile the
//! folders of the flows that synced, then remove empty folders.

mod summary;

pub use summary::SyncSummary;

use crate::changeset::detect_changes;
use crate::flow::FlowReconciler;
use crate::folder::FolderReconciler;
use crate::remote::RemoteStore;
use crate::utils::now_iso;
use crate::vcs::RevisionDiffSource;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Inputs of a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Working tree the flow definitions are read from
    pub repo_root: PathBuf,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Replay the flow changes between two revisions against the store.
///
/// Per-item failures are collected in the summary; nothing here aborts the run.
pub async fn run_sync<S>(options: &SyncOptions, source: &S, store: Arc<dyn RemoteStore>) -> SyncSummary
where
    S: RevisionDiffSource + ?Sized,
{
    let mut summary = SyncSummary::started(now_iso());
    let mut flows = FlowReconciler::new(store.clone());
    let mut folders = FolderReconciler::new(store);

    info!("Detecting changes");
    let changes = detect_changes(source, options.before.as_deref(), options.after.as_deref()).await;

    if !changes.has_flow_changes() {
        info!("No flow definitions changed");
    }

    let mut added = BTreeMap::new();
    if !changes.flows_added().is_empty() {
        info!(count = changes.flows_added().len(), "Processing added flows");
        let outcome = flows.process_added(changes.flows_added(), &options.repo_root).await;
        summary.flows_added = outcome.synced.len();
        summary.record_flow_failures(outcome.failures);
        added = outcome.synced;
    }

    let mut modified = BTreeMap::new();
    if !changes.flows_modified().is_empty() {
        info!(count = changes.flows_modified().len(), "Processing modified flows");
        let outcome = flows.process_modified(changes.flows_modified(), &options.repo_root).await;
        summary.flows_modified = outcome.synced.len();
        summary.record_flow_failures(outcome.failures);
        modified = outcome.synced;
    }

    // A name that is still defined elsewhere moved rather than went away
    let to_delete = changes.flows_to_delete();
    if !to_delete.is_empty() {
        info!(count = to_delete.len(), "Processing deleted flows");
        let outcome = flows.process_deleted(&to_delete).await;
        summary.flows_deleted = outcome.synced.len();
        summary.record_flow_failures(outcome.failures);
    }

    let mut synced = added;
    synced.extend(modified);

    if !synced.is_empty() {
        info!("Organizing flows into folders");
        let outcome = folders.reconcile(&changes.flows_touched(), &synced).await;
        summary.folders_touched = outcome.applied.keys().cloned().collect();
        summary.record_folder_failures(outcome.failures);
    }

    info!("Removing empty folders");
    let outcome = folders.collect_empty_folders().await;
    summary.empty_folders_removed = outcome.applied;
    summary.record_folder_failures(outcome.failures);

    summary.finish(now_iso());
    summary
}
