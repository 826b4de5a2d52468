//! Batch drivers over the flow paths of a change set.
//!
//! Every path is handled on its own: a failure is recorded in the outcome and
//! logged, and the batch moves on to the next path.

use super::{FlowEntity, FlowError, FlowReconciler};
use crate::utils::{flow_name_from_path, repo_file_path};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

/// A path that could not be synced
#[derive(Debug)]
pub struct ItemFailure {
    pub path: String,
    pub error: FlowError,
}

/// What a batch synced, and which paths failed
#[derive(Debug, Default)]
pub struct BatchOutcome<T> {
    pub synced: T,
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchOutcome<T> {
    fn fail(&mut self, path: &str, error: FlowError) {
        self.failures.push(ItemFailure {
            path: path.to_string(),
            error,
        });
    }
}

async fn read_flow_file(repo_root: &Path, path: &str) -> Result<String, FlowError> {
    let full_path = repo_file_path(repo_root, path);
    if !full_path.exists() {
        return Err(FlowError::FileNotFound(full_path.display().to_string()));
    }
    Ok(fs::read_to_string(&full_path).await?)
}

impl FlowReconciler {
    /// Create (or update) a flow for each added definition file.
    pub async fn process_added(
        &mut self,
        paths: &[String],
        repo_root: &Path,
    ) -> BatchOutcome<BTreeMap<String, FlowEntity>> {
        let mut outcome = BatchOutcome::<BTreeMap<String, FlowEntity>>::default();

        for path in paths {
            let result = match read_flow_file(repo_root, path).await {
                Ok(content) => self.add(path, &content).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(entity) => {
                    info!(%path, id = %entity.id, "Added flow");
                    outcome.synced.insert(entity.id.clone(), entity);
                }
                Err(e) => {
                    error!(%path, error = %e, "Failed to add flow");
                    outcome.fail(path, e);
                }
            }
        }

        outcome
    }

    /// Update the flow behind each modified definition file.
    ///
    /// A file without a matching remote flow is created instead, so the store
    /// catches up with flows it missed.
    pub async fn process_modified(
        &mut self,
        paths: &[String],
        repo_root: &Path,
    ) -> BatchOutcome<BTreeMap<String, FlowEntity>> {
        let mut outcome = BatchOutcome::<BTreeMap<String, FlowEntity>>::default();

        for path in paths {
            match self.sync_modified(path, repo_root).await {
                Ok(entity) => {
                    info!(%path, id = %entity.id, "Modified flow");
                    outcome.synced.insert(entity.id.clone(), entity);
                }
                Err(e) => {
                    error!(%path, error = %e, "Failed to update flow");
                    outcome.fail(path, e);
                }
            }
        }

        outcome
    }

    async fn sync_modified(&mut self, path: &str, repo_root: &Path) -> Result<FlowEntity, FlowError> {
        let content = read_flow_file(repo_root, path).await?;
        let name = flow_name_from_path(path);

        match self.resolve(&name).await? {
            Some(existing) => {
                let mut definition = super::parse_definition(&content)?;
                super::key_by_name(&mut definition, &name);
                self.update(&existing.id, path, definition).await
            }
            None => {
                warn!(flow = %name, "Modified flow missing remotely, creating it");
                self.add(path, &content).await
            }
        }
    }

    /// Delete the flow behind each deleted definition file, returning the
    /// identifiers that were removed.
    pub async fn process_deleted(&mut self, paths: &[String]) -> BatchOutcome<Vec<String>> {
        let mut outcome = BatchOutcome::<Vec<String>>::default();

        for path in paths {
            match self.delete(path).await {
                Ok(deleted) => {
                    info!(%path, id = %deleted.id, "Deleted flow");
                    outcome.synced.push(deleted.id);
                }
                Err(e) => {
                    error!(%path, error = %e, "Failed to delete flow");
                    outcome.fail(path, e);
                }
            }
        }

        outcome
    }
}
