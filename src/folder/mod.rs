//! Folder reconciliation.
//!
//! Folders mirror the directory layout of the flow definitions: a flow at
//! `langflow-config/flows/<folder>/<flow>.json` belongs to `<folder>`. Syncing
//! only ever adds flows to a folder's membership; folders left without flows
//! and components are removed by [`FolderReconciler::collect_empty_folders`].

use crate::flow::FlowEntity;
use crate::remote::{FolderMembership, FolderRecord, NewFolder, RemoteError, RemoteStore};
use crate::snapshot::Snapshot;
use crate::utils::{flow_name_from_path, folder_name_from_path};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum FolderError {
    #[error("Remote error: {0}")]
    RemoteError(#[from] RemoteError),

    #[error("Folder list unavailable: {0}")]
    SnapshotUnavailable(String),
}

/// A folder that could not be reconciled or inspected
#[derive(Debug)]
pub struct FolderFailure {
    pub folder: String,
    pub error: FolderError,
}

/// What a folder pass applied, and which folders failed
#[derive(Debug, Default)]
pub struct FolderOutcome<T> {
    pub applied: T,
    pub failures: Vec<FolderFailure>,
}

impl<T> FolderOutcome<T> {
    fn fail(&mut self, folder: &str, error: FolderError) {
        self.failures.push(FolderFailure {
            folder: folder.to_string(),
            error,
        });
    }
}

/// Description given to folders created by a sync
pub fn default_description(folder: &str) -> String {
    format!("Folder for {folder} flows")
}

/// Group flow ids by the folder their path belongs to.
///
/// Paths outside any folder, or whose flow did not sync, contribute no id; a
/// folder still appears (with no ids) when it only saw such paths.
pub fn candidate_members(
    paths: &[String],
    entities: &BTreeMap<String, FlowEntity>,
) -> BTreeMap<String, BTreeSet<String>> {
    let ids_by_name: HashMap<&str, &str> = entities
        .values()
        .map(|entity| (entity.name.as_str(), entity.id.as_str()))
        .collect();

    let mut candidates: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for path in paths {
        let Some(folder) = folder_name_from_path(path) else {
            continue;
        };
        let members = candidates.entry(folder).or_default();
        if let Some(id) = ids_by_name.get(flow_name_from_path(path).as_str()) {
            members.insert(id.to_string());
        }
    }
    candidates
}

pub struct FolderReconciler {
    store: Arc<dyn RemoteStore>,
    folders: Snapshot<FolderRecord>,
}

impl FolderReconciler {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            folders: Snapshot::new("folders"),
        }
    }

    /// Add the synced flows of `changed_paths` to their folders, creating
    /// folders that do not exist yet.
    ///
    /// Returns the resulting membership of every folder that was updated or
    /// created. Folders are processed in name order, each independently.
    pub async fn reconcile(
        &mut self,
        changed_paths: &[String],
        entities: &BTreeMap<String, FlowEntity>,
    ) -> FolderOutcome<BTreeMap<String, Vec<String>>> {
        let mut outcome = FolderOutcome::<BTreeMap<String, Vec<String>>>::default();
        let candidates = candidate_members(changed_paths, entities);
        if candidates.is_empty() {
            return outcome;
        }

        // One fresh listing for the whole pass
        let store = &self.store;
        let existing: HashMap<String, FolderRecord> =
            match self.folders.get(true, || store.list_folders()).await {
                Ok(folders) => folders
                    .iter()
                    .map(|folder| (folder.name.clone(), folder.clone()))
                    .collect(),
                Err(e) => {
                    error!(error = %e, "Could not list folders, skipping folder reconciliation");
                    let reason = e.to_string();
                    for folder in candidates.keys() {
                        outcome.fail(folder, FolderError::SnapshotUnavailable(reason.clone()));
                    }
                    return outcome;
                }
            };

        for (folder, ids) in candidates {
            if ids.is_empty() {
                warn!(%folder, "No synced flows for folder");
                continue;
            }

            let result = match existing.get(&folder) {
                Some(record) => self.merge_members(record, &ids).await,
                None => self.create(&folder, &ids).await,
            };

            match result {
                Ok(members) => {
                    outcome.applied.insert(folder, members);
                }
                Err(e) => {
                    error!(%folder, error = %e, "Failed to reconcile folder");
                    outcome.fail(&folder, e);
                }
            }
        }

        outcome
    }

    /// Set the membership of an existing folder to the union of its current
    /// members and `ids`.
    async fn merge_members(
        &mut self,
        folder: &FolderRecord,
        ids: &BTreeSet<String>,
    ) -> Result<Vec<String>, FolderError> {
        let current = match self.store.get_folder(&folder.id).await {
            Ok(Some(detail)) if detail.flows.is_some() => Some(detail.flow_ids()),
            Ok(_) => None,
            Err(e) => {
                warn!(folder = %folder.name, error = %e, "Could not read folder members");
                None
            }
        };

        let members: Vec<String> = match current {
            Some(current) => {
                let preserved = current.len();
                let union: BTreeSet<String> = current.into_iter().chain(ids.iter().cloned()).collect();
                info!(folder = %folder.name, id = %folder.id, preserved, "Merging flows into folder");
                union.into_iter().collect()
            }
            None => {
                warn!(
                    folder = %folder.name,
                    id = %folder.id,
                    "Existing members unknown, setting membership to synced flows only"
                );
                ids.iter().cloned().collect()
            }
        };

        let payload = FolderMembership {
            flows: members.clone(),
        };
        self.folders
            .mutate(self.store.update_folder(&folder.id, &payload))
            .await?;
        info!(folder = %folder.name, members = members.len(), "Folder updated");
        Ok(members)
    }

    async fn create(&mut self, name: &str, ids: &BTreeSet<String>) -> Result<Vec<String>, FolderError> {
        let members: Vec<String> = ids.iter().cloned().collect();
        let payload = NewFolder {
            name: name.to_string(),
            description: default_description(name),
            components_list: Vec::new(),
            flows_list: members.clone(),
        };
        let record = self.folders.mutate(self.store.create_folder(&payload)).await?;
        info!(folder = %name, id = %record.id, members = members.len(), "Folder created");
        Ok(members)
    }

    /// Delete every folder that holds neither flows nor components, returning
    /// the names of the folders removed.
    ///
    /// Runs over all folders on every call, whether or not this run touched them.
    pub async fn collect_empty_folders(&mut self) -> FolderOutcome<Vec<String>> {
        let mut outcome = FolderOutcome::<Vec<String>>::default();

        let store = &self.store;
        let folders: Vec<FolderRecord> = match self.folders.get(true, || store.list_folders()).await {
            Ok(folders) => folders.to_vec(),
            Err(e) => {
                error!(error = %e, "Could not list folders, skipping empty folder collection");
                return outcome;
            }
        };

        for folder in folders {
            let detail = match self.store.get_folder(&folder.id).await {
                Ok(Some(detail)) => detail,
                Ok(None) => {
                    warn!(
                        folder = %folder.name,
                        id = %folder.id,
                        "Folder vanished before inspection, skipping"
                    );
                    continue;
                }
                Err(e) => {
                    error!(folder = %folder.name, error = %e, "Could not inspect folder");
                    outcome.fail(&folder.name, e.into());
                    continue;
                }
            };

            if !detail.is_empty() {
                continue;
            }

            match self.folders.mutate(self.store.delete_folder(&folder.id)).await {
                Ok(()) => {
                    info!(folder = %folder.name, id = %folder.id, "Empty folder deleted");
                    outcome.applied.push(folder.name);
                }
                Err(e) => {
                    error!(folder = %folder.name, error = %e, "Failed to delete empty folder");
                    outcome.fail(&folder.name, e.into());
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::FlowRecord;
    use serde_json::Map;

    fn entity(id: &str, path: &str) -> (String, FlowEntity) {
        let name = flow_name_from_path(path);
        let entity = FlowEntity {
            id: id.to_string(),
            name: name.clone(),
            path: path.to_string(),
            record: FlowRecord {
                id: id.to_string(),
                name,
                extra: Map::new(),
            },
        };
        (id.to_string(), entity)
    }

    #[test]
    fn test_candidate_members_groups_and_dedups() {
        let paths = vec![
            "langflow-config/flows/billing/invoice.json".to_string(),
            "langflow-config/flows/billing/invoice.json".to_string(),
            "langflow-config/flows/billing/receipt.json".to_string(),
            "langflow-config/flows/hr/broken.json".to_string(),
            "langflow-config/flows/loose.json".to_string(),
            "docs/other.json".to_string(),
        ];
        let entities: BTreeMap<String, FlowEntity> = [
            entity("id-1", "langflow-config/flows/billing/invoice.json"),
            entity("id-2", "langflow-config/flows/billing/receipt.json"),
        ]
        .into_iter()
        .collect();

        let candidates = candidate_members(&paths, &entities);

        let billing: Vec<&String> = candidates["billing"].iter().collect();
        assert_eq!(billing, vec!["id-1", "id-2"]);
        assert!(candidates["hr"].is_empty());
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_default_description() {
        assert_eq!(default_description("billing"), "Folder for billing flows");
    }
}
