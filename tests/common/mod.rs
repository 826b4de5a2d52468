#![allow(dead_code)]

use async_trait::async_trait;
use flow_sync::remote::{
    FlowRecord, FolderDetail, FolderMembership, FolderRecord, MemberRef, NewFolder, RemoteError,
    RemoteStore,
};
use flow_sync::vcs::{DiffError, RevisionDiffSource};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Write a flow definition under the repository root
pub async fn write_flow(repo_root: &Path, relative: &str, content: &str) {
    let path = repo_root.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .expect("Should create flow directory");
    }
    tokio::fs::write(&path, content)
        .await
        .expect("Should write flow file");
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFolder {
    pub id: String,
    pub name: String,
    pub description: String,
    pub flows: Vec<String>,
    pub components: Vec<Value>,
}

#[derive(Default)]
struct State {
    flows: Vec<FlowRecord>,
    folders: Vec<StoredFolder>,
    list_flows_calls: usize,
    list_folders_calls: usize,
    fail_list_flows: bool,
    fail_list_folders: bool,
    failing_flow_names: HashSet<String>,
    failing_folder_updates: HashSet<String>,
    failing_folder_details: HashSet<String>,
    failing_folder_creates: HashSet<String>,
    missing_folder_details: HashSet<String>,
}

/// In-memory remote store with failure injection
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn rejected(message: impl Into<String>) -> RemoteError {
    RemoteError::Status {
        status: 500,
        detail: message.into(),
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        detail: format!("{what} not found"),
    }
}

fn split_payload(payload: &Value) -> (Option<String>, Map<String, Value>) {
    let mut extra = payload.as_object().cloned().unwrap_or_default();
    extra.remove("id");
    let name = match extra.remove("name") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };
    (name, extra)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_flow(&self, name: &str) -> String {
        let id = new_id();
        self.state.lock().unwrap().flows.push(FlowRecord {
            id: id.clone(),
            name: name.to_string(),
            extra: Map::new(),
        });
        id
    }

    pub fn seed_folder(&self, name: &str, flows: &[&str], components: usize) -> String {
        let id = new_id();
        self.state.lock().unwrap().folders.push(StoredFolder {
            id: id.clone(),
            name: name.to_string(),
            description: String::new(),
            flows: flows.iter().map(|f| f.to_string()).collect(),
            components: (0..components)
                .map(|i| serde_json::json!({ "id": format!("component-{i}") }))
                .collect(),
        });
        id
    }

    pub fn flows(&self) -> Vec<FlowRecord> {
        self.state.lock().unwrap().flows.clone()
    }

    pub fn flows_named(&self, name: &str) -> Vec<FlowRecord> {
        self.flows().into_iter().filter(|f| f.name == name).collect()
    }

    pub fn folders(&self) -> Vec<StoredFolder> {
        self.state.lock().unwrap().folders.clone()
    }

    pub fn folder(&self, name: &str) -> Option<StoredFolder> {
        self.folders().into_iter().find(|f| f.name == name)
    }

    pub fn list_flows_calls(&self) -> usize {
        self.state.lock().unwrap().list_flows_calls
    }

    pub fn list_folders_calls(&self) -> usize {
        self.state.lock().unwrap().list_folders_calls
    }

    pub fn fail_list_flows(&self) {
        self.state.lock().unwrap().fail_list_flows = true;
    }

    pub fn fail_list_folders(&self) {
        self.state.lock().unwrap().fail_list_folders = true;
    }

    /// Make create/update/delete fail for flows with this name
    pub fn fail_flow(&self, name: &str) {
        self.state.lock().unwrap().failing_flow_names.insert(name.to_string());
    }

    pub fn fail_folder_update(&self, name: &str) {
        self.state.lock().unwrap().failing_folder_updates.insert(name.to_string());
    }

    pub fn fail_folder_detail(&self, name: &str) {
        self.state.lock().unwrap().failing_folder_details.insert(name.to_string());
    }

    /// Listed, but its detail reports absent
    pub fn hide_folder_detail(&self, name: &str) {
        self.state.lock().unwrap().missing_folder_details.insert(name.to_string());
    }

    pub fn fail_folder_create(&self, name: &str) {
        self.state.lock().unwrap().failing_folder_creates.insert(name.to_string());
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_flows(&self) -> Result<Vec<FlowRecord>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.list_flows_calls += 1;
        if state.fail_list_flows {
            return Err(rejected("flows unavailable"));
        }
        Ok(state.flows.clone())
    }

    async fn create_flow(&self, payload: &Value) -> Result<FlowRecord, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let (name, extra) = split_payload(payload);
        let name = name.ok_or_else(|| rejected("name is required"))?;
        if state.failing_flow_names.contains(&name) {
            return Err(rejected(format!("cannot create {name}")));
        }
        let record = FlowRecord {
            id: new_id(),
            name,
            extra,
        };
        state.flows.push(record.clone());
        Ok(record)
    }

    async fn update_flow(&self, id: &str, payload: &Value) -> Result<FlowRecord, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let failing = state.failing_flow_names.clone();
        let flow = state
            .flows
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found("Flow"))?;
        if failing.contains(&flow.name) {
            return Err(rejected(format!("cannot update {}", flow.name)));
        }
        let (name, extra) = split_payload(payload);
        if let Some(name) = name {
            flow.name = name;
        }
        flow.extra = extra;
        Ok(flow.clone())
    }

    async fn delete_flow(&self, id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .flows
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| not_found("Flow"))?;
        if state.failing_flow_names.contains(&state.flows[position].name) {
            return Err(rejected("cannot delete"));
        }
        state.flows.remove(position);
        for folder in state.folders.iter_mut() {
            folder.flows.retain(|f| f != id);
        }
        Ok(())
    }

    async fn list_folders(&self) -> Result<Vec<FolderRecord>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.list_folders_calls += 1;
        if state.fail_list_folders {
            return Err(rejected("folders unavailable"));
        }
        Ok(state
            .folders
            .iter()
            .map(|f| FolderRecord {
                id: f.id.clone(),
                name: f.name.clone(),
                description: Some(f.description.clone()),
                extra: Map::new(),
            })
            .collect())
    }

    async fn get_folder(&self, id: &str) -> Result<Option<FolderDetail>, RemoteError> {
        let state = self.state.lock().unwrap();
        let Some(folder) = state.folders.iter().find(|f| f.id == id) else {
            return Ok(None);
        };
        if state.failing_folder_details.contains(&folder.name) {
            return Err(rejected(format!("cannot read {}", folder.name)));
        }
        if state.missing_folder_details.contains(&folder.name) {
            return Ok(None);
        }
        Ok(Some(FolderDetail {
            id: folder.id.clone(),
            name: folder.name.clone(),
            description: Some(folder.description.clone()),
            flows: Some(
                folder
                    .flows
                    .iter()
                    .map(|id| MemberRef {
                        id: id.clone(),
                        extra: Map::new(),
                    })
                    .collect(),
            ),
            components: folder.components.clone(),
            extra: Map::new(),
        }))
    }

    async fn create_folder(&self, payload: &NewFolder) -> Result<FolderRecord, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_folder_creates.contains(&payload.name) {
            return Err(rejected(format!("cannot create {}", payload.name)));
        }
        let folder = StoredFolder {
            id: new_id(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            flows: payload.flows_list.clone(),
            components: Vec::new(),
        };
        state.folders.push(folder.clone());
        Ok(FolderRecord {
            id: folder.id,
            name: folder.name,
            description: Some(folder.description),
            extra: Map::new(),
        })
    }

    async fn update_folder(
        &self,
        id: &str,
        payload: &FolderMembership,
    ) -> Result<FolderRecord, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let failing = state.failing_folder_updates.clone();
        let folder = state
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found("Folder"))?;
        if failing.contains(&folder.name) {
            return Err(rejected(format!("cannot update {}", folder.name)));
        }
        folder.flows = payload.flows.clone();
        Ok(FolderRecord {
            id: folder.id.clone(),
            name: folder.name.clone(),
            description: Some(folder.description.clone()),
            extra: Map::new(),
        })
    }

    async fn delete_folder(&self, id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        let before = state.folders.len();
        state.folders.retain(|f| f.id != id);
        if state.folders.len() == before {
            return Err(not_found("Folder"));
        }
        Ok(())
    }
}

/// Diff source answering from fixed data
#[derive(Default)]
pub struct ScriptedSource {
    pub records: Vec<String>,
    pub files: HashMap<(String, String), String>,
    pub fail_resolve: bool,
    pub fail_diff: bool,
}

impl ScriptedSource {
    pub fn with_records(records: &[&str]) -> Self {
        Self {
            records: records.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RevisionDiffSource for ScriptedSource {
    async fn resolve_default_before(&self) -> Result<String, DiffError> {
        if self.fail_resolve {
            return Err(DiffError::UnresolvedRevision("HEAD~1".to_string()));
        }
        Ok("before".to_string())
    }

    async fn resolve_default_after(&self) -> Result<String, DiffError> {
        if self.fail_resolve {
            return Err(DiffError::UnresolvedRevision("HEAD".to_string()));
        }
        Ok("after".to_string())
    }

    async fn diff(&self, before: &str, after: &str) -> Result<Vec<String>, DiffError> {
        if self.fail_diff {
            return Err(DiffError::Command {
                command: format!("diff --name-status {before} {after}"),
                stderr: "fatal: bad revision".to_string(),
            });
        }
        Ok(self.records.clone())
    }

    async fn read_file_at(&self, path: &str, revision: &str) -> Option<String> {
        self.files
            .get(&(path.to_string(), revision.to_string()))
            .cloned()
    }
}
