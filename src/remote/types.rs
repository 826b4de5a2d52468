use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flow as stored remotely.
///
/// Only `id` and `name` are interpreted; every other attribute is kept in
/// `extra` so it survives a round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A folder as listed remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a member of a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A folder with its members.
///
/// `flows` is `None` when the store did not report a membership list at all,
/// which is distinct from reporting an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderDetail {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub flows: Option<Vec<MemberRef>>,
    #[serde(default)]
    pub components: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FolderDetail {
    pub fn flow_ids(&self) -> Vec<String> {
        self.flows
            .as_ref()
            .map(|flows| flows.iter().map(|f| f.id.clone()).collect())
            .unwrap_or_default()
    }

    /// True when the folder holds neither flows nor components
    pub fn is_empty(&self) -> bool {
        self.flows.as_ref().map_or(true, Vec::is_empty) && self.components.is_empty()
    }
}

/// Payload for creating a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFolder {
    pub name: String,
    pub description: String,
    pub components_list: Vec<String>,
    pub flows_list: Vec<String>,
}

/// Payload for replacing a folder's flow membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderMembership {
    pub flows: Vec<String>,
}
