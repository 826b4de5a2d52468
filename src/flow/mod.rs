//! Flow reconciliation.
//!
//! Flows are matched by name: the file name of their definition without the
//! `.json` extension. The remote store assigns identifiers; the repository is
//! the authority for names and content.

mod batch;

pub use batch::{BatchOutcome, ItemFailure};

use crate::remote::{FlowRecord, RemoteError, RemoteStore};
use crate::snapshot::Snapshot;
use crate::utils::flow_name_from_path;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid flow definition: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Flow definition must be a JSON object")]
    NotAnObject,

    #[error("Flow file {0} does not exist")]
    FileNotFound(String),

    #[error("Flow '{0}' not found")]
    NotFound(String),

    #[error("Remote error: {0}")]
    RemoteError(#[from] RemoteError),
}

/// A flow synced from a definition file
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEntity {
    pub id: String,
    /// Reconciliation key derived from `path`
    pub name: String,
    pub path: String,
    /// The record as returned by the store
    pub record: FlowRecord,
}

impl FlowEntity {
    fn new(path: &str, record: FlowRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: flow_name_from_path(path),
            path: path.to_string(),
            record,
        }
    }
}

/// A flow removed from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedFlow {
    pub id: String,
    pub name: String,
}

pub struct FlowReconciler {
    store: Arc<dyn RemoteStore>,
    flows: Snapshot<FlowRecord>,
}

impl FlowReconciler {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            flows: Snapshot::new("flows"),
        }
    }

    /// Find the remote flow named `name`, scanning the cached flow snapshot.
    pub async fn resolve(&mut self, name: &str) -> Result<Option<FlowRecord>, RemoteError> {
        let store = &self.store;
        let flows = self.flows.get(false, || store.list_flows()).await?;
        Ok(flows.iter().find(|flow| flow.name == name).cloned())
    }

    /// Create the flow defined by `content`, or update it when a flow with the
    /// same name already exists.
    pub async fn add(&mut self, path: &str, content: &str) -> Result<FlowEntity, FlowError> {
        let mut definition = parse_definition(content)?;
        let name = flow_name_from_path(path);
        key_by_name(&mut definition, &name);

        if let Some(existing) = self.resolve(&name).await? {
            warn!(flow = %name, id = %existing.id, "Flow already exists, updating instead");
            return self.update(&existing.id, path, definition).await;
        }

        let record = self.flows.mutate(self.store.create_flow(&definition)).await?;
        info!(flow = %name, id = %record.id, "Flow created");
        Ok(FlowEntity::new(path, record))
    }

    /// Replace the definition of flow `id`.
    pub async fn update(
        &mut self,
        id: &str,
        path: &str,
        definition: Value,
    ) -> Result<FlowEntity, FlowError> {
        let record = self.flows.mutate(self.store.update_flow(id, &definition)).await?;
        info!(flow = %flow_name_from_path(path), %id, "Flow updated");
        Ok(FlowEntity::new(path, record))
    }

    /// Delete the flow named after `path`.
    ///
    /// The identifier is captured before the remote call, since the flow no
    /// longer resolves once deleted.
    pub async fn delete(&mut self, path: &str) -> Result<DeletedFlow, FlowError> {
        let name = flow_name_from_path(path);
        let flow = self
            .resolve(&name)
            .await?
            .ok_or_else(|| FlowError::NotFound(name.clone()))?;
        let deleted = DeletedFlow { id: flow.id, name };

        self.flows.mutate(self.store.delete_flow(&deleted.id)).await?;
        info!(flow = %deleted.name, id = %deleted.id, "Flow deleted");
        Ok(deleted)
    }
}

/// Set the payload `name` to the name the flow is resolved by.
///
/// A different declared name is replaced, otherwise the stored flow would
/// never resolve from its file again.
pub(crate) fn key_by_name(definition: &mut Value, name: &str) {
    let Value::Object(map) = definition else {
        return;
    };
    if let Some(Value::String(declared)) = map.get("name") {
        if declared != name {
            warn!(
                flow = %name,
                %declared,
                "Definition declares a different name, using the file name"
            );
        }
    }
    map.insert("name".to_string(), Value::String(name.to_string()));
}

fn parse_definition(content: &str) -> Result<Value, FlowError> {
    let definition: Value = serde_json::from_str(content)?;
    if !definition.is_object() {
        return Err(FlowError::NotAnObject);
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        assert!(parse_definition(r#"{"value": 1}"#).is_ok());
        assert!(matches!(parse_definition("[1, 2]"), Err(FlowError::NotAnObject)));
        assert!(matches!(parse_definition("{nope"), Err(FlowError::ParseError(_))));
    }

    #[test]
    fn test_key_by_name_overrides_declared_name() {
        let mut definition = serde_json::json!({"name": "Invoice Pipeline", "value": 1});
        key_by_name(&mut definition, "invoice");
        assert_eq!(definition["name"], "invoice");
        assert_eq!(definition["value"], 1);

        let mut missing = serde_json::json!({"value": 1});
        key_by_name(&mut missing, "invoice");
        assert_eq!(missing["name"], "invoice");
    }
}
