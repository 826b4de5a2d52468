//! Remote store access.
//!
//! The reconcilers only talk to the store through [`RemoteStore`]; the
//! Langflow HTTP API is one implementation of it.

mod client;
mod types;

pub use client::LangflowClient;
pub use types::{FlowRecord, FolderDetail, FolderMembership, FolderRecord, MemberRef, NewFolder};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error ({status}): {detail}")]
    Status { status: u16, detail: String },

    #[error("{0}")]
    Rejected(String),
}

/// CRUD over the remote `flows` and `folders` collections.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_flows(&self) -> Result<Vec<FlowRecord>, RemoteError>;

    async fn create_flow(&self, payload: &Value) -> Result<FlowRecord, RemoteError>;

    async fn update_flow(&self, id: &str, payload: &Value) -> Result<FlowRecord, RemoteError>;

    async fn delete_flow(&self, id: &str) -> Result<(), RemoteError>;

    async fn list_folders(&self) -> Result<Vec<FolderRecord>, RemoteError>;

    /// `Ok(None)` when the folder does not exist.
    async fn get_folder(&self, id: &str) -> Result<Option<FolderDetail>, RemoteError>;

    async fn create_folder(&self, payload: &NewFolder) -> Result<FolderRecord, RemoteError>;

    async fn update_folder(
        &self,
        id: &str,
        payload: &FolderMembership,
    ) -> Result<FolderRecord, RemoteError>;

    async fn delete_folder(&self, id: &str) -> Result<(), RemoteError>;
}
