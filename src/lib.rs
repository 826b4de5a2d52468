pub mod changeset;
pub mod config;
pub mod flow;
pub mod folder;
pub mod remote;
pub mod snapshot;
pub mod sync;
pub mod utils;
pub mod vcs;

// Re-export commonly used types
pub use changeset::{detect_changes, ChangeSet, DiffStatus};
pub use config::{ConfigError, SyncConfig};
pub use flow::{BatchOutcome, DeletedFlow, FlowEntity, FlowError, FlowReconciler, ItemFailure};
pub use folder::{FolderError, FolderFailure, FolderOutcome, FolderReconciler};
pub use remote::{
    FlowRecord, FolderDetail, FolderMembership, FolderRecord, LangflowClient, MemberRef, NewFolder,
    RemoteError, RemoteStore,
};
pub use snapshot::Snapshot;
pub use sync::{run_sync, SyncOptions, SyncSummary};
pub use vcs::{DiffError, GitDiffSource, RevisionDiffSource};
