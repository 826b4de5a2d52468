use std::path::{Path, PathBuf};

/// Top-level directory holding the sync configuration in the repository
pub const CONFIG_ROOT: &str = "langflow-config";

/// Directory (under `CONFIG_ROOT`) holding the flow definitions
pub const FLOWS_DIR: &str = "flows";

/// Extension of flow definition files
pub const FLOW_EXTENSION: &str = ".json";

/// Repo-relative prefix every flow definition path starts with
pub fn flows_prefix() -> String {
    format!("{CONFIG_ROOT}/{FLOWS_DIR}/")
}

/// Check whether a repo-relative path lives under the flow definitions directory
pub fn is_flow_path(path: &str) -> bool {
    path.starts_with(&flows_prefix())
}

/// Derive the flow name from a path: the file name without its `.json` extension
pub fn flow_name_from_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .strip_suffix(FLOW_EXTENSION)
        .unwrap_or(file_name)
        .to_string()
}

/// Derive the folder name from a path.
///
/// The first two segments must be `langflow-config/flows`; the third segment
/// is the folder and must be followed by the file. Files directly under the
/// flows directory, and anything else, belong to no folder.
pub fn folder_name_from_path(path: &str) -> Option<String> {
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(CONFIG_ROOT), Some(FLOWS_DIR), Some(folder), Some(_)) if !folder.is_empty() => {
            Some(folder.to_string())
        }
        _ => None,
    }
}

/// Resolve a repo-relative path against the repository root
pub fn repo_file_path(repo_root: &Path, relative: &str) -> PathBuf {
    repo_root.join(relative)
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
