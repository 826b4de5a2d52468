//! Revision diff sources.
//!
//! A diff source answers two questions about the repository: which files
//! changed between two revisions (as raw `--name-status` records), and what a
//! file contained at a given revision.

mod git;

pub use git::GitDiffSource;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Could not resolve revision '{0}'")]
    UnresolvedRevision(String),
}

/// Source of revision identifiers, diffs and historical file content.
#[async_trait]
pub trait RevisionDiffSource: Send + Sync {
    /// Revision to diff from when none is given (the previous revision).
    async fn resolve_default_before(&self) -> Result<String, DiffError>;

    /// Revision to diff to when none is given (the current revision).
    async fn resolve_default_after(&self) -> Result<String, DiffError>;

    /// Name-status records between two revisions, one tab-separated record
    /// per changed file (`M\tpath`, `R100\told\tnew`, ...).
    async fn diff(&self, before: &str, after: &str) -> Result<Vec<String>, DiffError>;

    /// Content of `path` at `revision`, or `None` when it does not exist there.
    async fn read_file_at(&self, path: &str, revision: &str) -> Option<String>;
}
