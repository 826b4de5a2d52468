use super::{DiffError, RevisionDiffSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error};

/// Diff source backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    repo_path: PathBuf,
}

impl GitDiffSource {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run `git <args>` inside the repository and return trimmed stdout.
    async fn run(&self, args: &[&str]) -> Result<String, DiffError> {
        debug!(args = ?args, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = %args.join(" "), %stderr, "git command failed");
            return Err(DiffError::Command {
                command: args.join(" "),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String, DiffError> {
        let resolved = self.run(&["rev-parse", rev]).await?;
        let resolved = resolved.trim();
        if resolved.is_empty() {
            return Err(DiffError::UnresolvedRevision(rev.to_string()));
        }
        Ok(resolved.to_string())
    }
}

#[async_trait]
impl RevisionDiffSource for GitDiffSource {
    async fn resolve_default_before(&self) -> Result<String, DiffError> {
        self.rev_parse("HEAD~1").await
    }

    async fn resolve_default_after(&self) -> Result<String, DiffError> {
        self.rev_parse("HEAD").await
    }

    async fn diff(&self, before: &str, after: &str) -> Result<Vec<String>, DiffError> {
        let output = self.run(&["diff", "--name-status", before, after]).await?;
        Ok(output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn read_file_at(&self, path: &str, revision: &str) -> Option<String> {
        let object = format!("{revision}:{path}");
        self.run(&["show", &object]).await.ok()
    }
}
