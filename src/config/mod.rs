use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default Langflow instance
pub const DEFAULT_LANGFLOW_URL: &str = "http://localhost:7860";

/// Default transport timeout for a single remote call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Langflow URL is required")]
    MissingUrl,

    #[error("Repository path '{0}' does not exist")]
    RepoNotFound(String),

    #[error("Path '{0}' is not a Git repository")]
    NotAGitRepo(String),
}

/// Sync run configuration
#[derive(Clone)]
pub struct SyncConfig {
    pub langflow_url: String,
    pub api_token: Option<String>,
    pub repo_path: PathBuf,
    pub before_commit: Option<String>,
    pub after_commit: Option<String>,
    pub verbose: bool,
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            langflow_url: DEFAULT_LANGFLOW_URL.to_string(),
            api_token: None,
            repo_path: PathBuf::from("."),
            before_commit: None,
            after_commit: None,
            verbose: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    /// Check that the configuration can drive a run.
    ///
    /// The URL must be non-empty and the repository path must exist and
    /// contain a `.git` entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.langflow_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let repo = self.repo_path.display().to_string();
        if !self.repo_path.exists() {
            return Err(ConfigError::RepoNotFound(repo));
        }
        if !self.repo_path.join(".git").exists() {
            return Err(ConfigError::NotAGitRepo(repo));
        }

        Ok(())
    }
}

// Hand-written so the token never reaches the logs
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("langflow_url", &self.langflow_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("repo_path", &self.repo_path)
            .field("before_commit", &self.before_commit)
            .field("after_commit", &self.after_commit)
            .field("verbose", &self.verbose)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
