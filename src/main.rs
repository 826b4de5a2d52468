use clap::Parser;
use flow_sync::config::{SyncConfig, DEFAULT_LANGFLOW_URL, DEFAULT_TIMEOUT_SECS};
use flow_sync::{run_sync, GitDiffSource, LangflowClient, SyncOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Flow Sync - replay flow definition changes from Git onto Langflow
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the Langflow instance
    #[arg(long, env = "LANGFLOW_URL", default_value = DEFAULT_LANGFLOW_URL)]
    langflow_url: String,

    /// API token for Langflow authentication
    #[arg(long, env = "LANGFLOW_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Path to the local Git repository (defaults to the current directory)
    #[arg(long, env = "REPO_PATH")]
    repo_path: Option<PathBuf>,

    /// Revision to compare from (defaults to HEAD~1)
    #[arg(long, env = "BEFORE_COMMIT")]
    before_commit: Option<String>,

    /// Revision to compare to (defaults to HEAD)
    #[arg(long, env = "AFTER_COMMIT")]
    after_commit: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "VERBOSE")]
    verbose: bool,

    /// Timeout for a single Langflow API call, in seconds
    #[arg(long, env = "LANGFLOW_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SyncConfig> {
        let repo_path = match self.repo_path {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        Ok(SyncConfig {
            langflow_url: self.langflow_url,
            api_token: self.api_token,
            repo_path,
            before_commit: self.before_commit,
            after_commit: self.after_commit,
            verbose: self.verbose,
            timeout_secs: self.timeout_secs,
        })
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flow_sync={}", level.as_str().to_lowercase())));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Args::parse().into_config()?;

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        return Ok(ExitCode::from(1));
    }

    init_logging(config.verbose)?;
    info!("Starting Langflow sync");
    debug!(?config, "Configuration");

    let client = match LangflowClient::new(
        &config.langflow_url,
        config.api_token.as_deref(),
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Could not build the Langflow client");
            return Ok(ExitCode::from(1));
        }
    };

    let source = GitDiffSource::new(&config.repo_path);
    let options = SyncOptions {
        repo_root: config.repo_path.clone(),
        before: config.before_commit.clone(),
        after: config.after_commit.clone(),
    };

    let summary = run_sync(&options, &source, Arc::new(client)).await;
    summary.log();
    info!("Sync finished");

    Ok(ExitCode::SUCCESS)
}
