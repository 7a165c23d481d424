//! Scrape Engine main entry point
//!
//! Command-line front end: submits one scrape job, follows its progress
//! messages until it finishes and reports where the export went.

use anyhow::{bail, Context};
use clap::Parser;
use scrape_engine::config::{load_config_with_hash, Config};
use scrape_engine::extract::{is_builtin_field, BUILTIN_RULES};
use scrape_engine::jobs::{JobManager, SubmitRequest};
use scrape_engine::{Credentials, JobStatus};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Scrape Engine: crawl a site and export the data found on it
///
/// Fetches the entry page (and, optionally, every page reachable through
/// "Next" links), extracts the requested field types and writes them to CSV.
#[derive(Parser, Debug)]
#[command(name = "scrape-engine")]
#[command(version = "1.0.0")]
#[command(about = "Crawl-and-extract scrape jobs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Entry page to scrape
    #[arg(long, value_name = "URL", required_unless_present = "list_fields")]
    url: Option<String>,

    /// Field type to extract (repeatable)
    #[arg(short, long = "field", value_name = "TYPE")]
    fields: Vec<String>,

    /// Follow "Next" pagination links from the entry page
    #[arg(long)]
    follow_pagination: bool,

    /// Username to log in with before scraping
    #[arg(long, requires = "login_password")]
    login_username: Option<String>,

    /// Password to log in with before scraping
    #[arg(long, requires = "login_username")]
    login_password: Option<String>,

    /// Name of the login form's username input
    #[arg(long, default_value = "username")]
    login_user_field: String,

    /// Name of the login form's password input
    #[arg(long, default_value = "password")]
    login_pass_field: String,

    /// List the available field types and exit
    #[arg(long)]
    list_fields: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let manager = JobManager::from_config(&config)?;

    if cli.list_fields {
        handle_list_fields(&manager);
        return Ok(());
    }

    handle_scrape(&manager, cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_engine=info,warn"),
            1 => EnvFilter::new("scrape_engine=debug,info"),
            2 => EnvFilter::new("scrape_engine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --list-fields: prints the built-in and configured field types
fn handle_list_fields(manager: &JobManager) {
    println!("Built-in field types:");
    for rule in BUILTIN_RULES {
        println!("  {:<16} {}", rule.name, rule.description);
    }

    let custom: Vec<&str> = manager
        .registry()
        .field_types()
        .filter(|name| !is_builtin_field(name))
        .collect();
    if !custom.is_empty() {
        println!("\nConfigured field types:");
        for name in custom {
            println!("  {}", name);
        }
    }
}

/// Submits the job and prints progress until it finishes
async fn handle_scrape(manager: &JobManager, cli: Cli) -> anyhow::Result<()> {
    let credentials = match (cli.login_username, cli.login_password) {
        (Some(username), Some(password)) => Some(
            Credentials::new(username, password)
                .with_fields(cli.login_user_field, cli.login_pass_field),
        ),
        _ => None,
    };

    for field in &cli.fields {
        if !manager.registry().contains(field.trim()) {
            tracing::warn!("Unknown field type '{}' will be ignored", field);
        }
    }

    let id = manager.submit(SubmitRequest {
        url: cli.url.unwrap_or_default(),
        field_types: cli.fields,
        follow_pagination: cli.follow_pagination,
        credentials,
    })?;
    tracing::info!("Job {} submitted", id);

    let mut last = String::new();
    loop {
        let Some(snapshot) = manager.status(&id) else {
            bail!("job {} disappeared", id);
        };

        if snapshot.message != last {
            println!("{}", snapshot.message);
            last = snapshot.message.clone();
        }

        match snapshot.status {
            JobStatus::Succeeded { .. } => {
                if let Some(artifact) = manager.retrieve_export(&id).await? {
                    println!("✓ Results written to: {}", artifact.path.display());
                }
                return Ok(());
            }
            JobStatus::Failed { error } => bail!("job {} failed: {}", id, error),
            JobStatus::Pending | JobStatus::Running => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}
