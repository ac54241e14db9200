//! HACS repository validator.
//!
//! Reads GitHub Actions inputs from the environment (overridable on the
//! command line), runs every check against the checked-out repository and
//! optionally posts the summary as a pull request comment.
//!
//! Usage:
//!   hacs-validator --category integration --repository owner/repo
//!   hacs-validator --ignore "topics brands" --format json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use hacs_validator::checks::Registry;
use hacs_validator::clients::{GithubClient, HttpProbe, PipInstaller};
use hacs_validator::config::{Config, log_filter, parse_bool_input, parse_ignore_list};
use hacs_validator::context::{CheckContext, Environment, RegistryUrls, RepoFiles, RepoSlug, Services};
use hacs_validator::executor::ExecutionPolicy;
use hacs_validator::orchestrator::Orchestrator;
use hacs_validator::publish::upsert_comment;
use hacs_validator::report::RunReport;
use hacs_validator::stdlib::PythonVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "hacs-validator")]
#[command(about = "Validate a repository for inclusion in HACS", long_about = None)]
struct Cli {
    /// Repository category (appdaemon, integration, netdaemon, plugin, python_script, themes)
    #[arg(long)]
    category: Option<String>,
    /// Space separated check names to skip
    #[arg(long)]
    ignore: Option<String>,
    #[arg(long)]
    github_token: Option<String>,
    /// Post the summary as a pull request comment
    #[arg(long)]
    comment: Option<String>,
    /// owner/repo
    #[arg(long)]
    repository: Option<String>,
    /// Checked out repository to validate
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Pull request to comment on when not running from a pull_request event
    #[arg(long)]
    pull_request: Option<u64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run succeeded
async fn run(cli: Cli, mut config: Config) -> Result<bool> {
    let runtime = &mut config.runtime;
    if let Some(category) = cli.category {
        runtime.category = Some(category);
    }
    if let Some(raw) = cli.ignore {
        runtime.ignore = parse_ignore_list(&raw);
    }
    if let Some(token) = cli.github_token {
        runtime.github_token = Some(token);
    }
    if let Some(raw) = cli.comment {
        runtime.comment = parse_bool_input("comment", &raw)?;
    }
    if let Some(repository) = cli.repository {
        runtime.repository = Some(repository);
    }
    if let Some(workspace) = cli.workspace {
        runtime.workspace = workspace;
    }
    if let Some(number) = cli.pull_request {
        runtime.event.pull_request = Some(number);
    }

    let runtime = &config.runtime;
    let validation = &config.validation;

    let repository: RepoSlug = runtime
        .repository
        .as_deref()
        .context("no repository given, set GITHUB_REPOSITORY or pass --repository")?
        .parse()?;
    let python_version: PythonVersion = runtime.python_version.parse()?;
    let category = runtime
        .category
        .clone()
        .context("no category given, set INPUT_CATEGORY or pass --category")?;
    let env = Arc::new(Environment::new(
        category,
        repository,
        runtime.workspace.clone(),
        python_version,
    ));

    let registry = Arc::new(Registry::build(&env));
    registry.warn_about_ignores(&runtime.ignore);

    info!(
        "Firing from {} on {}",
        runtime.event.name.as_deref().unwrap_or("unknown event"),
        runtime.event.git_ref.as_deref().unwrap_or("unknown ref")
    );

    let files = RepoFiles::load(&env.workspace)
        .with_context(|| format!("failed to read repository at {}", env.workspace.display()))?;

    let http_timeout = Duration::from_millis(validation.http_timeout_ms);
    let github = Arc::new(GithubClient::new(
        validation.github_api_url.clone(),
        runtime.github_token.clone(),
        http_timeout,
    )?);
    let services = Services {
        probe: Arc::new(HttpProbe::new(http_timeout)?),
        installer: Arc::new(PipInstaller::new(
            validation.pip_path.clone(),
            validation.pipdeptree_path.clone(),
            validation.pip_index_url.clone(),
            validation.pip_extra_index_url.clone(),
            Duration::from_millis(validation.install_timeout_ms),
        )),
        urls: RegistryUrls {
            brands_template: validation.brands_url_template.clone(),
            wheels_template: validation.wheels_url_template.clone(),
        },
    };

    let ctx = CheckContext::new(env.clone(), Arc::new(files), services);
    let policy = ExecutionPolicy::new(
        runtime.ignore.iter().cloned(),
        Duration::from_millis(validation.check_timeout_ms),
    );
    let orchestrator = Orchestrator::new(registry, github.clone(), ctx, policy);
    let report = orchestrator.run_all().await;

    print_report(&report, cli.format)?;
    let mut success = report.success();

    if runtime.comment {
        match runtime.event.pull_request {
            Some(number) => {
                let body = report.comment_body(&validation.comment_marker);
                if let Err(e) = upsert_comment(
                    github.as_ref(),
                    &env.repository,
                    number,
                    &validation.comment_marker,
                    &body,
                )
                .await
                {
                    error!("Posting pull request comment failed with {}", e);
                    success = false;
                }
            }
            None => info!("Not a pull request, skipping comment"),
        }
    }

    Ok(success)
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in report.render() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
