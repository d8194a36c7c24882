// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use domain_manager::{
    config::{DeploymentContext, DeploymentDescriptor, DeploymentOptions},
    constants::{
        DEFAULT_CONFIG_PATH, DEFAULT_ENDPOINT, THROTTLE_INITIAL_INTERVAL_MILLIS,
        THROTTLE_MAX_ATTEMPTS,
    },
    domain::DomainSet,
    metrics,
    reconcilers::{DomainSetOrchestrator, LifecycleOperation, ThrottlePolicy},
    services::{http::GatewayClient, Services},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(name = "domain-manager")]
#[command(about = "Manage custom domains of API gateway deployments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Deployment descriptor to read `custom.customDomain` from
    #[arg(short, long, global = true, env = "DOMAIN_MANAGER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stage override (wins over `provider.stage`)
    #[arg(long, global = true)]
    stage: Option<String>,

    /// Region override (wins over `provider.region`)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Control-plane endpoint of the gateway
    #[arg(long, global = true, env = "DOMAIN_MANAGER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Bearer token sent with every control-plane request
    #[arg(long, global = true, env = "DOMAIN_MANAGER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// First wait before retrying a throttled step, in milliseconds
    #[arg(long, global = true, default_value_t = THROTTLE_INITIAL_INTERVAL_MILLIS)]
    throttle_initial_ms: u64,

    /// Attempts per throttled step before the domain fails
    #[arg(long, global = true, default_value_t = THROTTLE_MAX_ATTEMPTS)]
    throttle_max_attempts: u32,

    /// Write stack outputs (alias target and zone per domain) as JSON
    #[arg(long, global = true)]
    outputs_file: Option<PathBuf>,

    /// Write the full run report as JSON
    #[arg(long, global = true)]
    report_file: Option<PathBuf>,

    /// Write Prometheus metrics in text format after the run
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    /// Log full error detail
    #[arg(short, long, global = true, env = "DOMAIN_MANAGER_DEBUG")]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing domains and their alias records
    CreateDomains,
    /// Delete domains and their alias records
    DeleteDomains,
    /// Create or update base path mappings (after deploy)
    SyncMappings,
    /// Delete base path mappings (before remove)
    RemoveMappings,
    /// Print the alias target of every domain
    Summarize,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    fn operation(&self) -> Option<LifecycleOperation> {
        match self {
            Self::CreateDomains => Some(LifecycleOperation::CreateDomains),
            Self::DeleteDomains => Some(LifecycleOperation::DeleteDomains),
            Self::SyncMappings => Some(LifecycleOperation::SyncMappings),
            Self::RemoveMappings => Some(LifecycleOperation::RemoveMappings),
            Self::Summarize => Some(LifecycleOperation::Summarize),
            Self::Completions { .. } => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "domain-manager",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("domain-manager")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn initialize_logging(debug: bool) {
    // RUST_LOG wins; otherwise --debug selects the verbose diagnostic channel.
    // RUST_LOG_FORMAT=json switches to structured output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if debug { "debug" } else { "info" })
    });

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(debug)
                .with_line_number(debug)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    initialize_logging(cli.debug);

    let Some(operation) = cli.command.operation() else {
        return Ok(());
    };
    debug!(operation = %operation, config = %cli.config.display(), "Logging initialized");

    let descriptor = DeploymentDescriptor::from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let options = DeploymentOptions {
        stage: cli.stage.clone(),
        region: cli.region.clone(),
    };
    let context = DeploymentContext::resolve(&descriptor, &options);
    let mut domains = DomainSet::from_descriptor(&descriptor, &context)
        .context("Invalid customDomain configuration")?;

    let client = GatewayClient::new(&cli.endpoint, cli.token.clone())
        .context("Failed to build the control-plane client")?;
    let services = Services::from_client(Arc::new(client));

    let policy = ThrottlePolicy::default()
        .with_initial_interval(Duration::from_millis(cli.throttle_initial_ms))
        .with_max_attempts(cli.throttle_max_attempts);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            interrupt.cancel();
        }
    });

    info!(
        service = %context.service_name,
        stage = %context.stage,
        region = %context.region,
        endpoint = %cli.endpoint,
        "Deployment context resolved"
    );

    let orchestrator = DomainSetOrchestrator::new(&services, &context)
        .with_throttle_policy(policy)
        .with_cancellation(cancel);
    let report = orchestrator.run(operation, &mut domains).await;

    print!("{report}");

    if let Some(path) = &cli.outputs_file {
        write_json(path, &report.outputs)?;
    }
    if let Some(path) = &cli.report_file {
        write_json(path, &report)?;
    }
    if let Some(path) = &cli.metrics_file {
        let text = metrics::gather_metrics().context("Failed to encode metrics")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
