//! AccessGate CLI - batch decision runner.
//!
//! Reads a JSON array of access requests, runs each one through the decision
//! pipeline and writes a JSON array of decisions. Logs go to stderr so stdout
//! stays the decision stream.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use accessgate_core::SystemClock;
use accessgate_llm::{ClaudeProvider, LlmIntentExtractor};
use accessgate_runtime::Pipeline;
use accessgate_runtime::config_bridge::to_provider_config;
use accessgate_telemetry::{LogConfig, LogFormat, LogTarget};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

mod batch;

/// Environment variable holding the Anthropic API key.
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// AccessGate - LLM-guarded access request decisions
#[derive(Parser, Debug)]
#[command(name = "accessgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the request batch
    #[arg(short, long)]
    input: PathBuf,

    /// JSON access policy
    #[arg(short, long)]
    policy: PathBuf,

    /// Where to write decisions (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML settings file layered over the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long, env = "ACCESSGATE_LOG", default_value = "info")]
    log_level: String,

    /// Log format: pretty, compact, json or full
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,

    /// Write logs to rolling files in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let config = LogConfig::new(self.log_level.clone()).with_format(self.log_format);
        match &self.log_dir {
            Some(dir) => config
                .with_target(LogTarget::File {
                    directory: dir.clone(),
                    prefix: "accessgate".to_owned(),
                    rotation: accessgate_telemetry::FileRotation::Daily,
                })
                .without_ansi(),
            None => config.with_target(LogTarget::Stderr),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = accessgate_telemetry::setup_logging(&cli.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("accessgate: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let api_key = std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .with_context(|| format!("{API_KEY_VAR} must be set"))?;

    let settings = accessgate_config::load_settings(cli.config.as_deref())
        .context("failed to load settings")?;
    let policy = accessgate_config::load_policy(&cli.policy)
        .with_context(|| format!("failed to load policy {}", cli.policy.display()))?;
    let requests = batch::read_requests(&cli.input).await?;

    let provider = ClaudeProvider::new(to_provider_config(api_key, &settings));
    let extractor = LlmIntentExtractor::new(provider, &policy);
    let pipeline = Pipeline::new(
        &settings,
        policy,
        Arc::new(extractor),
        Arc::new(SystemClock),
    )?;

    info!(
        count = requests.len(),
        input = %cli.input.display(),
        model = %settings.llm.model,
        "starting batch"
    );
    let decisions = pipeline.process_batch(requests).await;

    batch::log_summary(&decisions);
    batch::write_decisions(&decisions, cli.output.as_deref()).await
}
