use anyhow::{Context, Result};
use auditor_config::{AuditorConfig, ConfigLoader};
use auditor_core::{BlockVerifier, RangeScheduler, SchedulerConfig};
use auditor_rpc::{RetryPolicy, RpcClient};
use auditor_storage::{FailureLog, ProgressStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "block-auditor")]
#[command(about = "Audits a block range for unretrievable transactions", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "AUDITOR_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Audit the configured block range
	Run,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize tracing
	setup_tracing(&cli.log_level)?;

	// Handle commands
	match cli.command {
		Some(Commands::Run) | None => run_audit(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn run_audit(cli: Cli) -> Result<()> {
	info!("Starting block auditor");
	info!("Loading configuration from: {:?}", cli.config);

	let config = load_config(&cli).await?;

	let progress = ProgressStore::new(&config.storage.progress_path);
	let start_block = match progress
		.read()
		.await
		.context("Failed to read progress marker")?
	{
		Some(marker) => {
			info!("Resuming from progress marker at block {}", marker);
			marker
		}
		None => {
			info!(
				"No progress marker, starting from configured block {}",
				config.scan.default_start_block
			);
			config.scan.default_start_block
		}
	};
	let end_block = config.scan.end_block;

	if start_block > end_block {
		info!(
			"Progress marker {} is already past end block {}, nothing to audit",
			start_block, end_block
		);
		return Ok(());
	}

	let retry = RetryPolicy::new(config.node.retry_attempts, config.node.retry_delay());
	let rpc = RpcClient::new(&config.node.rpc_url, config.node.request_timeout(), retry)
		.context("Failed to build RPC client")?;
	let failure_log = FailureLog::open(&config.storage.failure_log_path)
		.await
		.context("Failed to open failure log")?;

	let verifier = BlockVerifier::new(Arc::new(rpc), Arc::new(failure_log));
	let scheduler = RangeScheduler::new(
		Arc::new(verifier),
		progress,
		SchedulerConfig {
			concurrency: config.scan.concurrency,
		},
	);

	let started = Instant::now();
	let report = scheduler
		.run(start_block, end_block)
		.await
		.context("Audit run failed")?;
	let elapsed = started.elapsed();

	if report.all_retrievable() {
		info!(
			"All transactions successfully retrieved across {} blocks",
			report.blocks_scanned
		);
	} else {
		warn!(
			"Failed to retrieve data for {} transactions ({} blocks unavailable), see {:?}",
			report.failures.len(),
			report.blocks_unavailable,
			config.storage.failure_log_path
		);
	}
	info!(
		"Audit of blocks {}..={} finished in {:.2}s",
		start_block,
		end_block,
		elapsed.as_secs_f64()
	);

	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = load_config(&cli).await?;

	info!("Configuration is valid");
	info!("RPC endpoint: {}", config.node.rpc_url);
	info!(
		"Retry policy: {} attempts, {}s delay, {}s request timeout",
		config.node.retry_attempts,
		config.node.retry_delay_secs,
		config.node.request_timeout_secs
	);
	info!(
		"Scan range: {}..={} with concurrency {}",
		config.scan.default_start_block, config.scan.end_block, config.scan.concurrency
	);
	info!("Progress marker: {:?}", config.storage.progress_path);
	info!("Failure log: {:?}", config.storage.failure_log_path);

	Ok(())
}

async fn load_config(cli: &Cli) -> Result<AuditorConfig> {
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
