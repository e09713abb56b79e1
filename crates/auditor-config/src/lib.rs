// auditor-config/src/lib.rs

use std::env;
use std::path::Path;
use thiserror::Error;

mod types;

pub use types::{AuditorConfig, NodeConfig, ScanConfig, StorageConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "AUDITOR_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<AuditorConfig, ConfigError> {
		// Load base configuration from file
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		// Apply environment variable overrides
		self.apply_env_overrides(&mut config)?;

		// Validate configuration
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<AuditorConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;

		// Substitute environment variables
		let substituted_content = self.substitute_env_vars(&content)?;

		// Parse TOML
		let config: AuditorConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut AuditorConfig) -> Result<(), ConfigError> {
		// Apply environment variable overrides for common settings
		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			config.node.rpc_url = rpc_url;
		}

		if let Ok(concurrency) = env::var(format!("{}CONCURRENCY", self.env_prefix)) {
			config.scan.concurrency = concurrency.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid concurrency: {}", e))
			})?;
		}

		if let Ok(end_block) = env::var(format!("{}END_BLOCK", self.env_prefix)) {
			config.scan.end_block = end_block
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid end block: {}", e)))?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &AuditorConfig) -> Result<(), ConfigError> {
		if config.node.rpc_url.is_empty() {
			return Err(ConfigError::ValidationError(
				"node.rpc_url must not be empty".to_string(),
			));
		}

		if config.node.retry_attempts == 0 {
			return Err(ConfigError::ValidationError(
				"node.retry_attempts must be at least 1".to_string(),
			));
		}

		if config.scan.concurrency == 0 {
			return Err(ConfigError::ValidationError(
				"scan.concurrency must be at least 1".to_string(),
			));
		}

		if config.scan.end_block < config.scan.default_start_block {
			return Err(ConfigError::ValidationError(format!(
				"scan.end_block {} precedes scan.default_start_block {}",
				config.scan.end_block, config.scan.default_start_block
			)));
		}

		Ok(())
	}
}
