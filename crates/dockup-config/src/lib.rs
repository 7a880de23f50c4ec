// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the dockup agent.
//!
//! Two kinds of configuration live here:
//! - Agent settings, resolved once at startup from layered sources
//!   (defaults, `/etc/dockup/agent.toml`, `DOCKUP_*` environment, flags)
//! - Reloadable snapshots: the app [`registry`] and the [`metrics`] target,
//!   re-read from JSON files whenever the agent is asked to reload
//!
//! # Usage
//!
//! ```ignore
//! use dockup_config::{load_config, LoadOptions};
//!
//! let config = load_config(LoadOptions::default())?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod metrics;
pub mod registry;
pub mod sections;
pub mod sources;
pub mod vps_id;

pub use error::{ConfigError, Result};
pub use layer::AgentConfigLayer;
pub use metrics::{load_metrics_target, MetricsTarget, METRICS_URL_ENV};
pub use registry::{AppRegistration, Registry, DEFAULT_COMPOSE_FILE};
pub use sections::*;
pub use sources::{env_var, CliSource, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};
pub use vps_id::VpsIdProbe;

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved agent settings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
	pub http: HttpConfig,
	pub paths: PathsConfig,
	pub logging: LoggingConfig,
	pub github: GithubConfig,
	pub deploy: DeployConfig,
}

impl AgentConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Inputs the binary hands to [`load_config`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
	/// Explicit settings file; replaces `/etc/dockup/agent.toml` and must exist.
	pub settings_file: Option<PathBuf>,
	/// Values given as command-line flags.
	pub cli: AgentConfigLayer,
}

/// Load settings from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Command-line flags
/// 2. Environment variables (`DOCKUP_*`)
/// 3. Settings file (`/etc/dockup/agent.toml` or `--settings`)
/// 4. Built-in defaults
pub fn load_config(options: LoadOptions) -> Result<AgentConfig> {
	let toml = match options.settings_file {
		Some(path) => TomlSource::new(path).required(),
		None => TomlSource::system(),
	};

	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(toml),
		Box::new(EnvSource),
		Box::new(CliSource::new(options.cli)),
	])
}

pub fn load_config_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AgentConfig> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AgentConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: AgentConfigLayer) -> Result<AgentConfig> {
	let config = AgentConfig {
		http: layer.http.unwrap_or_default().finalize(),
		paths: layer.paths.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		github: layer.github.unwrap_or_default().finalize()?,
		deploy: layer.deploy.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		registry_file = %config.paths.registry_file.display(),
		github_api = %config.github.api_base_url,
		deploy_timeout_secs = ?config.deploy.timeout_secs,
		"agent configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &AgentConfig) -> Result<()> {
	if config.http.host.trim().is_empty() {
		return Err(ConfigError::Validation("http.host cannot be empty".to_string()));
	}

	if config.http.port == 0 {
		return Err(ConfigError::Validation("http.port cannot be 0".to_string()));
	}

	if config.deploy.timeout_secs == Some(0) {
		return Err(ConfigError::Validation(
			"deploy.timeout_secs must be positive; omit it for no limit".to_string(),
		));
	}

	if config.deploy.metrics_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"deploy.metrics_timeout_secs must be positive".to_string(),
		));
	}

	Ok(())
}
