// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML file, environment and command line.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AgentConfigLayer;
use crate::sections::{
	DeployConfigLayer, GithubConfigLayer, HttpConfigLayer, LogFormat, LoggingConfigLayer,
	PathsConfigLayer,
};

pub const SYSTEM_SETTINGS_FILE: &str = "/etc/dockup/agent.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 80,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AgentConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AgentConfigLayer::default())
	}
}

/// TOML settings file.
///
/// The system file is optional; a file named explicitly on the command line
/// must exist.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_SETTINGS_FILE)
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		if !self.path.exists() && !self.required {
			debug!(path = %self.path.display(), "settings file not found, skipping");
			return Ok(AgentConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading settings file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AgentConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed settings layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `DOCKUP_<FIELD>`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(env_var)
	}
}

/// Flags parsed by the binary, already shaped as a layer.
pub struct CliSource {
	layer: AgentConfigLayer,
}

impl CliSource {
	pub fn new(layer: AgentConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}

/// Non-empty value of an environment variable.
pub fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_num<T: std::str::FromStr>(
	name: &str,
	value: Option<String>,
) -> Result<Option<T>, ConfigError> {
	match value {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid number '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_from_lookup<F>(lookup: F) -> Result<AgentConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let format = match lookup("DOCKUP_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "DOCKUP_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};

	Ok(AgentConfigLayer {
		http: Some(HttpConfigLayer {
			host: lookup("DOCKUP_HOST"),
			port: parse_num("DOCKUP_PORT", lookup("DOCKUP_PORT"))?,
		}),
		paths: Some(PathsConfigLayer {
			registry_file: lookup("DOCKUP_REGISTRY_FILE").map(PathBuf::from),
			github_app_file: lookup("DOCKUP_GITHUB_APP_FILE").map(PathBuf::from),
			metrics_file: lookup("DOCKUP_METRICS_FILE").map(PathBuf::from),
		}),
		logging: Some(LoggingConfigLayer {
			level: lookup("DOCKUP_LOG_LEVEL"),
			format,
		}),
		github: Some(GithubConfigLayer {
			api_base_url: lookup("DOCKUP_GITHUB_API_URL"),
		}),
		deploy: Some(DeployConfigLayer {
			timeout_secs: parse_num(
				"DOCKUP_DEPLOY_TIMEOUT_SECS",
				lookup("DOCKUP_DEPLOY_TIMEOUT_SECS"),
			)?,
			metrics_timeout_secs: parse_num(
				"DOCKUP_METRICS_TIMEOUT_SECS",
				lookup("DOCKUP_METRICS_TIMEOUT_SECS"),
			)?,
		}),
	})
}
