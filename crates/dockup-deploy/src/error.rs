// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deploy error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
	#[error("App not registered: {0}")]
	UnknownApp(String),

	/// `git config --get remote.origin.url` failed in the checkout.
	#[error("Failed to read remote URL in {path}: {message}")]
	RemoteLookup { path: PathBuf, message: String },

	/// A step exited non-zero. `output` is the transcript up to and including
	/// that step.
	#[error("Step `{step}` failed with exit code {}", format_exit(.exit_code))]
	Pipeline {
		step: String,
		exit_code: Option<i32>,
		output: String,
	},

	#[error("Failed to start {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Deploy timed out after {}", format_timeout(.0))]
	Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, DeployError>;

fn format_exit(code: &Option<i32>) -> String {
	code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

fn format_timeout(limit: &Duration) -> String {
	humantime::format_duration(*limit).to_string()
}

impl DeployError {
	/// Text recorded as `error_message` in failure metrics.
	pub fn report(&self) -> String {
		match self {
			DeployError::Pipeline { output, .. } => output.trim().to_string(),
			other => other.to_string(),
		}
	}
}
