// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deploy execution limits.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_METRICS_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfigLayer {
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub metrics_timeout_secs: Option<u64>,
}

impl DeployConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.metrics_timeout_secs.is_some() {
			self.metrics_timeout_secs = other.metrics_timeout_secs;
		}
	}

	pub fn finalize(self) -> DeployConfig {
		DeployConfig {
			timeout_secs: self.timeout_secs,
			metrics_timeout_secs: self
				.metrics_timeout_secs
				.unwrap_or(DEFAULT_METRICS_TIMEOUT_SECS),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
	/// Upper bound for one deploy run. `None` lets a run take as long as it
	/// needs.
	pub timeout_secs: Option<u64>,
	pub metrics_timeout_secs: u64,
}

impl DeployConfig {
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_secs.map(Duration::from_secs)
	}

	pub fn metrics_timeout(&self) -> Duration {
		Duration::from_secs(self.metrics_timeout_secs)
	}
}

impl Default for DeployConfig {
	fn default() -> Self {
		DeployConfigLayer::default().finalize()
	}
}
