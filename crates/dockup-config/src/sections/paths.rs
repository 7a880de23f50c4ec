// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locations of the reloadable snapshot files.

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_REGISTRY_FILE: &str = "/etc/dockup/registry.json";
pub const DEFAULT_GITHUB_APP_FILE: &str = "/etc/dockup/github-app.json";
pub const DEFAULT_METRICS_FILE: &str = "/etc/dockup/metrics.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub registry_file: Option<PathBuf>,
	#[serde(default)]
	pub github_app_file: Option<PathBuf>,
	#[serde(default)]
	pub metrics_file: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.registry_file.is_some() {
			self.registry_file = other.registry_file;
		}
		if other.github_app_file.is_some() {
			self.github_app_file = other.github_app_file;
		}
		if other.metrics_file.is_some() {
			self.metrics_file = other.metrics_file;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		PathsConfig {
			registry_file: self
				.registry_file
				.unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_FILE)),
			github_app_file: self
				.github_app_file
				.unwrap_or_else(|| PathBuf::from(DEFAULT_GITHUB_APP_FILE)),
			metrics_file: self
				.metrics_file
				.unwrap_or_else(|| PathBuf::from(DEFAULT_METRICS_FILE)),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
	pub registry_file: PathBuf,
	pub github_app_file: PathBuf,
	pub metrics_file: PathBuf,
}

impl Default for PathsConfig {
	fn default() -> Self {
		PathsConfigLayer::default().finalize()
	}
}
