// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading and swapping the reloadable snapshots.

use std::sync::Arc;

use dockup_config::{
	env_var, load_metrics_target, ConfigError, PathsConfig, Registry, VpsIdProbe, METRICS_URL_ENV,
};
use dockup_deploy::{MetricsSink, RegistryStore};
use dockup_github_app::{CredentialBroker, GithubAppCredential};
use serde::Serialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
	pub apps: usize,
	pub github_app_configured: bool,
	pub metrics_enabled: bool,
}

/// Re-reads the registry, GitHub App credential and metrics target files
/// and swaps each into its holder.
pub struct Reloader {
	paths: PathsConfig,
	registry: Arc<RegistryStore>,
	broker: Arc<CredentialBroker>,
	metrics: MetricsSink,
	probe: VpsIdProbe,
	metrics_url_fallback: Option<String>,
}

impl Reloader {
	pub fn new(
		paths: PathsConfig,
		registry: Arc<RegistryStore>,
		broker: Arc<CredentialBroker>,
		metrics: MetricsSink,
	) -> Self {
		Self {
			paths,
			registry,
			broker,
			metrics,
			probe: VpsIdProbe::default(),
			metrics_url_fallback: env_var(METRICS_URL_ENV),
		}
	}

	pub fn with_probe(mut self, probe: VpsIdProbe) -> Self {
		self.probe = probe;
		self
	}

	/// Replace the `DOCKUP_METRICS_URL` value captured at construction.
	pub fn with_metrics_url_fallback(mut self, url: Option<String>) -> Self {
		self.metrics_url_fallback = url;
		self
	}

	/// Reload everything. A registry that fails to load aborts the whole
	/// reload and leaves every snapshot as it was.
	#[instrument(skip(self))]
	pub async fn reload_all(&self) -> Result<ReloadSummary, ConfigError> {
		let registry = Registry::load(&self.paths.registry_file)?;
		let apps = registry.len();
		self.registry.replace(registry).await;

		let credential = GithubAppCredential::load_or_absent(&self.paths.github_app_file);
		self.broker.replace_credential(credential).await;

		let target = match load_metrics_target(
			&self.paths.metrics_file,
			self.metrics_url_fallback.clone(),
			&self.probe,
		)
		.await
		{
			Ok(target) => target,
			Err(e) => {
				warn!(path = %self.paths.metrics_file.display(), error = %e, "ignoring metrics config");
				None
			}
		};
		self.metrics.replace_target(target).await;

		let summary = ReloadSummary {
			apps,
			github_app_configured: self.broker.is_configured().await,
			metrics_enabled: self.metrics.is_enabled().await,
		};
		info!(
			apps = summary.apps,
			github_app = summary.github_app_configured,
			metrics = summary.metrics_enabled,
			"snapshots reloaded"
		);
		Ok(summary)
	}
}
